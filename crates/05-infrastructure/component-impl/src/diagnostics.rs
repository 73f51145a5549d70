//! 诊断接收器实现

use component_abstractions::DiagnosticsSink;
use dashmap::DashMap;
use infrastructure_common::{InitOutcome, InitPhase};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 初始化结果计数器名称
pub const INIT_TOTAL_COUNTER: &str = "component_init_total";

/// 初始化失败计数器名称
pub const INIT_FAILED_COUNTER: &str = "component_init_failed_total";

/// 基于 `metrics` 门面的诊断接收器
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsDiagnostics;

impl MetricsDiagnostics {
    /// 创建新的接收器
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticsSink for MetricsDiagnostics {
    fn component_init_failed(&self, component_type: &str, phase: InitPhase, name: &str) {
        metrics::counter!(
            INIT_TOTAL_COUNTER,
            "type" => component_type.to_string(),
            "outcome" => InitOutcome::from(phase).as_str()
        )
        .increment(1);
        metrics::counter!(
            INIT_FAILED_COUNTER,
            "type" => component_type.to_string(),
            "phase" => phase.as_str(),
            "name" => name.to_string()
        )
        .increment(1);
    }

    fn component_initialized(&self, component_type: &str) {
        metrics::counter!(
            INIT_TOTAL_COUNTER,
            "type" => component_type.to_string(),
            "outcome" => InitOutcome::Initialized.as_str()
        )
        .increment(1);
    }
}

/// 一次失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitFailure {
    /// 组件类型
    pub component_type: String,
    /// 失败阶段
    pub phase: InitPhase,
    /// 组件名称
    pub name: String,
}

/// 内存诊断接收器
#[derive(Debug, Default)]
pub struct InMemoryDiagnostics {
    counters: DashMap<(String, InitOutcome), u64>,
    failures: Mutex<Vec<InitFailure>>,
}

impl InMemoryDiagnostics {
    /// 创建新的接收器
    pub fn new() -> Self {
        Self::default()
    }

    fn increment(&self, component_type: &str, outcome: InitOutcome) {
        *self
            .counters
            .entry((component_type.to_string(), outcome))
            .or_insert(0) += 1;
    }

    /// 指定类型与结果的计数
    pub fn count(&self, component_type: &str, outcome: InitOutcome) -> u64 {
        self.counters
            .get(&(component_type.to_string(), outcome))
            .map_or(0, |count| *count)
    }

    /// 全部计数之和
    pub fn total(&self) -> u64 {
        self.counters.iter().map(|entry| *entry.value()).sum()
    }

    /// 按 (类型, 结果) 排序的计数快照
    pub fn snapshot(&self) -> BTreeMap<(String, InitOutcome), u64> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// 失败记录
    pub fn failures(&self) -> Vec<InitFailure> {
        self.failures.lock().clone()
    }
}

impl DiagnosticsSink for InMemoryDiagnostics {
    fn component_init_failed(&self, component_type: &str, phase: InitPhase, name: &str) {
        self.increment(component_type, phase.into());
        self.failures.lock().push(InitFailure {
            component_type: component_type.to_string(),
            phase,
            name: name.to_string(),
        });
    }

    fn component_initialized(&self, component_type: &str) {
        self.increment(component_type, InitOutcome::Initialized);
    }
}

/// 扇出到多个接收器
#[derive(Default, Clone)]
pub struct CompositeDiagnostics {
    sinks: Vec<Arc<dyn DiagnosticsSink>>,
}

impl CompositeDiagnostics {
    /// 创建空的组合接收器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加接收器
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl DiagnosticsSink for CompositeDiagnostics {
    fn component_init_failed(&self, component_type: &str, phase: InitPhase, name: &str) {
        for sink in &self.sinks {
            sink.component_init_failed(component_type, phase, name);
        }
    }

    fn component_initialized(&self, component_type: &str) {
        for sink in &self.sinks {
            sink.component_initialized(component_type);
        }
    }
}
