//! 组件运行时主入口

use crate::builder::RuntimeBuilder;
use crate::reconciler::{ReconcileStats, Reconciler};
use component_abstractions::{
    BindingKind, ComponentEventSource, ConfigurationKind, LockKind, PubSubKind, SecretStoreKind,
    StateKind,
};
use component_impl::{ComponentStore, InMemoryDiagnostics, KindStore, Processor};
use config_impl::RuntimeSettings;
use infrastructure_common::{ComponentEvent, FailureRecord, InitOutcome, InitResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 组件运行时
///
/// 持有组件存储、处理器与协调器，请求路由通过各种类的存储读取就绪组件。
pub struct ComponentRuntime {
    /// 运行时配置
    settings: RuntimeSettings,
    /// 组件存储
    store: Arc<ComponentStore>,
    /// 组件处理器
    processor: Arc<Processor>,
    /// 内存诊断
    diagnostics: Arc<InMemoryDiagnostics>,
    /// 协调器
    reconciler: Reconciler,
    /// 关闭信号
    shutdown: CancellationToken,
    /// 运行状态
    status: RwLock<RuntimeStatus>,
    /// 启动时间
    started_at: chrono::DateTime<chrono::Utc>,
}

impl ComponentRuntime {
    /// 创建运行时构建器
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// 内部构造函数
    pub(crate) fn new(
        settings: RuntimeSettings,
        store: Arc<ComponentStore>,
        processor: Arc<Processor>,
        diagnostics: Arc<InMemoryDiagnostics>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            settings,
            store,
            processor,
            diagnostics,
            reconciler,
            shutdown: CancellationToken::new(),
            status: RwLock::new(RuntimeStatus::Running),
            started_at: chrono::Utc::now(),
        }
    }

    /// 应用单个组件事件
    pub async fn apply(&self, event: &ComponentEvent) -> InitResult<()> {
        let cancel = self.shutdown.child_token();
        self.reconciler.apply(event, &cancel).await
    }

    /// 消费事件源直到耗尽或运行时关闭
    pub async fn run<S: ComponentEventSource>(&self, source: S) -> ReconcileStats {
        self.reconciler
            .run(source, self.shutdown.child_token())
            .await
    }

    /// 关闭运行时：取消进行中的初始化并关闭全部组件
    pub async fn shutdown(&self) {
        info!("停止组件运行时");
        *self.status.write() = RuntimeStatus::Stopping;
        self.shutdown.cancel();
        self.processor.shutdown().await;
        *self.status.write() = RuntimeStatus::Stopped;
        info!("组件运行时已停止");
    }

    /// 关闭信号，可用于派生调用方自己的取消令牌
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// 运行状态
    pub fn status(&self) -> RuntimeStatus {
        *self.status.read()
    }

    /// 运行时配置
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// 组件存储
    pub fn store(&self) -> &Arc<ComponentStore> {
        &self.store
    }

    /// 分布式锁
    pub fn locks(&self) -> &Arc<KindStore<LockKind>> {
        self.store.locks()
    }

    /// 状态存储
    pub fn state_stores(&self) -> &Arc<KindStore<StateKind>> {
        self.store.state_stores()
    }

    /// 发布订阅
    pub fn pubsubs(&self) -> &Arc<KindStore<PubSubKind>> {
        self.store.pubsubs()
    }

    /// 密钥存储
    pub fn secret_stores(&self) -> &Arc<KindStore<SecretStoreKind>> {
        self.store.secret_stores()
    }

    /// 输入输出绑定
    pub fn bindings(&self) -> &Arc<KindStore<BindingKind>> {
        self.store.bindings()
    }

    /// 配置存储
    pub fn configuration_stores(&self) -> &Arc<KindStore<ConfigurationKind>> {
        self.store.configuration_stores()
    }

    /// 组件处理器
    pub fn processor(&self) -> &Arc<Processor> {
        &self.processor
    }

    /// 协调器
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// 内存诊断
    pub fn diagnostics(&self) -> &Arc<InMemoryDiagnostics> {
        &self.diagnostics
    }

    /// 组件失败记录
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.reconciler.failures()
    }

    /// 运行时统计
    pub fn metrics(&self) -> RuntimeMetrics {
        let snapshot = self.diagnostics.snapshot();
        let count = |outcome: InitOutcome| -> u64 {
            snapshot
                .iter()
                .filter(|((_, o), _)| *o == outcome)
                .map(|(_, n)| *n)
                .sum()
        };

        RuntimeMetrics {
            started_at: self.started_at,
            ready_components: self.store.len(),
            failed_components: self.reconciler.failures().len(),
            initialized: count(InitOutcome::Initialized),
            creation_failed: count(InitOutcome::CreationFailed),
            init_failed: count(InitOutcome::InitFailed),
            reconcile: self.reconciler.stats(),
        }
    }
}

/// 运行时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeStatus {
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
}

/// 运行时统计信息
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeMetrics {
    /// 启动时间
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// 就绪组件数量
    pub ready_components: usize,
    /// 处于失败状态的组件数量
    pub failed_components: usize,
    /// 初始化成功次数
    pub initialized: u64,
    /// 创建失败次数
    pub creation_failed: u64,
    /// 初始化失败次数
    pub init_failed: u64,
    /// 协调统计
    pub reconcile: ReconcileStats,
}

impl RuntimeMetrics {
    /// 计算运行时间
    pub fn uptime(&self) -> chrono::Duration {
        chrono::Utc::now() - self.started_at
    }
}
