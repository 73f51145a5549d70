//! 诊断接口

use infrastructure_common::InitPhase;

/// 诊断接收器
///
/// 调用方不关心结果，实现不得阻塞。
pub trait DiagnosticsSink: Send + Sync {
    /// 记录一次初始化失败
    fn component_init_failed(&self, component_type: &str, phase: InitPhase, name: &str);

    /// 记录一次初始化成功
    fn component_initialized(&self, component_type: &str);
}
