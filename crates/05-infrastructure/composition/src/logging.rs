//! 日志初始化

use config_impl::LoggingSettings;
use infrastructure_common::InfrastructureError;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 按配置初始化全局日志
///
/// 重复初始化返回错误，不会覆盖已安装的订阅者。
pub fn init_logging(settings: &LoggingSettings) -> Result<(), InfrastructureError> {
    let filter = EnvFilter::try_new(&settings.level).map_err(|e| {
        InfrastructureError::BootstrapFailed {
            message: format!("日志级别无效 '{}': {}", settings.level, e),
        }
    })?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(settings.show_target);

    let installed = if settings.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| InfrastructureError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    info!("日志系统初始化完成");
    Ok(())
}
