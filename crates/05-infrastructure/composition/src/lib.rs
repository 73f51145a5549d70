//! # 基础设施组合层
//!
//! 负责把注册表、元数据解析器、组件存储与处理器组装成可运行的组件运行时。
//!
//! ## 主要功能
//!
//! - **运行时构建器**: 使用构建者模式注册组件工厂并组装运行时
//! - **组件协调器**: 消费控制面事件，按组件名称有序应用
//! - **日志初始化**: 按配置安装 `tracing-subscriber`
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ComponentRuntime;
//! use infrastructure_common::{ComponentEvent, ComponentKind, ComponentSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = ComponentRuntime::builder().with_logging(true).build()?;
//!
//!     let spec = ComponentSpec::new("mylock", ComponentKind::Lock, "redis", "v1");
//!     if let Err(e) = runtime.apply(&ComponentEvent::created(spec)).await {
//!         eprintln!("{e}");
//!     }
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod infrastructure;
pub mod logging;
pub mod reconciler;

// 重新导出主要类型
pub use builder::RuntimeBuilder;
pub use infrastructure::{ComponentRuntime, RuntimeMetrics, RuntimeStatus};
pub use logging::init_logging;
pub use reconciler::{ReconcileStats, Reconciler};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
