//! # 组件运行时具体实现
//!
//! 提供注册表、元数据解析器、组件存储、诊断接收器与按种类的组件处理器实现

pub mod diagnostics;
pub mod events;
pub mod locks;
pub mod metadata;
pub mod processor;
pub mod registry;
pub mod secrets;
pub mod store;

pub use diagnostics::*;
pub use events::*;
pub use locks::*;
pub use metadata::*;
pub use processor::*;
pub use registry::*;
pub use secrets::*;
pub use store::*;
