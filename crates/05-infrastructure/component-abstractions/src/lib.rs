//! # Component Abstractions
//!
//! 组件运行时抽象层，定义驱动、工厂、注册表以及外部协作者的核心接口。
//!
//! ## 核心接口
//!
//! - [`Driver`] - 后端驱动基础 trait，各种类能力 trait 均扩展自它
//! - [`Kind`] - 组件种类的类型级标记
//! - [`ComponentFactory`] - 创建未初始化驱动的工厂
//! - [`ComponentRegistry`] - 按 (类型, 版本) 分发的工厂注册表
//! - [`MetadataResolver`] / [`SecretResolver`] - 元数据与密钥解析
//! - [`ComponentLookup`] - 组件存储的只读访问接口
//! - [`DiagnosticsSink`] - 初始化结果诊断
//! - [`ComponentEventSource`] - 控制面事件源
//! - [`ComponentManager`] - 单一种类的组件处理器

pub mod container;
pub mod diagnostics;
pub mod discovery;
pub mod driver;
pub mod factory;
pub mod kinds;
pub mod processor;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use diagnostics::*;
pub use discovery::*;
pub use driver::*;
pub use factory::*;
pub use kinds::*;
pub use processor::*;
pub use registry::*;
pub use resolver::*;

pub use tokio_util::sync::CancellationToken;
