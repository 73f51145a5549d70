//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Runtime 组件运行时的公共类型。
//!
//! ## 核心类型
//!
//! - [`ComponentSpec`] - 控制面下发的组件声明
//! - [`BaseMetadata`] - 交给驱动初始化器的解析后元数据
//! - [`KeyPrefix`] - 锁与状态存储的派生配置
//! - [`ComponentInitError`] - 组件初始化错误
//! - [`ComponentEvent`] - 组件生命周期事件

pub mod component;
pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
