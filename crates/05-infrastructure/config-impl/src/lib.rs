//! # Configuration Implementation
//!
//! 运行时配置的加载与校验。
//!
//! ## 主要组件
//!
//! - [`RuntimeSettings`] - 运行时配置
//! - [`SettingsLoader`] - 基于 `config` crate 的配置加载器，文件在前、环境变量在后

pub mod loader;
pub mod settings;

pub use loader::*;
pub use settings::*;
