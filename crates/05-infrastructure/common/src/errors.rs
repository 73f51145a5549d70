//! 错误类型定义

use crate::component::ComponentKind;
use std::time::Duration;
use thiserror::Error;

/// 装箱的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 组件初始化错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitErrorKind {
    /// 工厂分发失败，通常是配置问题
    CreateComponentFailure,
    /// 后端初始化失败或派生配置保存失败
    InitComponentFailure,
    /// 调用方取消
    Cancellation,
}

impl InitErrorKind {
    /// 错误代码
    pub fn code(&self) -> &'static str {
        match self {
            Self::CreateComponentFailure => "CREATE_COMPONENT_FAILURE",
            Self::InitComponentFailure => "INIT_COMPONENT_FAILURE",
            Self::Cancellation => "INIT_CANCELLED",
        }
    }
}

/// 组件初始化错误
///
/// `name` 为组件的日志名称 `<name> (<type>/<version>)`。
#[derive(Error, Debug)]
pub enum ComponentInitError {
    #[error("[CREATE_COMPONENT_FAILURE]: 组件创建失败 {name}: {source}")]
    CreateComponentFailure { name: String, source: BoxError },

    #[error("[INIT_COMPONENT_FAILURE]: 组件初始化失败 {name}: {source}")]
    InitComponentFailure { name: String, source: BoxError },

    #[error("[INIT_CANCELLED]: 组件初始化已取消 {name}")]
    Cancelled { name: String },
}

impl ComponentInitError {
    /// 创建组件创建失败错误
    pub fn creation(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::CreateComponentFailure {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 创建组件初始化失败错误
    pub fn init(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::InitComponentFailure {
            name: name.into(),
            source: source.into(),
        }
    }

    /// 创建取消错误
    pub fn cancelled(name: impl Into<String>) -> Self {
        Self::Cancelled { name: name.into() }
    }

    /// 错误类别
    pub fn kind(&self) -> InitErrorKind {
        match self {
            Self::CreateComponentFailure { .. } => InitErrorKind::CreateComponentFailure,
            Self::InitComponentFailure { .. } => InitErrorKind::InitComponentFailure,
            Self::Cancelled { .. } => InitErrorKind::Cancellation,
        }
    }

    /// 组件日志名称
    pub fn name(&self) -> &str {
        match self {
            Self::CreateComponentFailure { name, .. }
            | Self::InitComponentFailure { name, .. }
            | Self::Cancelled { name } => name,
        }
    }
}

/// 组件注册表错误
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("找不到组件工厂: {kind}.{component_type}/{version}")]
    FactoryNotFound {
        kind: ComponentKind,
        component_type: String,
        version: String,
    },

    #[error("组件工厂重复注册: {kind}.{component_type}/{version}")]
    DuplicateFactory {
        kind: ComponentKind,
        component_type: String,
        version: String,
    },

    #[error("组件工厂创建驱动失败: {kind}.{component_type}, 原因: {source}")]
    FactoryFailed {
        kind: ComponentKind,
        component_type: String,
        source: BoxError,
    },

    #[error("未注册该种类的组件处理器: {kind}")]
    KindNotSupported { kind: ComponentKind },
}

/// 元数据解析错误
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("密钥解析失败: 属性 {property}, 存储 {store}, 密钥 {secret}, 原因: {source}")]
    SecretResolution {
        property: String,
        store: String,
        secret: String,
        source: BoxError,
    },

    #[error("属性 {property} 引用了密钥，但未指定密钥存储")]
    MissingSecretStore { property: String },

    #[error("属性 {property} 引用了密钥，但未配置密钥解析器")]
    SecretResolverUnavailable { property: String },

    #[error("属性 {property} 引用了 {{podName}}，但未设置 pod 名称")]
    MissingPodName { property: String },

    #[error("元数据解析已取消")]
    Cancelled,
}

/// 键前缀配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefixError {
    #[error("键前缀 '{prefix}' 不能包含 '||'")]
    InvalidPrefix { prefix: String },

    #[error("键 '{key}' 不能包含 '||'")]
    InvalidKey { key: String },
}

/// 驱动错误
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("后端不可用: {message}")]
    Unavailable { message: String },

    #[error("驱动元数据无效: {message}")]
    InvalidMetadata { message: String },

    #[error("驱动初始化超时: {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("{0}")]
    Other(BoxError),
}

impl DriverError {
    /// 创建后端不可用错误
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// 创建元数据无效错误
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("组件注册失败: {source}")]
    RegistryError {
        #[from]
        source: RegistryError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InitResult<T> = Result<T, ComponentInitError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
