//! 组件生命周期事件与结果

use crate::component::{ComponentKind, ComponentSpec};
use crate::errors::{ComponentInitError, InitErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 组件事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentEventType {
    /// 组件创建
    Created,
    /// 组件更新
    Updated,
    /// 组件删除
    Deleted,
}

/// 控制面下发的组件事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEvent {
    /// 事件ID
    pub id: uuid::Uuid,
    /// 事件类型
    pub event_type: ComponentEventType,
    /// 组件声明
    pub spec: ComponentSpec,
    /// 接收时间
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl ComponentEvent {
    fn new(event_type: ComponentEventType, spec: ComponentSpec) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_type,
            spec,
            received_at: chrono::Utc::now(),
        }
    }

    /// 创建组件创建事件
    pub fn created(spec: ComponentSpec) -> Self {
        Self::new(ComponentEventType::Created, spec)
    }

    /// 创建组件更新事件
    pub fn updated(spec: ComponentSpec) -> Self {
        Self::new(ComponentEventType::Updated, spec)
    }

    /// 创建组件删除事件
    pub fn deleted(spec: ComponentSpec) -> Self {
        Self::new(ComponentEventType::Deleted, spec)
    }

    /// 事件对应的组件键（种类 + 名称）
    pub fn component_key(&self) -> ComponentKey {
        ComponentKey::new(self.spec.kind, self.spec.name.clone())
    }
}

/// 组件键，同一种类内名称唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    /// 组件种类
    pub kind: ComponentKind,
    /// 组件名称
    pub name: String,
}

impl ComponentKey {
    /// 创建新的组件键
    pub fn new(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// 初始化失败阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitPhase {
    /// 工厂创建阶段
    Creation,
    /// 初始化阶段
    Init,
}

impl InitPhase {
    /// 诊断标签值
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Init => "init",
        }
    }
}

/// 一次初始化尝试的结果标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InitOutcome {
    /// 初始化成功
    Initialized,
    /// 创建失败
    CreationFailed,
    /// 初始化失败
    InitFailed,
}

impl InitOutcome {
    /// 诊断标签值
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::CreationFailed => "creation-failed",
            Self::InitFailed => "init-failed",
        }
    }
}

impl From<InitPhase> for InitOutcome {
    fn from(phase: InitPhase) -> Self {
        match phase {
            InitPhase::Creation => Self::CreationFailed,
            InitPhase::Init => Self::InitFailed,
        }
    }
}

/// 组件失败记录
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    /// 组件键
    pub key: ComponentKey,
    /// 组件类型
    pub component_type: String,
    /// 错误代码
    pub code: &'static str,
    /// 错误信息
    pub message: String,
    /// 是否按声明忽略
    pub ignored: bool,
    /// 记录时间
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl FailureRecord {
    /// 从初始化错误创建失败记录
    pub fn from_error(spec: &ComponentSpec, error: &ComponentInitError) -> Self {
        Self {
            key: ComponentKey::new(spec.kind, spec.name.clone()),
            component_type: spec.component_type.clone(),
            code: error.kind().code(),
            message: error.to_string(),
            ignored: spec.ignore_errors,
            recorded_at: chrono::Utc::now(),
        }
    }

    /// 是否为取消导致
    pub fn is_cancellation(&self) -> bool {
        self.code == InitErrorKind::Cancellation.code()
    }
}
