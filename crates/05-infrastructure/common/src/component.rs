//! 组件声明定义
//!
//! 描述由控制面下发的组件声明（[`ComponentSpec`]）。声明在收到后不可变，
//! 同名组件的后续更新事件会整体替换旧声明。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 组件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// 分布式锁
    #[serde(rename = "lock")]
    Lock,
    /// 状态存储
    #[serde(rename = "state")]
    State,
    /// 发布订阅
    #[serde(rename = "pubsub")]
    PubSub,
    /// 密钥存储
    #[serde(rename = "secretstores")]
    SecretStore,
    /// 输入输出绑定
    #[serde(rename = "bindings")]
    Binding,
    /// 配置存储
    #[serde(rename = "configuration")]
    Configuration,
}

impl ComponentKind {
    /// 全部组件种类
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Lock,
        ComponentKind::State,
        ComponentKind::PubSub,
        ComponentKind::SecretStore,
        ComponentKind::Binding,
        ComponentKind::Configuration,
    ];

    /// 类型字符串中使用的种类前缀，如 `lock.redis` 中的 `lock`
    pub fn type_prefix(&self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::State => "state",
            Self::PubSub => "pubsub",
            Self::SecretStore => "secretstores",
            Self::Binding => "bindings",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_prefix())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(Self::Lock),
            "state" => Ok(Self::State),
            "pubsub" => Ok(Self::PubSub),
            "secretstores" | "secretstore" => Ok(Self::SecretStore),
            "bindings" | "binding" => Ok(Self::Binding),
            "configuration" => Ok(Self::Configuration),
            other => Err(format!("未知的组件种类: {other}")),
        }
    }
}

/// 密钥引用
///
/// `name` 为密钥名称，`key` 为密钥内的键；未指定 `key` 时使用 `name`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKeyRef {
    /// 密钥名称
    pub name: String,
    /// 密钥内的键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl SecretKeyRef {
    /// 创建新的密钥引用
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }

    /// 实际查询的键
    pub fn effective_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// 组件属性值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataValue {
    /// 字面值
    Value(String),
    /// 通过密钥存储解析的值
    SecretKeyRef(SecretKeyRef),
}

/// 组件属性项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    /// 属性名
    pub name: String,
    /// 属性值
    #[serde(flatten)]
    pub value: MetadataValue,
}

/// 组件声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// 组件名称，在同一种类内唯一
    pub name: String,
    /// 组件种类
    pub kind: ComponentKind,
    /// 组件类型，如 `redis` 或 `lock.redis`
    #[serde(rename = "type")]
    pub component_type: String,
    /// 组件版本，如 `v1`；为空表示默认版本
    #[serde(default)]
    pub version: String,
    /// 属性列表，按声明顺序合并
    #[serde(default)]
    pub metadata: Vec<MetadataItem>,
    /// 解析密钥引用时使用的密钥存储
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_secret_store: Option<String>,
    /// 初始化超时（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_timeout_ms: Option<u64>,
    /// 初始化失败时是否仅告警
    #[serde(default)]
    pub ignore_errors: bool,
}

impl ComponentSpec {
    /// 创建新的组件声明
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        component_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            component_type: component_type.into(),
            version: version.into(),
            metadata: Vec::new(),
            auth_secret_store: None,
            init_timeout_ms: None,
            ignore_errors: false,
        }
    }

    /// 添加字面属性
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(MetadataItem {
            name: name.into(),
            value: MetadataValue::Value(value.into()),
        });
        self
    }

    /// 添加密钥引用属性
    pub fn with_secret_ref(mut self, name: impl Into<String>, secret: SecretKeyRef) -> Self {
        self.metadata.push(MetadataItem {
            name: name.into(),
            value: MetadataValue::SecretKeyRef(secret),
        });
        self
    }

    /// 设置密钥存储
    pub fn with_auth_secret_store(mut self, store: impl Into<String>) -> Self {
        self.auth_secret_store = Some(store.into());
        self
    }

    /// 设置初始化超时
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// 设置是否忽略初始化错误
    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// 初始化超时
    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// 日志名称：`<name> (<type>/<version>)`
    pub fn log_name(&self) -> String {
        format!("{} ({}/{})", self.name, self.component_type, self.version)
    }

    /// 是否包含密钥引用
    pub fn has_secret_refs(&self) -> bool {
        self.metadata
            .iter()
            .any(|item| matches!(item.value, MetadataValue::SecretKeyRef(_)))
    }
}
