//! 运行时配置定义

use infrastructure_common::{ConfigError, ConfigResult, MetadataOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// 应用ID
    pub app_id: String,
    /// 命名空间
    pub namespace: String,
    /// Pod 名称，`{podName}` 占位符需要
    pub pod_name: Option<String>,
    /// 组件未声明 `authSecretStore` 时使用的密钥存储
    pub default_secret_store: Option<String>,
    /// 驱动初始化默认超时（毫秒）
    pub default_init_timeout_ms: u64,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 协调器配置
    pub reconciler: ReconcilerSettings,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            app_id: "lorn-app".to_string(),
            namespace: "default".to_string(),
            pod_name: None,
            default_secret_store: None,
            default_init_timeout_ms: 5000,
            logging: LoggingSettings::default(),
            reconciler: ReconcilerSettings::default(),
        }
    }
}

impl RuntimeSettings {
    /// 驱动初始化默认超时
    pub fn default_init_timeout(&self) -> Duration {
        Duration::from_millis(self.default_init_timeout_ms)
    }

    /// 元数据解析选项
    pub fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            app_id: self.app_id.clone(),
            namespace: self.namespace.clone(),
            pod_name: self.pod_name.clone(),
            default_secret_store: self.default_secret_store.clone(),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "app_id 不能为空".to_string(),
            });
        }
        if self.default_init_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "default_init_timeout_ms 必须大于 0".to_string(),
            });
        }
        if self.reconciler.backlog_warning == 0 {
            return Err(ConfigError::ValidationError {
                message: "reconciler.backlog_warning 必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 序列化为 TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别或 env-filter 表达式
    pub level: String,
    /// 是否输出 JSON
    pub json: bool,
    /// 是否输出 target
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            show_target: true,
        }
    }
}

/// 协调器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerSettings {
    /// 单个组件积压事件数达到该值时告警
    pub backlog_warning: usize,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self { backlog_warning: 64 }
    }
}
