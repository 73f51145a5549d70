//! 种类派生配置
//!
//! 锁与状态存储从属性 `keyPrefix` 派生键前缀策略，并随驱动一起保存。

use crate::errors::KeyPrefixError;
use crate::metadata::find_ignore_case;
use std::collections::HashMap;

/// 键前缀属性名（匹配时忽略大小写）
pub const KEY_PREFIX_PROPERTY: &str = "keyPrefix";

/// 前缀与原始键之间的分隔符
pub const KEY_SEPARATOR: &str = "||";

/// 键前缀策略
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyPrefix {
    /// 使用应用ID作为前缀
    #[default]
    AppId,
    /// 使用组件名称作为前缀
    Name,
    /// 不加前缀
    None,
    /// 自定义前缀
    Custom(String),
}

impl KeyPrefix {
    /// 从解析后的属性派生键前缀策略
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, KeyPrefixError> {
        let raw = find_ignore_case(properties, KEY_PREFIX_PROPERTY)
            .map(str::trim)
            .unwrap_or_default();

        match raw.to_ascii_lowercase().as_str() {
            "" | "appid" => Ok(Self::AppId),
            "name" => Ok(Self::Name),
            "none" => Ok(Self::None),
            _ if raw.contains(KEY_SEPARATOR) => Err(KeyPrefixError::InvalidPrefix {
                prefix: raw.to_string(),
            }),
            _ => Ok(Self::Custom(raw.to_string())),
        }
    }

    /// 计算实际写入后端的键
    pub fn modify_key(
        &self,
        key: &str,
        store_name: &str,
        app_id: &str,
    ) -> Result<String, KeyPrefixError> {
        if key.contains(KEY_SEPARATOR) {
            return Err(KeyPrefixError::InvalidKey {
                key: key.to_string(),
            });
        }

        let modified = match self {
            Self::AppId if app_id.is_empty() => key.to_string(),
            Self::AppId => format!("{app_id}{KEY_SEPARATOR}{key}"),
            Self::Name => format!("{store_name}{KEY_SEPARATOR}{key}"),
            Self::None => key.to_string(),
            Self::Custom(prefix) => format!("{prefix}{KEY_SEPARATOR}{key}"),
        };
        Ok(modified)
    }

    /// 从后端键还原原始键
    pub fn original_key(modified: &str) -> &str {
        modified
            .rsplit_once(KEY_SEPARATOR)
            .map_or(modified, |(_, key)| key)
    }
}
