//! 元数据定义
//!
//! 提供交给驱动初始化器的基础元数据，以及元数据解析所需的运行时选项

use std::collections::HashMap;

/// 基础元数据
///
/// 每次初始化尝试重新计算，不做持久化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseMetadata {
    /// 组件名称
    pub name: String,
    /// 合并后的属性
    pub properties: HashMap<String, String>,
}

impl BaseMetadata {
    /// 创建新的基础元数据
    pub fn new(name: impl Into<String>, properties: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// 获取属性值
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// 忽略大小写获取属性值
    pub fn property_ignore_case(&self, key: &str) -> Option<&str> {
        find_ignore_case(&self.properties, key)
    }

    /// 获取属性值，不存在时返回默认值
    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.property(key).unwrap_or(default)
    }
}

/// 忽略大小写查找属性
///
/// 精确匹配优先；否则在大小写不同的多个候选中取字典序最小的键，
/// 结果不受哈希表迭代顺序影响。
pub(crate) fn find_ignore_case<'a>(
    properties: &'a HashMap<String, String>,
    key: &str,
) -> Option<&'a str> {
    if let Some(value) = properties.get(key) {
        return Some(value.as_str());
    }
    properties
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(key))
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, v)| v.as_str())
}

/// 元数据解析选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOptions {
    /// 应用ID
    pub app_id: String,
    /// 命名空间
    pub namespace: String,
    /// Pod 名称
    pub pod_name: Option<String>,
    /// 组件未声明密钥存储时使用的默认存储
    pub default_secret_store: Option<String>,
}

impl MetadataOptions {
    /// 创建新的元数据解析选项
    pub fn new(app_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            namespace: namespace.into(),
            pod_name: None,
            default_secret_store: None,
        }
    }

    /// 设置 Pod 名称
    pub fn with_pod_name(mut self, pod_name: impl Into<String>) -> Self {
        self.pod_name = Some(pod_name.into());
        self
    }

    /// 设置默认密钥存储
    pub fn with_default_secret_store(mut self, store: impl Into<String>) -> Self {
        self.default_secret_store = Some(store.into());
        self
    }

    /// `{namespace}` 占位符的展开值：`<namespace>-<appID>`
    pub fn namespace_scope(&self) -> String {
        format!("{}-{}", self.namespace, self.app_id)
    }
}
