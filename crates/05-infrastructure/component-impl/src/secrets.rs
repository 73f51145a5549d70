//! 密钥解析器实现

use crate::store::KindStore;
use async_trait::async_trait;
use component_abstractions::{ComponentLookup, SecretResolver, SecretStore, SecretStoreKind};
use dashmap::DashMap;
use infrastructure_common::{BoxError, SecretKeyRef};
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 通过已注册的密钥存储组件解析密钥
///
/// 组件的 `authSecretStore` 指向同一运行时中的 `secretstores` 组件。
#[derive(Debug, Clone)]
pub struct StoreSecretResolver {
    stores: Arc<KindStore<SecretStoreKind>>,
}

impl StoreSecretResolver {
    /// 创建新的解析器
    pub fn new(stores: Arc<KindStore<SecretStoreKind>>) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl SecretResolver for StoreSecretResolver {
    async fn resolve(
        &self,
        store: &str,
        reference: &SecretKeyRef,
    ) -> Result<SecretString, BoxError> {
        let driver = self
            .stores
            .get(store)
            .ok_or_else(|| format!("密钥存储未就绪: {store}"))?;

        debug!("从密钥存储 {} 读取密钥 {}", store, reference.name);
        driver
            .get_secret(reference)
            .await?
            .ok_or_else(|| {
                format!(
                    "密钥不存在: {}/{}#{}",
                    store,
                    reference.name,
                    reference.effective_key()
                )
                .into()
            })
    }
}

/// 内存中的静态密钥表
#[derive(Debug, Default)]
pub struct StaticSecretResolver {
    secrets: DashMap<String, SecretString>,
}

impl StaticSecretResolver {
    /// 创建空密钥表
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加密钥
    pub fn with_secret(
        self,
        store: &str,
        name: &str,
        key: &str,
        value: impl Into<String>,
    ) -> Self {
        self.insert(store, name, key, value);
        self
    }

    /// 插入或替换密钥
    pub fn insert(&self, store: &str, name: &str, key: &str, value: impl Into<String>) {
        self.secrets
            .insert(Self::key(store, name, key), SecretString::new(value.into()));
    }

    fn key(store: &str, name: &str, key: &str) -> String {
        format!("{store}/{name}#{key}")
    }
}

#[async_trait]
impl SecretResolver for StaticSecretResolver {
    async fn resolve(
        &self,
        store: &str,
        reference: &SecretKeyRef,
    ) -> Result<SecretString, BoxError> {
        let key = Self::key(store, &reference.name, reference.effective_key());
        self.secrets
            .get(&key)
            .map(|secret| secret.value().clone())
            .ok_or_else(|| format!("密钥不存在: {key}").into())
    }
}

/// 从环境变量解析密钥，忽略存储名称
///
/// 变量名为前缀加引用的有效键，转为大写，`-` 与 `.` 替换为 `_`；
/// 如 `redis-password` 在前缀 `LORN_SECRET_` 下读取 `LORN_SECRET_REDIS_PASSWORD`。
#[derive(Debug, Clone, Default)]
pub struct EnvSecretResolver {
    prefix: String,
    overrides: Option<HashMap<String, String>>,
}

impl EnvSecretResolver {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置变量名前缀
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// 用给定映射代替进程环境变量
    pub fn with_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.overrides = Some(vars);
        self
    }

    /// 引用对应的变量名
    pub fn variable(&self, reference: &SecretKeyRef) -> String {
        format!("{}{}", self.prefix, reference.effective_key())
            .to_ascii_uppercase()
            .replace(['-', '.'], "_")
    }
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(
        &self,
        _store: &str,
        reference: &SecretKeyRef,
    ) -> Result<SecretString, BoxError> {
        let variable = self.variable(reference);
        let value = match &self.overrides {
            Some(vars) => vars
                .get(&variable)
                .cloned()
                .ok_or_else(|| format!("环境变量不存在: {variable}"))?,
            None => std::env::var(&variable)
                .map_err(|e| format!("读取环境变量 {variable} 失败: {e}"))?,
        };
        Ok(SecretString::new(value))
    }
}
