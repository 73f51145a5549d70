//! 示例内存驱动

use async_trait::async_trait;
use component_abstractions::{
    CancellationToken, Driver, LockKind, LockStore, SecretStore, SecretStoreKind, StateKind,
    StateStore,
};
use infrastructure_common::{BaseMetadata, DriverError, InfrastructureError, SecretKeyRef};
use infrastructure_composition::RuntimeBuilder;
use secrecy::SecretString;
use std::any::Any;
use std::collections::HashMap;
use tracing::info;

/// 内存锁
#[derive(Debug, Default)]
pub struct MemoryLock {
    name: String,
}

#[async_trait]
impl Driver for MemoryLock {
    async fn init(
        &mut self,
        _cancel: &CancellationToken,
        metadata: BaseMetadata,
    ) -> Result<(), DriverError> {
        info!(
            "内存锁初始化: {}, 属性 {:?}",
            metadata.name,
            metadata.properties.keys().collect::<Vec<_>>()
        );
        self.name = metadata.name;
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        info!("内存锁关闭: {}", self.name);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl LockStore for MemoryLock {}

/// 内存状态存储，属性 `failOnInit=true` 时模拟后端不可用
#[derive(Debug, Default)]
pub struct MemoryState {
    table_prefix: String,
}

#[async_trait]
impl Driver for MemoryState {
    async fn init(
        &mut self,
        _cancel: &CancellationToken,
        metadata: BaseMetadata,
    ) -> Result<(), DriverError> {
        if metadata
            .property_ignore_case("failOnInit")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Err(DriverError::unavailable(format!("{} 后端未启动", metadata.name)));
        }
        self.table_prefix = metadata.property_or("tablePrefix", "").to_string();
        info!("内存状态存储初始化: {}, 表前缀 '{}'", metadata.name, self.table_prefix);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl StateStore for MemoryState {}

/// 本地密钥存储，初始化时把属性作为密钥
#[derive(Debug, Default)]
pub struct LocalSecretStore {
    secrets: HashMap<String, String>,
}

#[async_trait]
impl Driver for LocalSecretStore {
    async fn init(
        &mut self,
        _cancel: &CancellationToken,
        metadata: BaseMetadata,
    ) -> Result<(), DriverError> {
        self.secrets = metadata.properties;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl SecretStore for LocalSecretStore {
    async fn get_secret(
        &self,
        reference: &SecretKeyRef,
    ) -> Result<Option<SecretString>, DriverError> {
        Ok(self
            .secrets
            .get(reference.effective_key())
            .cloned()
            .map(SecretString::new))
    }
}

/// 注册示例驱动工厂
pub fn register(builder: RuntimeBuilder) -> Result<RuntimeBuilder, InfrastructureError> {
    builder
        .register_fn::<LockKind, _>("memory", "", |_| {
            Ok(Some(Box::new(MemoryLock::default()) as Box<dyn LockStore>))
        })?
        .register_fn::<StateKind, _>("memory", "", |_| {
            Ok(Some(Box::new(MemoryState::default()) as Box<dyn StateStore>))
        })?
        .register_fn::<SecretStoreKind, _>("local", "", |_| {
            Ok(Some(Box::new(LocalSecretStore::default()) as Box<dyn SecretStore>))
        })
}
