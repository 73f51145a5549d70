//! 集成测试共用的内存驱动

#![allow(dead_code)]

use async_trait::async_trait;
use component_abstractions::{Driver, LockStore, SecretStore, StateStore};
use config_impl::RuntimeSettings;
use infrastructure_common::{BaseMetadata, DriverError, SecretKeyRef};
use infrastructure_composition::RuntimeBuilder;
use parking_lot::Mutex;
use secrecy::SecretString;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 驱动行为记录
#[derive(Debug, Default)]
pub struct DriverLog {
    next_instance: AtomicU64,
    created: Mutex<Vec<u64>>,
    closed: Mutex<Vec<u64>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl DriverLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next(&self) -> u64 {
        let instance = self.next_instance.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().push(instance);
        instance
    }

    pub fn created(&self) -> Vec<u64> {
        self.created.lock().clone()
    }

    pub fn closed(&self) -> Vec<u64> {
        self.closed.lock().clone()
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

/// 驱动初始化行为
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    /// 立即成功
    #[default]
    Succeed,
    /// 返回后端不可用
    Fail(String),
    /// 延迟后成功
    Delay(Duration),
}

/// 内存锁驱动
#[derive(Debug)]
pub struct MemoryLock {
    pub instance: u64,
    behavior: Behavior,
    log: Arc<DriverLog>,
    metadata: Option<BaseMetadata>,
}

impl MemoryLock {
    pub fn new(log: &Arc<DriverLog>, behavior: Behavior) -> Self {
        Self {
            instance: log.next(),
            behavior,
            log: Arc::clone(log),
            metadata: None,
        }
    }

    pub fn boxed(log: &Arc<DriverLog>, behavior: Behavior) -> Box<dyn LockStore> {
        Box::new(Self::new(log, behavior))
    }

    pub fn metadata(&self) -> Option<&BaseMetadata> {
        self.metadata.as_ref()
    }
}

#[async_trait]
impl Driver for MemoryLock {
    async fn init(
        &mut self,
        _cancel: &CancellationToken,
        metadata: BaseMetadata,
    ) -> Result<(), DriverError> {
        let running = self.log.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_running.fetch_max(running, Ordering::SeqCst);

        let result = match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(DriverError::unavailable(message.clone())),
            Behavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        };

        self.log.running.fetch_sub(1, Ordering::SeqCst);
        self.metadata = Some(metadata);
        result
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.log.closed.lock().push(self.instance);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl LockStore for MemoryLock {}

/// 取出锁驱动的具体类型
pub fn as_memory_lock(driver: &Arc<dyn LockStore>) -> &MemoryLock {
    driver
        .as_any()
        .downcast_ref::<MemoryLock>()
        .expect("driver is a MemoryLock")
}

/// 内存状态存储驱动
#[derive(Debug, Default)]
pub struct MemoryState;

#[async_trait]
impl Driver for MemoryState {
    async fn init(
        &mut self,
        _cancel: &CancellationToken,
        _metadata: BaseMetadata,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl StateStore for MemoryState {}

/// 内存密钥存储驱动，初始化时把全部属性作为密钥
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
}

#[async_trait]
impl Driver for MemorySecretStore {
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
impl SecretStore for MemorySecretStore {
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

/// 测试配置
pub fn settings() -> RuntimeSettings {
    RuntimeSettings {
        app_id: "checkout".to_string(),
        namespace: "prod".to_string(),
        default_init_timeout_ms: 1000,
        ..RuntimeSettings::default()
    }
}

/// 注册了 `redis` 锁工厂的构建器
pub fn builder_with_redis_lock(log: &Arc<DriverLog>, behavior: Behavior) -> RuntimeBuilder {
    let log = Arc::clone(log);
    RuntimeBuilder::new()
        .with_settings(settings())
        .enable_metrics(false)
        .register_fn::<component_abstractions::LockKind, _>("redis", "", move |_| {
            Ok(Some(MemoryLock::boxed(&log, behavior.clone())))
        })
        .expect("redis lock factory registers")
}
