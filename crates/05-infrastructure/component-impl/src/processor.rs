//! 组件处理器实现
//!
//! [`KindProcessor`] 负责单一种类的完整生命周期：
//! 创建 → 解析元数据 → 初始化 → 保存派生配置并注册 → 诊断。
//! 任何一步失败都在修改存储之前返回。

use crate::locks::NameLocks;
use crate::store::KindStore;
use async_trait::async_trait;
use component_abstractions::{
    ComponentLookup, ComponentManager, ComponentRegistry, DiagnosticsSink, Driver, Kind,
    MetadataResolver,
};
use infrastructure_common::{
    ComponentEvent, ComponentEventType, ComponentInitError, ComponentKind, ComponentSpec,
    DriverError, InitPhase, InitResult, MetadataError, RegistryError,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 驱动初始化的默认超时
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(5);

/// 单一种类的组件处理器
pub struct KindProcessor<K: Kind> {
    registry: Arc<dyn ComponentRegistry<K>>,
    store: Arc<KindStore<K>>,
    resolver: Arc<dyn MetadataResolver>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    locks: NameLocks,
    init_timeout: Duration,
}

impl<K: Kind> KindProcessor<K> {
    /// 创建新的处理器
    pub fn new(
        registry: Arc<dyn ComponentRegistry<K>>,
        store: Arc<KindStore<K>>,
        resolver: Arc<dyn MetadataResolver>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            registry,
            store,
            resolver,
            diagnostics,
            locks: NameLocks::new(),
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }

    /// 设置默认初始化超时
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// 组件存储
    pub fn store(&self) -> &Arc<KindStore<K>> {
        &self.store
    }

    fn fail(
        &self,
        spec: &ComponentSpec,
        phase: InitPhase,
        error: ComponentInitError,
    ) -> ComponentInitError {
        self.diagnostics
            .component_init_failed(&spec.component_type, phase, &spec.name);
        debug!("组件 {} 在 {} 阶段失败: {}", error.name(), phase.as_str(), error);
        error
    }

    async fn run(&self, spec: &ComponentSpec, cancel: &CancellationToken) -> InitResult<()> {
        let log_name = spec.log_name();
        if cancel.is_cancelled() {
            return Err(ComponentInitError::cancelled(log_name));
        }

        debug!("创建组件: {}", log_name);
        let mut driver = match self
            .registry
            .create(&spec.component_type, &spec.version, &log_name)
        {
            Ok(Some(driver)) => driver,
            Ok(None) => {
                info!("组件工厂未返回驱动，跳过注册: {}", log_name);
                return Ok(());
            }
            Err(e) => {
                let error = ComponentInitError::creation(log_name, e);
                return Err(self.fail(spec, InitPhase::Creation, error));
            }
        };

        debug!("解析组件元数据: {}", log_name);
        let metadata = match self.resolver.to_base_metadata(spec, cancel).await {
            Ok(metadata) => metadata,
            Err(MetadataError::Cancelled) => {
                close_driver(&*driver, &log_name).await;
                return Err(ComponentInitError::cancelled(log_name));
            }
            Err(e) => {
                close_driver(&*driver, &log_name).await;
                let error = ComponentInitError::init(log_name, e);
                return Err(self.fail(spec, InitPhase::Init, error));
            }
        };
        let properties: HashMap<String, String> = metadata.properties.clone();

        let timeout = spec.init_timeout().unwrap_or(self.init_timeout);
        debug!("初始化组件: {}, 超时 {:?}", log_name, timeout);
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = tokio::time::timeout(timeout, driver.init(cancel, metadata)) => Some(result),
        };

        let failure = match outcome {
            Some(Ok(Ok(()))) if !cancel.is_cancelled() => None,
            Some(Ok(Ok(()))) | None => Some(ComponentInitError::cancelled(log_name.clone())),
            Some(Err(_elapsed)) => {
                let timeout = DriverError::Timeout { timeout };
                let error = ComponentInitError::init(log_name.clone(), timeout);
                Some(self.fail(spec, InitPhase::Init, error))
            }
            Some(Ok(Err(e))) => {
                let error = ComponentInitError::init(log_name.clone(), e);
                Some(self.fail(spec, InitPhase::Init, error))
            }
        };
        if let Some(error) = failure {
            close_driver(&*driver, &log_name).await;
            return Err(error);
        }

        let derived = match K::derive_configuration(&spec.name, &properties) {
            Ok(derived) => derived,
            Err(e) => {
                close_driver(&*driver, &log_name).await;
                let error = ComponentInitError::init(log_name, e);
                return Err(self.fail(spec, InitPhase::Init, error));
            }
        };

        let previous = self.store.put(&spec.name, Arc::from(driver), derived);
        self.diagnostics.component_initialized(&spec.component_type);
        info!("组件初始化完成: {}", log_name);

        if let Some(previous) = previous {
            info!("关闭被替换的组件: {}", log_name);
            close_driver(&*previous, &log_name).await;
        }
        Ok(())
    }
}

async fn close_driver<D: ?Sized + Driver>(driver: &D, log_name: &str) {
    if let Err(e) = driver.close().await {
        warn!("关闭组件失败: {}, 原因: {}", log_name, e);
    }
}

#[async_trait]
impl<K: Kind> ComponentManager for KindProcessor<K> {
    fn kind(&self) -> ComponentKind {
        K::KIND
    }

    async fn init(&self, spec: &ComponentSpec, cancel: &CancellationToken) -> InitResult<()> {
        let guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ComponentInitError::cancelled(spec.log_name())),
            guard = self.locks.lock(&spec.name) => guard,
        };
        let result = self.run(spec, cancel).await;
        drop(guard);
        self.locks.remove_idle(&spec.name);
        result
    }

    async fn close(&self, name: &str) -> bool {
        let guard = self.locks.lock(name).await;
        let removed = self.store.remove(name);
        drop(guard);
        self.locks.remove_idle(name);

        match removed {
            Some(driver) => {
                info!("关闭组件: {}/{}", K::KIND, name);
                close_driver(&*driver, name).await;
                true
            }
            None => false,
        }
    }

    fn names(&self) -> Vec<String> {
        self.store.names()
    }
}

/// 组件处理器分发器
///
/// 按种类把事件分发到对应的 [`ComponentManager`]。
pub struct Processor {
    managers: HashMap<ComponentKind, Arc<dyn ComponentManager>>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Processor {
    /// 创建新的分发器
    pub fn new(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            managers: HashMap::new(),
            diagnostics,
        }
    }

    /// 注册种类处理器，同一种类后注册者覆盖先注册者
    pub fn register(&mut self, manager: Arc<dyn ComponentManager>) {
        info!("注册组件处理器: {}", manager.kind());
        self.managers.insert(manager.kind(), manager);
    }

    /// 构建器风格的注册
    pub fn with_manager(mut self, manager: Arc<dyn ComponentManager>) -> Self {
        self.register(manager);
        self
    }

    /// 获取种类处理器
    pub fn manager(&self, kind: ComponentKind) -> Option<&Arc<dyn ComponentManager>> {
        self.managers.get(&kind)
    }

    /// 已注册的种类
    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self.managers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// 初始化组件
    pub async fn init(&self, spec: &ComponentSpec, cancel: &CancellationToken) -> InitResult<()> {
        match self.managers.get(&spec.kind) {
            Some(manager) => manager.init(spec, cancel).await,
            None => {
                self.diagnostics.component_init_failed(
                    &spec.component_type,
                    InitPhase::Creation,
                    &spec.name,
                );
                Err(ComponentInitError::creation(
                    spec.log_name(),
                    RegistryError::KindNotSupported { kind: spec.kind },
                ))
            }
        }
    }

    /// 移除并关闭组件
    pub async fn close(&self, kind: ComponentKind, name: &str) -> bool {
        match self.managers.get(&kind) {
            Some(manager) => manager.close(name).await,
            None => false,
        }
    }

    /// 应用一个组件事件
    pub async fn deliver(
        &self,
        event: &ComponentEvent,
        cancel: &CancellationToken,
    ) -> InitResult<()> {
        match event.event_type {
            ComponentEventType::Created | ComponentEventType::Updated => {
                self.init(&event.spec, cancel).await
            }
            ComponentEventType::Deleted => {
                if !self.close(event.spec.kind, &event.spec.name).await {
                    debug!("删除的组件不存在: {}", event.component_key());
                }
                Ok(())
            }
        }
    }

    /// 关闭全部组件
    pub async fn shutdown(&self) {
        for kind in self.kinds() {
            if let Some(manager) = self.managers.get(&kind) {
                manager.close_all().await;
            }
        }
    }
}
