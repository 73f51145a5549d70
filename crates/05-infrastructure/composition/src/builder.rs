//! 运行时构建器

use crate::infrastructure::ComponentRuntime;
use crate::logging::init_logging;
use crate::reconciler::Reconciler;
use component_abstractions::{
    BindingKind, ComponentFactory, ComponentManager, ComponentRegistry, ConfigurationKind,
    DiagnosticsSink, LockKind, MetadataResolver, PubSubKind, SecretResolver, SecretStoreKind,
    StateKind,
};
use component_impl::{
    CompositeDiagnostics, ComponentRegistryImpl, ComponentStore, InMemoryDiagnostics,
    KindProcessor, MetadataResolverImpl, MetricsDiagnostics, Processor, StoreSecretResolver,
    StoredKind,
};
use config_impl::{RuntimeSettings, SettingsLoader};
use infrastructure_common::{BoxError, ComponentKind, InfrastructureError};
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 运行时构建器
///
/// 使用建造者模式注册组件工厂并组装完整的组件运行时。
pub struct RuntimeBuilder {
    /// 运行时配置
    settings: RuntimeSettings,
    /// 各种类的工厂注册表，值为 `ComponentRegistryImpl<K>`
    registries: HashMap<ComponentKind, Box<dyn Any + Send + Sync>>,
    /// 自定义密钥解析器，未设置时通过 `secretstores` 组件解析
    secret_resolver: Option<Arc<dyn SecretResolver>>,
    /// 额外的诊断接收器
    diagnostics: Vec<Arc<dyn DiagnosticsSink>>,
    /// 是否向 `metrics` 门面上报
    metrics_enabled: bool,
    /// 是否启用日志初始化
    logging_enabled: bool,
}

impl RuntimeBuilder {
    /// 创建新的运行时构建器
    pub fn new() -> Self {
        Self {
            settings: RuntimeSettings::default(),
            registries: HashMap::new(),
            secret_resolver: None,
            diagnostics: Vec::new(),
            metrics_enabled: true,
            logging_enabled: false, // 默认不启用日志初始化
        }
    }

    /// 使用给定配置
    pub fn with_settings(mut self, settings: RuntimeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 从配置文件与环境变量加载配置
    pub fn load_settings(mut self, path: Option<&Path>) -> Result<Self, InfrastructureError> {
        let loader = match path {
            Some(path) => SettingsLoader::new().with_file(path),
            None => SettingsLoader::new(),
        };
        self.settings = loader.load()?;
        Ok(self)
    }

    /// 注册组件工厂
    pub fn register<K: StoredKind>(
        mut self,
        component_type: &str,
        version: &str,
        factory: Arc<dyn ComponentFactory<K>>,
    ) -> Result<Self, InfrastructureError> {
        let registry = self.registry_mut::<K>()?;
        registry.register(component_type, version, factory)?;
        Ok(self)
    }

    /// 以闭包注册组件工厂
    pub fn register_fn<K, F>(
        mut self,
        component_type: &str,
        version: &str,
        factory_fn: F,
    ) -> Result<Self, InfrastructureError>
    where
        K: StoredKind,
        F: Fn(&str) -> Result<Option<Box<K::Handle>>, BoxError> + Send + Sync + 'static,
    {
        let registry = self.registry_mut::<K>()?;
        registry.register_fn(component_type, version, factory_fn)?;
        Ok(self)
    }

    /// 设置密钥解析器
    pub fn with_secret_resolver(mut self, resolver: Arc<dyn SecretResolver>) -> Self {
        self.secret_resolver = Some(resolver);
        self
    }

    /// 添加诊断接收器
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics.push(sink);
        self
    }

    /// 设置是否向 `metrics` 门面上报
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// 启用日志初始化，使用配置中的日志设置
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    fn registry_mut<K: StoredKind>(
        &mut self,
    ) -> Result<&mut ComponentRegistryImpl<K>, InfrastructureError> {
        self.registries
            .entry(K::KIND)
            .or_insert_with(|| Box::new(ComponentRegistryImpl::<K>::new()))
            .downcast_mut::<ComponentRegistryImpl<K>>()
            .ok_or_else(|| InfrastructureError::BootstrapFailed {
                message: format!("组件注册表类型不匹配: {}", K::KIND),
            })
    }

    fn take_registry<K: StoredKind>(&mut self) -> ComponentRegistryImpl<K> {
        self.registries
            .remove(&K::KIND)
            .and_then(|registry| registry.downcast::<ComponentRegistryImpl<K>>().ok())
            .map(|registry| *registry)
            .unwrap_or_default()
    }

    fn kind_processor<K: StoredKind>(
        &mut self,
        store: &ComponentStore,
        resolver: &Arc<dyn MetadataResolver>,
        diagnostics: &Arc<dyn DiagnosticsSink>,
        init_timeout: Duration,
    ) -> Arc<dyn ComponentManager> {
        let registry = self.take_registry::<K>();
        debug!("{} 已注册工厂: {:?}", K::KIND, registry.registered_types());
        Arc::new(
            KindProcessor::<K>::new(
                Arc::new(registry),
                Arc::clone(store.of::<K>()),
                Arc::clone(resolver),
                Arc::clone(diagnostics),
            )
            .with_init_timeout(init_timeout),
        )
    }

    /// 构建运行时实例
    pub fn build(mut self) -> Result<ComponentRuntime, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            init_logging(&self.settings.logging)?;
        }
        info!("开始构建组件运行时: app_id={}", self.settings.app_id);
        self.settings.validate()?;

        let store = Arc::new(ComponentStore::new());
        let secrets = self.secret_resolver.take().unwrap_or_else(|| {
            Arc::new(StoreSecretResolver::new(Arc::clone(store.secret_stores())))
                as Arc<dyn SecretResolver>
        });
        let resolver: Arc<dyn MetadataResolver> = Arc::new(
            MetadataResolverImpl::new(self.settings.metadata_options())
                .with_secret_resolver(secrets),
        );

        let in_memory = Arc::new(InMemoryDiagnostics::new());
        let mut composite = CompositeDiagnostics::new().with_sink(in_memory.clone());
        if self.metrics_enabled {
            composite = composite.with_sink(Arc::new(MetricsDiagnostics::new()));
        }
        for sink in self.diagnostics.drain(..) {
            composite = composite.with_sink(sink);
        }
        let diagnostics: Arc<dyn DiagnosticsSink> = Arc::new(composite);

        let timeout = self.settings.default_init_timeout();
        let managers = [
            self.kind_processor::<LockKind>(&store, &resolver, &diagnostics, timeout),
            self.kind_processor::<StateKind>(&store, &resolver, &diagnostics, timeout),
            self.kind_processor::<PubSubKind>(&store, &resolver, &diagnostics, timeout),
            self.kind_processor::<SecretStoreKind>(&store, &resolver, &diagnostics, timeout),
            self.kind_processor::<BindingKind>(&store, &resolver, &diagnostics, timeout),
            self.kind_processor::<ConfigurationKind>(&store, &resolver, &diagnostics, timeout),
        ];
        let mut processor = Processor::new(Arc::clone(&diagnostics));
        for manager in managers {
            processor.register(manager);
        }
        let processor = Arc::new(processor);

        let reconciler = Reconciler::new(
            Arc::clone(&processor),
            self.settings.reconciler.backlog_warning,
        );

        info!("组件运行时构建完成");
        Ok(ComponentRuntime::new(
            self.settings,
            store,
            processor,
            in_memory,
            reconciler,
        ))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
