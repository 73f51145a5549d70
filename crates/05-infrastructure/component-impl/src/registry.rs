//! 组件注册表实现

use component_abstractions::{ComponentFactory, ComponentRegistry, Kind, LambdaFactory};
use infrastructure_common::{BoxError, RegistryError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 视为初始版本的版本号，查找失败时回退到未指定版本的工厂
const INITIAL_VERSIONS: [&str; 3] = ["", "v0", "v1"];

/// 基于 HashMap 的组件注册表
///
/// 键为规整后的 `type` 或 `type/version`，类型不区分大小写，
/// 并去除 `lock.` 这类种类前缀。
pub struct ComponentRegistryImpl<K: Kind> {
    factories: HashMap<String, Arc<dyn ComponentFactory<K>>>,
}

impl<K: Kind> ComponentRegistryImpl<K> {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 以闭包注册工厂
    pub fn register_fn<F>(
        &mut self,
        component_type: &str,
        version: &str,
        factory_fn: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&str) -> Result<Option<Box<K::Handle>>, BoxError> + Send + Sync + 'static,
    {
        self.register(
            component_type,
            version,
            Arc::new(LambdaFactory::<K, F>::new(factory_fn)),
        )
    }

    /// 构建器风格的注册
    pub fn with_factory(
        mut self,
        component_type: &str,
        version: &str,
        factory: Arc<dyn ComponentFactory<K>>,
    ) -> Result<Self, RegistryError> {
        self.register(component_type, version, factory)?;
        Ok(self)
    }

    fn normalize_type(component_type: &str) -> String {
        let lower = component_type.trim().to_ascii_lowercase();
        let prefix = K::KIND.type_prefix();
        match lower.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('.')) {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => lower,
        }
    }

    fn key(component_type: &str, version: &str) -> String {
        let version = version.trim().to_ascii_lowercase();
        if version.is_empty() {
            component_type.to_string()
        } else {
            format!("{component_type}/{version}")
        }
    }

    fn lookup(
        &self,
        component_type: &str,
        version: &str,
    ) -> Option<&Arc<dyn ComponentFactory<K>>> {
        let normalized = Self::normalize_type(component_type);
        let version = version.trim().to_ascii_lowercase();

        self.factories
            .get(&Self::key(&normalized, &version))
            .or_else(|| {
                INITIAL_VERSIONS
                    .contains(&version.as_str())
                    .then(|| self.factories.get(&normalized))
                    .flatten()
            })
    }
}

impl<K: Kind> Default for ComponentRegistryImpl<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind> fmt::Debug for ComponentRegistryImpl<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistryImpl")
            .field("kind", &K::KIND)
            .field("factories", &self.registered_types())
            .finish()
    }
}

impl<K: Kind> ComponentRegistry<K> for ComponentRegistryImpl<K> {
    fn register(
        &mut self,
        component_type: &str,
        version: &str,
        factory: Arc<dyn ComponentFactory<K>>,
    ) -> Result<(), RegistryError> {
        let key = Self::key(&Self::normalize_type(component_type), version);
        if self.factories.contains_key(&key) {
            return Err(RegistryError::DuplicateFactory {
                kind: K::KIND,
                component_type: component_type.to_string(),
                version: version.to_string(),
            });
        }

        info!("注册组件工厂: {}.{}", K::KIND, key);
        self.factories.insert(key, factory);
        Ok(())
    }

    fn create(
        &self,
        component_type: &str,
        version: &str,
        log_name: &str,
    ) -> Result<Option<Box<K::Handle>>, RegistryError> {
        let factory = self
            .lookup(component_type, version)
            .ok_or_else(|| RegistryError::FactoryNotFound {
                kind: K::KIND,
                component_type: component_type.to_string(),
                version: version.to_string(),
            })?;

        debug!("调用组件工厂: {}", log_name);
        factory
            .create(log_name)
            .map_err(|source| RegistryError::FactoryFailed {
                kind: K::KIND,
                component_type: component_type.to_string(),
                source,
            })
    }

    fn is_registered(&self, component_type: &str, version: &str) -> bool {
        self.lookup(component_type, version).is_some()
    }

    fn registered_types(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.factories.keys().cloned().collect();
        keys.sort();
        keys
    }
}
