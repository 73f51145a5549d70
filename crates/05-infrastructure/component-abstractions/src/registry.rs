//! 组件注册表抽象接口

use crate::factory::ComponentFactory;
use crate::kinds::Kind;
use infrastructure_common::RegistryError;
use std::sync::Arc;

/// 组件注册表 trait
///
/// 以 (类型, 版本) 为键分发到工厂，纯分发，不做 I/O。
pub trait ComponentRegistry<K: Kind>: Send + Sync {
    /// 注册组件工厂，版本为空表示默认版本
    fn register(
        &mut self,
        component_type: &str,
        version: &str,
        factory: Arc<dyn ComponentFactory<K>>,
    ) -> Result<(), RegistryError>;

    /// 创建未初始化的驱动
    fn create(
        &self,
        component_type: &str,
        version: &str,
        log_name: &str,
    ) -> Result<Option<Box<K::Handle>>, RegistryError>;

    /// 检查 (类型, 版本) 能否解析到工厂
    fn is_registered(&self, component_type: &str, version: &str) -> bool;

    /// 已注册的键，形如 `redis/v1`
    fn registered_types(&self) -> Vec<String>;
}
