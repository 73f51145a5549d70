//! 组件种类标记
//!
//! 每个种类以零大小类型表示，关联其驱动句柄类型与派生配置类型，
//! 使同一个泛型处理器覆盖全部种类。

use crate::driver::{
    Binding, ConfigurationStore, Driver, LockStore, PubSub, SecretStore, StateStore,
};
use infrastructure_common::{BoxError, ComponentKind, KeyPrefix};
use std::collections::HashMap;
use std::fmt::Debug;

/// 组件种类 trait
pub trait Kind: Send + Sync + 'static {
    /// 存储中持有的驱动句柄类型
    type Handle: ?Sized + Driver;

    /// 与驱动一同保存的派生配置
    type Derived: Clone + Debug + Send + Sync + 'static;

    /// 种类标识
    const KIND: ComponentKind;

    /// 从解析后的属性计算派生配置
    fn derive_configuration(
        name: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Self::Derived, BoxError>;
}

/// 分布式锁种类
#[derive(Debug, Clone, Copy, Default)]
pub struct LockKind;

/// 状态存储种类
#[derive(Debug, Clone, Copy, Default)]
pub struct StateKind;

/// 发布订阅种类
#[derive(Debug, Clone, Copy, Default)]
pub struct PubSubKind;

/// 密钥存储种类
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretStoreKind;

/// 绑定种类
#[derive(Debug, Clone, Copy, Default)]
pub struct BindingKind;

/// 配置存储种类
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationKind;

impl Kind for LockKind {
    type Handle = dyn LockStore;
    type Derived = KeyPrefix;
    const KIND: ComponentKind = ComponentKind::Lock;

    fn derive_configuration(
        _name: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Self::Derived, BoxError> {
        Ok(KeyPrefix::from_properties(properties)?)
    }
}

impl Kind for StateKind {
    type Handle = dyn StateStore;
    type Derived = KeyPrefix;
    const KIND: ComponentKind = ComponentKind::State;

    fn derive_configuration(
        _name: &str,
        properties: &HashMap<String, String>,
    ) -> Result<Self::Derived, BoxError> {
        Ok(KeyPrefix::from_properties(properties)?)
    }
}

macro_rules! kind_without_derived {
    ($kind:ty, $handle:ty, $id:expr) => {
        impl Kind for $kind {
            type Handle = $handle;
            type Derived = ();
            const KIND: ComponentKind = $id;

            fn derive_configuration(
                _name: &str,
                _properties: &HashMap<String, String>,
            ) -> Result<Self::Derived, BoxError> {
                Ok(())
            }
        }
    };
}

kind_without_derived!(PubSubKind, dyn PubSub, ComponentKind::PubSub);
kind_without_derived!(SecretStoreKind, dyn SecretStore, ComponentKind::SecretStore);
kind_without_derived!(BindingKind, dyn Binding, ComponentKind::Binding);
kind_without_derived!(ConfigurationKind, dyn ConfigurationStore, ComponentKind::Configuration);
