//! 组件工厂抽象接口
//!
//! 工厂只负责构造未初始化的驱动，不做任何 I/O。

use crate::kinds::Kind;
use infrastructure_common::BoxError;
use std::marker::PhantomData;

/// 组件工厂 trait
pub trait ComponentFactory<K: Kind>: Send + Sync {
    /// 创建驱动
    ///
    /// 返回 `Ok(None)` 表示该声明有意禁用此种类，处理器按成功处理且不注册。
    fn create(&self, log_name: &str) -> Result<Option<Box<K::Handle>>, BoxError>;
}

/// Lambda 工厂包装器
pub struct LambdaFactory<K, F>
where
    K: Kind,
    F: Fn(&str) -> Result<Option<Box<K::Handle>>, BoxError> + Send + Sync + 'static,
{
    factory_fn: F,
    kind: PhantomData<fn() -> K>,
}

impl<K, F> LambdaFactory<K, F>
where
    K: Kind,
    F: Fn(&str) -> Result<Option<Box<K::Handle>>, BoxError> + Send + Sync + 'static,
{
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            kind: PhantomData,
        }
    }
}

impl<K, F> ComponentFactory<K> for LambdaFactory<K, F>
where
    K: Kind,
    F: Fn(&str) -> Result<Option<Box<K::Handle>>, BoxError> + Send + Sync + 'static,
{
    fn create(&self, log_name: &str) -> Result<Option<Box<K::Handle>>, BoxError> {
        (self.factory_fn)(log_name)
    }
}
