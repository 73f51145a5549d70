//! 组件存储访问接口
//!
//! 请求路由只通过该接口读取就绪组件，不直接共享底层映射。

use crate::kinds::Kind;
use std::sync::Arc;

/// 组件存储的只读访问接口
pub trait ComponentLookup<K: Kind>: Send + Sync {
    /// 获取就绪的驱动
    fn get(&self, name: &str) -> Option<Arc<K::Handle>>;

    /// 获取组件的派生配置
    fn configuration(&self, name: &str) -> Option<K::Derived>;

    /// 是否存在就绪组件
    fn contains(&self, name: &str) -> bool;

    /// 全部就绪组件名称（已排序）
    fn names(&self) -> Vec<String>;

    /// 就绪组件数量
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
