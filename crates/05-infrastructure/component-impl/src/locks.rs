//! 按名称的互斥锁

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 按组件名称串行化初始化与关闭
///
/// 不同名称之间互不阻塞，不存在跨全部组件的全局锁。
#[derive(Debug, Default)]
pub struct NameLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NameLocks {
    /// 创建新的名称锁表
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定名称的锁
    pub async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.locks.entry(name.to_string()).or_default().value());
        mutex.lock_owned().await
    }

    /// 在无人持有或等待时移除锁
    pub fn remove_idle(&self, name: &str) {
        self.locks
            .remove_if(name, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    /// 锁表大小
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// 锁表是否为空
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
