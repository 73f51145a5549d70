//! 组件存储实现
//!
//! 每个种类一张并发映射，驱动与其派生配置作为一个条目整体写入，
//! 读者不会看到缺少派生配置的驱动，替换同名组件时也不会出现空窗。

use component_abstractions::{
    BindingKind, ComponentLookup, ConfigurationKind, Kind, LockKind, PubSubKind,
    SecretStoreKind, StateKind,
};
use dashmap::DashMap;
use infrastructure_common::{ComponentKey, ComponentKind};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

struct StoreEntry<K: Kind> {
    driver: Arc<K::Handle>,
    configuration: K::Derived,
}

/// 单一种类的组件存储
pub struct KindStore<K: Kind> {
    entries: DashMap<String, StoreEntry<K>>,
}

impl<K: Kind> KindStore<K> {
    /// 创建空存储
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 写入或原子替换组件，返回被替换的驱动
    pub(crate) fn put(
        &self,
        name: &str,
        driver: Arc<K::Handle>,
        configuration: K::Derived,
    ) -> Option<Arc<K::Handle>> {
        debug!("写入组件存储: {}/{}", K::KIND, name);
        self.entries
            .insert(
                name.to_string(),
                StoreEntry {
                    driver,
                    configuration,
                },
            )
            .map(|previous| previous.driver)
    }

    /// 移除组件及其派生配置，返回被移除的驱动
    pub(crate) fn remove(&self, name: &str) -> Option<Arc<K::Handle>> {
        debug!("移除组件存储条目: {}/{}", K::KIND, name);
        self.entries.remove(name).map(|(_, entry)| entry.driver)
    }
}

impl<K: Kind> Default for KindStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kind> fmt::Debug for KindStore<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindStore")
            .field("kind", &K::KIND)
            .field("names", &self.names())
            .finish()
    }
}

impl<K: Kind> ComponentLookup<K> for KindStore<K> {
    fn get(&self, name: &str) -> Option<Arc<K::Handle>> {
        self.entries.get(name).map(|entry| Arc::clone(&entry.driver))
    }

    fn configuration(&self, name: &str) -> Option<K::Derived> {
        self.entries
            .get(name)
            .map(|entry| entry.configuration.clone())
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// 全部种类的组件存储
///
/// 就绪组件的唯一事实来源，调用方只通过 [`ComponentLookup`] 读取。
#[derive(Debug, Default)]
pub struct ComponentStore {
    locks: Arc<KindStore<LockKind>>,
    state_stores: Arc<KindStore<StateKind>>,
    pubsubs: Arc<KindStore<PubSubKind>>,
    secret_stores: Arc<KindStore<SecretStoreKind>>,
    bindings: Arc<KindStore<BindingKind>>,
    configuration_stores: Arc<KindStore<ConfigurationKind>>,
}

impl ComponentStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 分布式锁
    pub fn locks(&self) -> &Arc<KindStore<LockKind>> {
        &self.locks
    }

    /// 状态存储
    pub fn state_stores(&self) -> &Arc<KindStore<StateKind>> {
        &self.state_stores
    }

    /// 发布订阅
    pub fn pubsubs(&self) -> &Arc<KindStore<PubSubKind>> {
        &self.pubsubs
    }

    /// 密钥存储
    pub fn secret_stores(&self) -> &Arc<KindStore<SecretStoreKind>> {
        &self.secret_stores
    }

    /// 输入输出绑定
    pub fn bindings(&self) -> &Arc<KindStore<BindingKind>> {
        &self.bindings
    }

    /// 配置存储
    pub fn configuration_stores(&self) -> &Arc<KindStore<ConfigurationKind>> {
        &self.configuration_stores
    }

    /// 按种类获取存储
    pub fn of<K: StoredKind>(&self) -> &Arc<KindStore<K>> {
        K::slot(self)
    }

    /// 某一种类的就绪组件名称
    pub fn names(&self, kind: ComponentKind) -> Vec<String> {
        match kind {
            ComponentKind::Lock => self.locks.names(),
            ComponentKind::State => self.state_stores.names(),
            ComponentKind::PubSub => self.pubsubs.names(),
            ComponentKind::SecretStore => self.secret_stores.names(),
            ComponentKind::Binding => self.bindings.names(),
            ComponentKind::Configuration => self.configuration_stores.names(),
        }
    }

    /// 是否存在就绪组件
    pub fn contains(&self, key: &ComponentKey) -> bool {
        match key.kind {
            ComponentKind::Lock => self.locks.contains(&key.name),
            ComponentKind::State => self.state_stores.contains(&key.name),
            ComponentKind::PubSub => self.pubsubs.contains(&key.name),
            ComponentKind::SecretStore => self.secret_stores.contains(&key.name),
            ComponentKind::Binding => self.bindings.contains(&key.name),
            ComponentKind::Configuration => self.configuration_stores.contains(&key.name),
        }
    }

    /// 全部就绪组件
    pub fn list(&self) -> Vec<ComponentKey> {
        ComponentKind::ALL
            .iter()
            .flat_map(|kind| {
                self.names(*kind)
                    .into_iter()
                    .map(move |name| ComponentKey::new(*kind, name))
            })
            .collect()
    }

    /// 就绪组件总数
    pub fn len(&self) -> usize {
        ComponentKind::ALL
            .iter()
            .map(|kind| self.names(*kind).len())
            .sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 在 [`ComponentStore`] 中拥有存储槽位的种类
pub trait StoredKind: Kind + Sized {
    /// 获取该种类的存储
    fn slot(store: &ComponentStore) -> &Arc<KindStore<Self>>;
}

macro_rules! stored_kind {
    ($kind:ty, $field:ident) => {
        impl StoredKind for $kind {
            fn slot(store: &ComponentStore) -> &Arc<KindStore<Self>> {
                &store.$field
            }
        }
    };
}

stored_kind!(LockKind, locks);
stored_kind!(StateKind, state_stores);
stored_kind!(PubSubKind, pubsubs);
stored_kind!(SecretStoreKind, secret_stores);
stored_kind!(BindingKind, bindings);
stored_kind!(ConfigurationKind, configuration_stores);
