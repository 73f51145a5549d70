//! 组件处理器抽象接口

use async_trait::async_trait;
use infrastructure_common::{ComponentKind, ComponentSpec, InitResult};
use tokio_util::sync::CancellationToken;

/// 单一种类的组件处理器
#[async_trait]
pub trait ComponentManager: Send + Sync {
    /// 处理的组件种类
    fn kind(&self) -> ComponentKind;

    /// 创建、解析元数据、初始化并注册组件
    async fn init(&self, spec: &ComponentSpec, cancel: &CancellationToken) -> InitResult<()>;

    /// 移除并关闭组件，不存在时返回 `false`
    async fn close(&self, name: &str) -> bool;

    /// 就绪组件名称
    fn names(&self) -> Vec<String>;

    /// 关闭全部组件
    async fn close_all(&self) {
        for name in self.names() {
            self.close(&name).await;
        }
    }
}
