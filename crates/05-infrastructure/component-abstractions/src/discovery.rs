//! 组件事件源抽象接口

use async_trait::async_trait;
use infrastructure_common::ComponentEvent;

/// 组件事件源 trait
///
/// 由控制面实现，按名称有序地产生创建、更新、删除事件。
#[async_trait]
pub trait ComponentEventSource: Send {
    /// 等待下一个事件，事件源耗尽时返回 `None`
    async fn next_event(&mut self) -> Option<ComponentEvent>;
}
