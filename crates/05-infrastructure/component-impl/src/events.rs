//! 基于通道的组件事件源

use async_trait::async_trait;
use component_abstractions::ComponentEventSource;
use futures::{Stream, StreamExt};
use infrastructure_common::ComponentEvent;
use tokio::sync::mpsc;

/// 通道事件源
#[derive(Debug)]
pub struct ChannelEventSource {
    receiver: mpsc::Receiver<ComponentEvent>,
}

impl ChannelEventSource {
    /// 从接收端创建事件源
    pub fn new(receiver: mpsc::Receiver<ComponentEvent>) -> Self {
        Self { receiver }
    }

    /// 从固定事件序列创建事件源
    pub fn from_events(events: impl IntoIterator<Item = ComponentEvent>) -> Self {
        let events: Vec<ComponentEvent> = events.into_iter().collect();
        let (sender, receiver) = mpsc::channel(events.len().max(1));
        for event in events {
            // 容量与事件数一致，不会满
            let _ = sender.try_send(event);
        }
        Self::new(receiver)
    }
}

#[async_trait]
impl ComponentEventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Option<ComponentEvent> {
        self.receiver.recv().await
    }
}

/// 基于 `Stream` 的事件源
pub struct StreamEventSource<S> {
    stream: S,
}

impl<S> StreamEventSource<S>
where
    S: Stream<Item = ComponentEvent> + Send + Unpin,
{
    /// 包装事件流
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> ComponentEventSource for StreamEventSource<S>
where
    S: Stream<Item = ComponentEvent> + Send + Unpin,
{
    async fn next_event(&mut self) -> Option<ComponentEvent> {
        self.stream.next().await
    }
}

/// 创建事件通道
pub fn channel(capacity: usize) -> (mpsc::Sender<ComponentEvent>, ChannelEventSource) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (sender, ChannelEventSource::new(receiver))
}
