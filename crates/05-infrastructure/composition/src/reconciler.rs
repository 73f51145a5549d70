//! 组件协调器
//!
//! 消费控制面事件源，按组件键维护积压队列：同一组件同时只有一个处理任务，
//! 事件按到达顺序应用；不同组件并行推进，互不等待。队列排空后立即回收。
//! 失败只记录，不重试，也不影响其他组件。

use component_abstractions::ComponentEventSource;
use component_impl::Processor;
use dashmap::DashMap;
use futures::FutureExt;
use infrastructure_common::{ComponentEvent, ComponentKey, FailureRecord, InitResult};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 协调统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// 已应用的事件数
    pub events: u64,
    /// 成功的事件数
    pub succeeded: u64,
    /// 失败的事件数（含已忽略）
    pub failed: u64,
    /// 按声明忽略的失败数
    pub ignored: u64,
    /// 被取消的事件数
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct Counters {
    events: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ReconcileStats {
        ReconcileStats {
            events: self.events.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

struct Inner {
    processor: Arc<Processor>,
    failures: DashMap<ComponentKey, FailureRecord>,
    counters: Counters,
    active: AtomicUsize,
    backlog_warning: usize,
}

/// 按组件键的积压事件，键存在即表示该组件有处理任务在运行
type Backlog = HashMap<ComponentKey, VecDeque<ComponentEvent>>;

/// 组件协调器
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

impl Reconciler {
    /// 创建新的协调器
    pub fn new(processor: Arc<Processor>, backlog_warning: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                failures: DashMap::new(),
                counters: Counters::default(),
                active: AtomicUsize::new(0),
                backlog_warning: backlog_warning.max(1),
            }),
        }
    }

    /// 应用单个事件并记录结果
    pub async fn apply(
        &self,
        event: &ComponentEvent,
        cancel: &CancellationToken,
    ) -> InitResult<()> {
        let inner = &self.inner;
        let key = event.component_key();
        inner.counters.events.fetch_add(1, Ordering::Relaxed);

        let result = inner.processor.deliver(event, cancel).await;
        match &result {
            Ok(()) => {
                inner.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                if inner.failures.remove(&key).is_some() {
                    info!("组件已恢复: {}", key);
                }
            }
            Err(e) => {
                let record = FailureRecord::from_error(&event.spec, e);
                if record.is_cancellation() {
                    inner.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                    info!("组件处理已取消: {}", e);
                } else {
                    inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                    if record.ignored {
                        inner.counters.ignored.fetch_add(1, Ordering::Relaxed);
                        warn!("组件初始化失败，按声明忽略: {}", e);
                    } else {
                        error!("组件初始化失败: {}", e);
                    }
                }
                inner.failures.insert(key, record);
            }
        }
        result
    }

    /// 运行协调循环，直到事件源耗尽或收到取消信号
    ///
    /// 事件源耗尽时处理完全部积压事件后返回；取消时丢弃积压事件，
    /// 等待进行中的任务结束后返回。
    pub async fn run<S>(&self, mut source: S, cancel: CancellationToken) -> ReconcileStats
    where
        S: ComponentEventSource,
    {
        info!("组件协调器启动");
        let mut backlog = Backlog::new();
        let mut workers: JoinSet<ComponentKey> = JoinSet::new();
        let mut source_open = true;

        while source_open || !workers.is_empty() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("组件协调器收到取消信号");
                    break;
                }
                Some(joined) = workers.join_next(), if !workers.is_empty() => match joined {
                    Ok(key) => self.advance(key, &mut backlog, &mut workers, &cancel),
                    Err(e) => error!("组件协调任务异常退出: {}", e),
                },
                event = source.next_event(), if source_open => match event {
                    Some(event) => self.dispatch(event, &mut backlog, &mut workers, &cancel),
                    None => {
                        debug!("组件事件源已耗尽");
                        source_open = false;
                    }
                },
            }
        }

        let dropped: usize = backlog.values().map(VecDeque::len).sum();
        if dropped > 0 {
            warn!("组件协调器停止，丢弃 {} 个积压事件", dropped);
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("组件协调任务异常退出: {}", e);
            }
        }
        self.inner.active.store(0, Ordering::Relaxed);

        let stats = self.stats();
        info!(
            "组件协调器停止: 事件 {}, 成功 {}, 失败 {}",
            stats.events, stats.succeeded, stats.failed
        );
        stats
    }

    fn dispatch(
        &self,
        event: ComponentEvent,
        backlog: &mut Backlog,
        workers: &mut JoinSet<ComponentKey>,
        cancel: &CancellationToken,
    ) {
        let key = event.component_key();
        if let Some(pending) = backlog.get_mut(&key) {
            pending.push_back(event);
            if pending.len() == self.inner.backlog_warning {
                warn!("组件事件积压: {}, 待处理 {}", key, pending.len());
            }
            return;
        }

        backlog.insert(key.clone(), VecDeque::new());
        self.inner.active.fetch_add(1, Ordering::Relaxed);
        self.spawn(key, event, workers, cancel);
    }

    fn advance(
        &self,
        key: ComponentKey,
        backlog: &mut Backlog,
        workers: &mut JoinSet<ComponentKey>,
        cancel: &CancellationToken,
    ) {
        match backlog.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(event) => self.spawn(key, event, workers, cancel),
            None => {
                backlog.remove(&key);
                self.inner.active.fetch_sub(1, Ordering::Relaxed);
                debug!("组件事件队列已排空: {}", key);
            }
        }
    }

    fn spawn(
        &self,
        key: ComponentKey,
        event: ComponentEvent,
        workers: &mut JoinSet<ComponentKey>,
        cancel: &CancellationToken,
    ) {
        let reconciler = self.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            debug!("处理组件事件: {} {:?}", key, event.event_type);
            // 结果已在 apply 中记录
            let outcome = AssertUnwindSafe(reconciler.apply(&event, &cancel))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                error!("组件事件处理异常: {}", key);
            }
            key
        });
    }

    /// 当前有处理任务或积压事件的组件数
    pub fn active_components(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }

    /// 组件最近一次失败记录
    pub fn failure(&self, key: &ComponentKey) -> Option<FailureRecord> {
        self.inner.failures.get(key).map(|record| record.clone())
    }

    /// 全部失败记录（按组件键排序）
    pub fn failures(&self) -> Vec<FailureRecord> {
        let mut records: Vec<FailureRecord> = self
            .inner
            .failures
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    /// 协调统计
    pub fn stats(&self) -> ReconcileStats {
        self.inner.counters.snapshot()
    }

    /// 组件处理器
    pub fn processor(&self) -> &Arc<Processor> {
        &self.inner.processor
    }
}
