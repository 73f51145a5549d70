//! 组件处理器端到端测试
mod common;

use common::{as_memory_lock, builder_with_redis_lock, Behavior, DriverLog, MemoryLock};
use component_abstractions::{ComponentLookup, LockKind};
use infrastructure_common::{
    ComponentEvent, ComponentKind, ComponentSpec, InitErrorKind, InitOutcome, KeyPrefix,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn mylock(component_type: &str) -> ComponentSpec {
    ComponentSpec::new("mylock", ComponentKind::Lock, component_type, "v1")
        .with_property("redisHost", "h:6379")
}

/// 已注册工厂且初始化成功：可读取到组件，记录一次成功诊断
#[tokio::test]
async fn test_registered_redis_lock_initializes() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;

    let driver = runtime.locks().get("mylock").expect("mylock is ready");
    let lock = as_memory_lock(&driver);
    assert_eq!(lock.metadata().and_then(|m| m.property("redisHost")), Some("h:6379"));
    assert_eq!(runtime.diagnostics().count("redis", InitOutcome::Initialized), 1);
    assert_eq!(runtime.diagnostics().total(), 1);
    Ok(())
}

/// 未注册的类型：返回创建失败，存储中没有条目
#[tokio::test]
async fn test_unknown_type_is_creation_failure() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    let err = runtime
        .apply(&ComponentEvent::created(mylock("unknownstore")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), InitErrorKind::CreateComponentFailure);
    assert!(err.to_string().contains("mylock (unknownstore/v1)"));
    assert!(runtime.locks().get("mylock").is_none());
    assert_eq!(
        runtime.diagnostics().count("unknownstore", InitOutcome::CreationFailed),
        1
    );
    assert!(log.created().is_empty());
    Ok(())
}

/// 同名组件先后成功：只能读到第二个驱动，第一个被关闭
#[tokio::test]
async fn test_second_spec_replaces_first() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;
    runtime.apply(&ComponentEvent::updated(mylock("redis"))).await?;

    let driver = runtime.locks().get("mylock").expect("mylock is ready");
    assert_eq!(as_memory_lock(&driver).instance, 2);
    assert_eq!(log.closed(), vec![1]);
    assert_eq!(runtime.locks().len(), 1);
    Ok(())
}

/// 成功时存储中的驱动就是工厂在本次初始化中创建的实例
#[tokio::test]
async fn test_store_holds_exact_created_instance() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    runtime.apply(&ComponentEvent::created(mylock("lock.redis"))).await?;

    let driver = runtime.locks().get("mylock").expect("mylock is ready");
    assert_eq!(log.created(), vec![as_memory_lock(&driver).instance]);
    Ok(())
}

/// 工厂不返回驱动：视为成功，不注册，不记录诊断
#[tokio::test]
async fn test_disabled_factory_is_noop() -> anyhow::Result<()> {
    let runtime = infrastructure_composition::RuntimeBuilder::new()
        .with_settings(common::settings())
        .enable_metrics(false)
        .register_fn::<LockKind, _>("noop", "", |_| Ok(None))?
        .build()?;

    runtime.apply(&ComponentEvent::created(mylock("noop"))).await?;
    assert!(runtime.locks().is_empty());
    assert_eq!(runtime.diagnostics().total(), 0);
    Ok(())
}

/// 驱动初始化失败：没有条目，且恰好一次初始化失败诊断
#[tokio::test]
async fn test_init_failure_leaves_no_entry() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime =
        builder_with_redis_lock(&log, Behavior::Fail("connection refused".to_string())).build()?;

    let err = runtime
        .apply(&ComponentEvent::created(mylock("redis")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), InitErrorKind::InitComponentFailure);
    assert!(runtime.locks().get("mylock").is_none());
    assert_eq!(runtime.diagnostics().count("redis", InitOutcome::InitFailed), 1);
    assert_eq!(runtime.diagnostics().total(), 1);
    assert_eq!(runtime.diagnostics().failures()[0].name, "mylock");
    Ok(())
}

/// 初始化失败的替换不影响已就绪的旧驱动
#[tokio::test]
async fn test_failed_update_keeps_previous_driver() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let fail_next = Arc::new(AtomicBool::new(false));
    let factory_log = Arc::clone(&log);
    let factory_flag = Arc::clone(&fail_next);
    let runtime = infrastructure_composition::RuntimeBuilder::new()
        .with_settings(common::settings())
        .enable_metrics(false)
        .register_fn::<LockKind, _>("redis", "", move |_| {
            let behavior = if factory_flag.load(Ordering::SeqCst) {
                Behavior::Fail("auth failed".to_string())
            } else {
                Behavior::Succeed
            };
            Ok(Some(MemoryLock::boxed(&factory_log, behavior)))
        })?
        .build()?;

    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;
    fail_next.store(true, Ordering::SeqCst);
    assert!(runtime.apply(&ComponentEvent::updated(mylock("redis"))).await.is_err());

    let driver = runtime.locks().get("mylock").expect("previous driver still ready");
    assert_eq!(as_memory_lock(&driver).instance, 1);
    Ok(())
}

/// 初始化完成前取消：没有条目
#[tokio::test]
async fn test_cancel_before_init_returns() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime =
        builder_with_redis_lock(&log, Behavior::Delay(Duration::from_millis(300))).build()?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let err = runtime
        .processor()
        .init(&mylock("redis"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), InitErrorKind::Cancellation);
    assert!(runtime.locks().get("mylock").is_none());
    assert_eq!(runtime.diagnostics().total(), 0);
    Ok(())
}

/// 替换对并发读者是原子的：读者不会看到“不存在”
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_replacement_is_atomic_for_readers() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = Arc::new(builder_with_redis_lock(&log, Behavior::Succeed).build()?);
    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;

    let stop = Arc::new(AtomicBool::new(false));
    let misses = Arc::new(AtomicU64::new(0));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let runtime = Arc::clone(&runtime);
        let stop = Arc::clone(&stop);
        let misses = Arc::clone(&misses);
        readers.push(tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                if runtime.locks().get("mylock").is_none() {
                    misses.fetch_add(1, Ordering::SeqCst);
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for _ in 0..50 {
        runtime.apply(&ComponentEvent::updated(mylock("redis"))).await?;
    }
    stop.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.await?;
    }

    assert_eq!(misses.load(Ordering::SeqCst), 0);
    assert_eq!(log.created().len(), 51);
    assert_eq!(log.closed().len(), 50);
    Ok(())
}

/// 同名初始化串行，不同名称并行
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_name_serialized_different_names_parallel() -> anyhow::Result<()> {
    let same_log = DriverLog::new();
    let runtime = Arc::new(
        builder_with_redis_lock(&same_log, Behavior::Delay(Duration::from_millis(100))).build()?,
    );

    let first = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.apply(&ComponentEvent::created(mylock("redis"))).await })
    };
    let second = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.apply(&ComponentEvent::updated(mylock("redis"))).await })
    };
    first.await??;
    second.await??;
    assert_eq!(same_log.max_running(), 1);

    let parallel_log = DriverLog::new();
    let runtime = Arc::new(
        builder_with_redis_lock(&parallel_log, Behavior::Delay(Duration::from_millis(200)))
            .build()?,
    );
    let handles: Vec<_> = ["lock-a", "lock-b"]
        .into_iter()
        .map(|name| {
            let runtime = Arc::clone(&runtime);
            let spec = ComponentSpec::new(name, ComponentKind::Lock, "redis", "v1");
            tokio::spawn(async move { runtime.apply(&ComponentEvent::created(spec)).await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }
    assert_eq!(parallel_log.max_running(), 2);
    assert_eq!(runtime.locks().names(), vec!["lock-a".to_string(), "lock-b".to_string()]);
    Ok(())
}

/// 键前缀派生配置与驱动一同可读
#[tokio::test]
async fn test_key_prefix_persisted_with_driver() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;
    let prefix = runtime.locks().configuration("mylock").expect("derived configuration");
    assert_eq!(prefix, KeyPrefix::AppId);
    assert_eq!(prefix.modify_key("order-1", "mylock", "checkout")?, "checkout||order-1");

    let custom = mylock("redis").with_property("KeyPrefix", "tenant-a");
    runtime.apply(&ComponentEvent::updated(custom)).await?;
    assert_eq!(
        runtime.locks().configuration("mylock"),
        Some(KeyPrefix::Custom("tenant-a".to_string()))
    );

    let invalid = mylock("redis").with_property("keyPrefix", "a||b");
    let err = runtime.apply(&ComponentEvent::updated(invalid)).await.unwrap_err();
    assert_eq!(err.kind(), InitErrorKind::InitComponentFailure);
    assert_eq!(
        runtime.locks().configuration("mylock"),
        Some(KeyPrefix::Custom("tenant-a".to_string()))
    );
    Ok(())
}

/// 初始化超时按声明优先
#[tokio::test]
async fn test_spec_init_timeout() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime =
        builder_with_redis_lock(&log, Behavior::Delay(Duration::from_millis(300))).build()?;

    let spec = mylock("redis").with_init_timeout(Duration::from_millis(50));
    let err = runtime.apply(&ComponentEvent::created(spec)).await.unwrap_err();
    assert_eq!(err.kind(), InitErrorKind::InitComponentFailure);
    assert!(runtime.locks().is_empty());
    assert_eq!(log.closed(), vec![1]);
    Ok(())
}

/// 删除事件移除并关闭组件
#[tokio::test]
async fn test_delete_closes_driver() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    runtime.apply(&ComponentEvent::created(mylock("redis"))).await?;
    runtime.apply(&ComponentEvent::deleted(mylock("redis"))).await?;

    assert!(runtime.locks().get("mylock").is_none());
    assert!(runtime.locks().configuration("mylock").is_none());
    assert_eq!(log.closed(), vec![1]);
    Ok(())
}
