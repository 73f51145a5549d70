//! 组件协调器端到端测试
mod common;

use common::{
    as_memory_lock, builder_with_redis_lock, settings, Behavior, DriverLog, MemoryLock,
    MemorySecretStore,
};
use component_abstractions::{ComponentLookup, LockKind, SecretStore, SecretStoreKind};
use component_impl::{channel, ChannelEventSource, EnvSecretResolver};
use infrastructure_common::{
    ComponentEvent, ComponentKey, ComponentKind, ComponentSpec, InitErrorKind, SecretKeyRef,
};
use infrastructure_composition::{RuntimeBuilder, RuntimeStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn lock_spec(name: &str, component_type: &str) -> ComponentSpec {
    ComponentSpec::new(name, ComponentKind::Lock, component_type, "v1")
}

/// 单个组件失败不影响其他组件，失败被记录
#[tokio::test]
async fn test_failure_is_isolated() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    let source = ChannelEventSource::from_events([
        ComponentEvent::created(lock_spec("orders", "redis")),
        ComponentEvent::created(lock_spec("broken", "unknownstore")),
        ComponentEvent::created(lock_spec("payments", "redis")),
    ]);
    let stats = runtime.run(source).await;

    assert_eq!(stats.events, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(
        runtime.locks().names(),
        vec!["orders".to_string(), "payments".to_string()]
    );

    let failures = runtime.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key, ComponentKey::new(ComponentKind::Lock, "broken"));
    assert_eq!(failures[0].code, InitErrorKind::CreateComponentFailure.code());
    Ok(())
}

/// 同名事件按到达顺序应用
#[tokio::test]
async fn test_events_for_same_name_apply_in_order() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime =
        builder_with_redis_lock(&log, Behavior::Delay(Duration::from_millis(20))).build()?;

    let source = ChannelEventSource::from_events([
        ComponentEvent::created(lock_spec("mylock", "redis")),
        ComponentEvent::updated(lock_spec("mylock", "redis")),
        ComponentEvent::deleted(lock_spec("mylock", "redis")),
    ]);
    let stats = runtime.run(source).await;

    assert_eq!(stats.succeeded, 3);
    assert!(runtime.locks().get("mylock").is_none());
    // 第一个驱动被替换时关闭，第二个随删除关闭
    assert_eq!(log.created(), vec![1, 2]);
    assert_eq!(log.closed(), vec![1, 2]);
    Ok(())
}

/// 声明忽略错误的组件失败计入已忽略
#[tokio::test]
async fn test_ignored_failure_is_counted() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime =
        builder_with_redis_lock(&log, Behavior::Fail("connection refused".to_string())).build()?;

    let spec = lock_spec("optional", "redis").with_ignore_errors(true);
    let stats = runtime
        .run(ChannelEventSource::from_events([ComponentEvent::created(spec)]))
        .await;

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.ignored, 1);
    let record = runtime
        .reconciler()
        .failure(&ComponentKey::new(ComponentKind::Lock, "optional"))
        .expect("failure recorded");
    assert!(record.ignored);
    assert_eq!(record.code, "INIT_COMPONENT_FAILURE");
    Ok(())
}

/// 后续成功的事件清除失败记录
#[tokio::test]
async fn test_recovery_clears_failure() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed).build()?;

    assert!(runtime
        .apply(&ComponentEvent::created(lock_spec("mylock", "memcached")))
        .await
        .is_err());
    assert_eq!(runtime.failures().len(), 1);

    runtime
        .apply(&ComponentEvent::updated(lock_spec("mylock", "redis")))
        .await?;
    assert!(runtime.failures().is_empty());
    assert!(runtime.locks().contains("mylock"));
    Ok(())
}

/// 密钥存储组件就绪后，锁组件的密钥引用从中解析
#[tokio::test]
async fn test_secret_store_component_resolves_references() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let factory_log = Arc::clone(&log);
    let runtime = RuntimeBuilder::new()
        .with_settings(settings())
        .enable_metrics(false)
        .register_fn::<SecretStoreKind, _>("memory", "", |_| {
            Ok(Some(Box::new(MemorySecretStore::default()) as Box<dyn SecretStore>))
        })?
        .register_fn::<LockKind, _>("redis", "", move |_| {
            Ok(Some(MemoryLock::boxed(&factory_log, Behavior::Succeed)))
        })?
        .build()?;

    let vault = ComponentSpec::new("vault", ComponentKind::SecretStore, "memory", "")
        .with_property("password", "s3cret");
    let lock = lock_spec("mylock", "redis")
        .with_auth_secret_store("vault")
        .with_property("redisHost", "h:6379")
        .with_secret_ref("redisPassword", SecretKeyRef::new("redis", "password"));

    // 密钥存储尚未就绪时解析失败
    let err = runtime
        .apply(&ComponentEvent::created(lock.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), InitErrorKind::InitComponentFailure);
    assert!(runtime.locks().is_empty());

    runtime.apply(&ComponentEvent::created(vault)).await?;
    runtime.apply(&ComponentEvent::updated(lock)).await?;

    let driver = runtime.locks().get("mylock").expect("mylock is ready");
    let metadata = as_memory_lock(&driver).metadata().cloned().unwrap_or_default();
    assert_eq!(metadata.property("redisPassword"), Some("s3cret"));
    assert_eq!(metadata.property("redisHost"), Some("h:6379"));
    assert_eq!(runtime.secret_stores().names(), vec!["vault".to_string()]);
    Ok(())
}

/// 自定义密钥解析器代替密钥存储组件
#[tokio::test]
async fn test_custom_secret_resolver() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let resolver = EnvSecretResolver::new()
        .with_prefix("LORN_SECRET_")
        .with_overrides(HashMap::from([(
            "LORN_SECRET_REDIS_PASSWORD".to_string(),
            "from-env".to_string(),
        )]));
    let runtime = builder_with_redis_lock(&log, Behavior::Succeed)
        .with_secret_resolver(Arc::new(resolver))
        .build()?;

    let lock = lock_spec("mylock", "redis")
        .with_auth_secret_store("env")
        .with_secret_ref("redisPassword", SecretKeyRef::new("redis", "redis-password"));
    runtime.apply(&ComponentEvent::created(lock)).await?;

    let driver = runtime.locks().get("mylock").expect("mylock is ready");
    let metadata = as_memory_lock(&driver).metadata().cloned().unwrap_or_default();
    assert_eq!(metadata.property("redisPassword"), Some("from-env"));
    assert!(runtime.secret_stores().is_empty());
    Ok(())
}

/// 关闭运行时会停止仍有发送端的协调循环，并关闭全部组件
#[tokio::test]
async fn test_shutdown_stops_run() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = Arc::new(builder_with_redis_lock(&log, Behavior::Succeed).build()?);
    let (sender, source) = channel(8);

    let running = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run(source).await })
    };

    sender
        .send(ComponentEvent::created(lock_spec("mylock", "redis")))
        .await?;
    for _ in 0..100 {
        if runtime.locks().contains("mylock") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(runtime.locks().contains("mylock"));

    runtime.shutdown().await;
    let stats = tokio::time::timeout(Duration::from_secs(1), running).await??;

    assert_eq!(stats.succeeded, 1);
    assert_eq!(runtime.status(), RuntimeStatus::Stopped);
    assert!(runtime.locks().is_empty());
    assert_eq!(log.closed(), vec![1]);
    drop(sender);
    Ok(())
}

/// 某个组件的积压事件不会阻塞其他组件
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_backlog_does_not_block_other_components() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let slow_log = DriverLog::new();
    let mut tight = settings();
    tight.reconciler.backlog_warning = 1;
    let runtime = Arc::new(
        builder_with_redis_lock(&log, Behavior::Succeed)
            .with_settings(tight)
            .register_fn::<LockKind, _>("slow", "", move |_| {
                Ok(Some(MemoryLock::boxed(
                    &slow_log,
                    Behavior::Delay(Duration::from_millis(400)),
                )))
            })?
            .build()?,
    );
    let (sender, source) = channel(16);
    let running = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run(source).await })
    };

    for _ in 0..4 {
        sender
            .send(ComponentEvent::updated(lock_spec("backlogged", "slow")))
            .await?;
    }
    let started = std::time::Instant::now();
    sender
        .send(ComponentEvent::created(lock_spec("orders", "redis")))
        .await?;

    while !runtime.locks().contains("orders") && started.elapsed() < Duration::from_secs(3) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(runtime.locks().contains("orders"));
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!runtime.locks().contains("backlogged"));

    drop(sender);
    let stats = tokio::time::timeout(Duration::from_secs(5), running).await??;
    assert_eq!(stats.succeeded, 5);
    assert!(runtime.locks().contains("backlogged"));
    Ok(())
}

/// 组件事件处理完毕后不再占用协调任务
#[tokio::test]
async fn test_drained_components_are_released() -> anyhow::Result<()> {
    let log = DriverLog::new();
    let runtime = Arc::new(builder_with_redis_lock(&log, Behavior::Succeed).build()?);
    let (sender, source) = channel(64);
    let running = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run(source).await })
    };

    for index in 0..20 {
        let spec = lock_spec(&format!("lock-{index}"), "redis");
        sender.send(ComponentEvent::created(spec.clone())).await?;
        sender.send(ComponentEvent::deleted(spec)).await?;
    }
    for _ in 0..200 {
        let reconciler = runtime.reconciler();
        if reconciler.stats().events == 40 && reconciler.active_components() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(runtime.reconciler().stats().events, 40);
    assert_eq!(runtime.reconciler().active_components(), 0);
    assert!(runtime.locks().is_empty());
    assert!(!running.is_finished());

    drop(sender);
    let stats = tokio::time::timeout(Duration::from_secs(1), running).await??;
    assert_eq!(stats.succeeded, 40);
    Ok(())
}
