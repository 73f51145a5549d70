//! # 示例应用程序
//!
//! 演示如何使用 Lorn 组件运行时加载配置、注册驱动并应用组件声明

mod drivers;

use clap::Parser;
use component_abstractions::ComponentLookup;
use component_impl::{EnvSecretResolver, StreamEventSource};
use infrastructure_common::{ComponentEvent, ComponentKind, ComponentSpec};
use infrastructure_composition::{ComponentRuntime, RuntimeBuilder};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 内置的示例组件声明
const DEMO_COMPONENTS: &str = include_str!("../components.yaml");

/// 密钥环境变量前缀
const SECRET_ENV_PREFIX: &str = "LORN_SECRET_";

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn 组件运行时示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 组件声明文件（YAML）
    #[arg(long)]
    components: Option<PathBuf>,

    /// 从 `LORN_SECRET_*` 环境变量解析密钥引用，代替密钥存储组件
    #[arg(long)]
    env_secrets: bool,

    /// 打印合并后的配置并退出
    #[arg(long)]
    print_config: bool,
}

/// 组件声明文件
#[derive(Debug, Deserialize)]
struct ComponentsFile {
    #[serde(default)]
    components: Vec<ComponentSpec>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = config_impl::load_settings(args.config.as_deref())?;
    if args.print_config {
        println!("{}", settings.to_toml()?);
        return Ok(());
    }

    let mut builder = RuntimeBuilder::new()
        .with_settings(settings)
        .with_logging(true);
    if args.env_secrets {
        let resolver = EnvSecretResolver::new().with_prefix(SECRET_ENV_PREFIX);
        builder = builder.with_secret_resolver(Arc::new(resolver));
    }
    let runtime = drivers::register(builder)?.build()?;
    info!("启动 Lorn 组件运行时示例应用");

    let specs = load_components(args.components.as_ref())?;
    apply_components(&runtime, specs).await;
    demonstrate_lookup(&runtime);

    println!("{}", serde_json::to_string_pretty(&runtime.metrics())?);
    let failures = runtime.failures();
    if !failures.is_empty() {
        println!("{}", serde_json::to_string_pretty(&failures)?);
    }

    runtime.shutdown().await;
    info!("应用已关闭");
    Ok(())
}

/// 读取组件声明
fn load_components(path: Option<&PathBuf>) -> anyhow::Result<Vec<ComponentSpec>> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEMO_COMPONENTS.to_string(),
    };
    let file: ComponentsFile = serde_yaml::from_str(&content)?;
    info!("读取到 {} 个组件声明", file.components.len());
    Ok(file.components)
}

/// 先就绪密钥存储，再由协调器并行应用其余组件
async fn apply_components(runtime: &ComponentRuntime, specs: Vec<ComponentSpec>) {
    let (secret_stores, others): (Vec<_>, Vec<_>) = specs
        .into_iter()
        .partition(|spec| spec.kind == ComponentKind::SecretStore);

    for spec in secret_stores {
        if let Err(e) = runtime.apply(&ComponentEvent::created(spec)).await {
            warn!("密钥存储初始化失败: {}", e);
        }
    }

    let events = futures::stream::iter(others.into_iter().map(ComponentEvent::created));
    let stats = runtime.run(StreamEventSource::new(events)).await;
    info!(
        "组件应用完成: 成功 {}, 失败 {}, 忽略 {}",
        stats.succeeded, stats.failed, stats.ignored
    );
}

/// 演示从组件存储读取就绪组件与其键前缀
fn demonstrate_lookup(runtime: &ComponentRuntime) {
    let app_id = &runtime.settings().app_id;
    for name in runtime.locks().names() {
        let Some(prefix) = runtime.locks().configuration(&name) else {
            continue;
        };
        match prefix.modify_key("order-1001", &name, app_id) {
            Ok(key) => info!("锁 {} 的后端键: {}", name, key),
            Err(e) => warn!("锁 {} 键计算失败: {}", name, e),
        }
    }
    info!("就绪的状态存储: {:?}", runtime.state_stores().names());
}
