//! 配置加载器实现

use crate::settings::RuntimeSettings;
use infrastructure_common::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// 默认配置文件（不含扩展名）
pub const DEFAULT_SETTINGS_FILE: &str = "config/runtime";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "LORN";

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl From<SettingsFormat> for config::FileFormat {
    fn from(format: SettingsFormat) -> Self {
        match format {
            SettingsFormat::Toml => Self::Toml,
            SettingsFormat::Yaml => Self::Yaml,
            SettingsFormat::Json => Self::Json,
        }
    }
}

/// 运行时配置加载器
///
/// 来源按顺序叠加：默认值、配置文件、环境变量
/// （`LORN_APP_ID`、`LORN_LOGGING__LEVEL` 等）。
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: String,
    env_overrides: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    /// 创建新的加载器
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
            env_overrides: None,
        }
    }

    /// 指定配置文件，文件必须存在
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// 设置环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 用给定映射代替进程环境变量
    pub fn with_env_overrides(mut self, vars: HashMap<String, String>) -> Self {
        self.env_overrides = Some(vars);
        self
    }

    fn environment(&self) -> config::Environment {
        config::Environment::with_prefix(&self.env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(self.env_overrides.clone())
    }

    /// 加载并校验配置
    pub fn load(&self) -> ConfigResult<RuntimeSettings> {
        let mut builder = config::Config::builder();
        builder = match &self.file {
            Some(path) => {
                if !path.exists() {
                    error!("配置文件不存在: {}", path.display());
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                info!("加载配置文件: {}", path.display());
                builder.add_source(config::File::from(path.as_path()))
            }
            None => builder
                .add_source(config::File::with_name(DEFAULT_SETTINGS_FILE).required(false)),
        };
        builder = builder.add_source(self.environment());

        build_settings(builder)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// 从配置文件与进程环境变量加载配置
pub fn load_settings(path: Option<&Path>) -> ConfigResult<RuntimeSettings> {
    let loader = SettingsLoader::new();
    match path {
        Some(path) => loader.with_file(path).load(),
        None => loader.load(),
    }
}

/// 从字符串加载配置，不读取环境变量
pub fn load_settings_from_str(
    content: &str,
    format: SettingsFormat,
) -> ConfigResult<RuntimeSettings> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::from(format)));
    build_settings(builder)
}

fn build_settings(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> ConfigResult<RuntimeSettings> {
    let settings: RuntimeSettings = builder
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|e| {
            error!("配置解析失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

    settings.validate()?;
    debug!(
        "配置加载成功: app_id={}, namespace={}",
        settings.app_id, settings.namespace
    );
    Ok(settings)
}
