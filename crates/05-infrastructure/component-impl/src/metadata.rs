//! 元数据解析实现
//!
//! 合并顺序固定：
//! 1. 声明中的字面属性（按声明顺序，后者覆盖前者）
//! 2. 内置覆盖：展开 `{namespace}`、`{appID}`、`{podName}` 占位符
//! 3. 密钥引用解析出的值，原样覆盖同名字面属性

use async_trait::async_trait;
use component_abstractions::{MetadataResolver, SecretResolver};
use infrastructure_common::{
    BaseMetadata, ComponentSpec, MetadataError, MetadataOptions, MetadataValue, SecretKeyRef,
};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const NAMESPACE_PLACEHOLDER: &str = "{namespace}";
const APP_ID_PLACEHOLDER: &str = "{appID}";
const POD_NAME_PLACEHOLDER: &str = "{podName}";

/// 元数据解析器实现
pub struct MetadataResolverImpl {
    options: MetadataOptions,
    secrets: Option<Arc<dyn SecretResolver>>,
}

impl MetadataResolverImpl {
    /// 创建新的元数据解析器
    pub fn new(options: MetadataOptions) -> Self {
        Self {
            options,
            secrets: None,
        }
    }

    /// 设置密钥解析器
    pub fn with_secret_resolver(mut self, resolver: Arc<dyn SecretResolver>) -> Self {
        self.secrets = Some(resolver);
        self
    }

    /// 解析选项
    pub fn options(&self) -> &MetadataOptions {
        &self.options
    }

    fn expand(&self, property: &str, value: &str) -> Result<String, MetadataError> {
        if !value.contains('{') {
            return Ok(value.to_string());
        }

        let mut expanded = value
            .replace(NAMESPACE_PLACEHOLDER, &self.options.namespace_scope())
            .replace(APP_ID_PLACEHOLDER, &self.options.app_id);

        if expanded.contains(POD_NAME_PLACEHOLDER) {
            let pod_name =
                self.options
                    .pod_name
                    .as_deref()
                    .ok_or_else(|| MetadataError::MissingPodName {
                        property: property.to_string(),
                    })?;
            expanded = expanded.replace(POD_NAME_PLACEHOLDER, pod_name);
        }
        Ok(expanded)
    }

    async fn resolve_secrets(
        &self,
        spec: &ComponentSpec,
        references: Vec<(&str, &SecretKeyRef)>,
        properties: &mut HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<(), MetadataError> {
        let Some((first_property, _)) = references.first() else {
            return Ok(());
        };

        let store = spec
            .auth_secret_store
            .as_deref()
            .or(self.options.default_secret_store.as_deref())
            .ok_or_else(|| MetadataError::MissingSecretStore {
                property: (*first_property).to_string(),
            })?;
        let resolver = self
            .secrets
            .as_ref()
            .ok_or_else(|| MetadataError::SecretResolverUnavailable {
                property: (*first_property).to_string(),
            })?;

        for (property, reference) in references {
            debug!("解析密钥引用: {} -> {}/{}", property, store, reference.name);
            let value = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(MetadataError::Cancelled),
                resolved = resolver.resolve(store, reference) => resolved.map_err(|source| {
                    MetadataError::SecretResolution {
                        property: property.to_string(),
                        store: store.to_string(),
                        secret: reference.name.clone(),
                        source,
                    }
                })?,
            };
            properties.insert(property.to_string(), value.expose_secret().clone());
        }
        Ok(())
    }
}

impl fmt::Debug for MetadataResolverImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataResolverImpl")
            .field("options", &self.options)
            .field("has_secret_resolver", &self.secrets.is_some())
            .finish()
    }
}

#[async_trait]
impl MetadataResolver for MetadataResolverImpl {
    async fn to_base_metadata(
        &self,
        spec: &ComponentSpec,
        cancel: &CancellationToken,
    ) -> Result<BaseMetadata, MetadataError> {
        if cancel.is_cancelled() {
            return Err(MetadataError::Cancelled);
        }

        let mut properties = HashMap::with_capacity(spec.metadata.len());
        let mut declared = Vec::with_capacity(spec.metadata.len());
        let mut references = Vec::new();
        for item in &spec.metadata {
            match &item.value {
                MetadataValue::Value(value) => {
                    if properties.insert(item.name.clone(), value.clone()).is_none() {
                        declared.push(item.name.as_str());
                    }
                }
                MetadataValue::SecretKeyRef(reference) => {
                    references.push((item.name.as_str(), reference));
                }
            }
        }

        // 按首次声明顺序展开，错误总是指向最先声明的属性
        for property in declared {
            if let Some(value) = properties.get_mut(property) {
                *value = self.expand(property, value)?;
            }
        }

        self.resolve_secrets(spec, references, &mut properties, cancel)
            .await?;

        Ok(BaseMetadata::new(spec.name.clone(), properties))
    }
}
