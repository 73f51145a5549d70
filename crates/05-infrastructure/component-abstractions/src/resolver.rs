//! 元数据与密钥解析抽象接口

use async_trait::async_trait;
use infrastructure_common::{BaseMetadata, BoxError, ComponentSpec, MetadataError, SecretKeyRef};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

/// 密钥解析协作者
///
/// 可能访问远端，仅由元数据解析器调用。
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// 从指定存储解析密钥
    async fn resolve(
        &self,
        store: &str,
        reference: &SecretKeyRef,
    ) -> Result<SecretString, BoxError>;
}

/// 元数据解析器
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// 将组件声明规整为基础元数据
    ///
    /// 相同声明与相同密钥快照下输出确定。
    async fn to_base_metadata(
        &self,
        spec: &ComponentSpec,
        cancel: &CancellationToken,
    ) -> Result<BaseMetadata, MetadataError>;
}
