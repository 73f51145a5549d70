//! 驱动抽象接口
//!
//! 驱动由工厂创建、经初始化后交由组件存储持有。种类相关的业务操作
//! 不在运行时的职责范围内，能力 trait 只约束类型。

use async_trait::async_trait;
use infrastructure_common::{BaseMetadata, DriverError, SecretKeyRef};
use secrecy::SecretString;
use std::any::Any;
use tokio_util::sync::CancellationToken;

/// 后端驱动 trait
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// 使用解析后的元数据初始化驱动
    ///
    /// 实现应在阻塞的网络操作中关注 `cancel`。
    async fn init(
        &mut self,
        cancel: &CancellationToken,
        metadata: BaseMetadata,
    ) -> Result<(), DriverError>;

    /// 释放驱动持有的资源
    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }

    /// 转换为 Any，用于按具体类型访问驱动
    fn as_any(&self) -> &dyn Any;
}

/// 分布式锁
pub trait LockStore: Driver {}

/// 状态存储
pub trait StateStore: Driver {}

/// 发布订阅
pub trait PubSub: Driver {}

/// 输入输出绑定
pub trait Binding: Driver {}

/// 配置存储
pub trait ConfigurationStore: Driver {}

/// 密钥存储
///
/// 元数据解析器通过已注册的密钥存储解析其他组件的密钥引用。
#[async_trait]
pub trait SecretStore: Driver {
    /// 读取密钥，不存在时返回 `None`
    async fn get_secret(
        &self,
        reference: &SecretKeyRef,
    ) -> Result<Option<SecretString>, DriverError>;
}
