//! 推送发送器
//!
//! 通过 `PushSender` trait 抽象推送投递能力，由调用方构造后注入分发器，
//! 不依赖任何进程级单例。`LogOnlySender` 仅记录日志，便于在没有推送凭证的
//! 环境下验证整条处理链路；FCM 实现见 `fcm` 模块。

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::NotificationError;
use crate::templates::NotificationRequest;

/// 推送回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// 推送通道返回的消息标识，用于追踪投递状态
    pub message_id: String,
}

/// 推送发送器 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    /// 将通知投递到 `token` 指向的设备
    async fn send(
        &self,
        token: &str,
        request: &NotificationRequest,
    ) -> Result<SendReceipt, NotificationError>;

    /// 通道名称，用于日志与指标标签
    fn provider(&self) -> &'static str;
}

/// 模拟推送发送器
pub struct LogOnlySender;

#[async_trait]
impl PushSender for LogOnlySender {
    async fn send(
        &self,
        token: &str,
        request: &NotificationRequest,
    ) -> Result<SendReceipt, NotificationError> {
        let message_id = Uuid::now_v7().to_string();

        info!(
            provider = "log",
            message_id = %message_id,
            token = %token,
            title = %request.title,
            body = %request.body,
            badge_id = ?request.badge_id(),
            "模拟发送推送通知"
        );

        Ok(SendReceipt { message_id })
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}
