//! 徽章解锁通知服务
//!
//! 用户文档更新时比较前后快照中的徽章列表，
//! 为每个新增徽章向用户设备发送一条推送通知。
//! 各条推送并行发送，单条失败不影响其他推送的投递。

pub mod error;
pub mod fcm;
pub mod reactor;
pub mod record;
pub mod routes;
pub mod sender;
pub mod templates;

use std::sync::Arc;

use badge_shared::config::{AppConfig, PushProvider};

use crate::error::NotificationError;
use crate::fcm::FcmSender;
use crate::reactor::BadgeChangeReactor;
use crate::sender::{LogOnlySender, PushSender};

/// 按配置构造推送发送器
pub fn build_sender(config: &AppConfig) -> Result<Arc<dyn PushSender>, NotificationError> {
    config.validate()?;

    let sender: Arc<dyn PushSender> = match config.push.provider {
        PushProvider::Fcm => Arc::new(FcmSender::new(&config.push)?),
        PushProvider::Log => Arc::new(LogOnlySender),
    };
    Ok(sender)
}

/// 按配置构造响应器
pub fn build_reactor(config: &AppConfig) -> Result<BadgeChangeReactor, NotificationError> {
    let sender = build_sender(config)?;
    Ok(BadgeChangeReactor::new(sender).with_fields(config.trigger.clone()))
}
