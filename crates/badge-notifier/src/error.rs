//! 通知服务错误类型
//!
//! 定义推送投递与批量分发场景的错误分类。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("推送被拒绝: 状态码={status:?}, 原因={reason}")]
    DeliveryRejected { status: Option<u16>, reason: String },

    #[error("推送请求超时")]
    Timeout,

    #[error("推送传输错误: {0}")]
    Transport(#[from] reqwest::Error),

    /// 一次调用中至少一条推送失败；不区分具体是哪些徽章
    #[error("徽章通知投递失败: 失败 {failed}/{total}, 首个错误: {first}")]
    DispatchFailed {
        failed: usize,
        total: usize,
        first: Box<NotificationError>,
    },

    #[error(transparent)]
    Shared(#[from] badge_shared::error::BadgeError),
}
