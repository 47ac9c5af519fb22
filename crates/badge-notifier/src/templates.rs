//! 通知内容模板
//!
//! 为每个新解锁的徽章生成推送请求。标题固定，便于客户端聚合展示同类通知；
//! 正文与数据负载携带徽章标识。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::BadgeId;

pub const BADGE_UNLOCKED_TITLE: &str = "Badge Unlocked!";

/// 数据负载中徽章标识的键名
pub const BADGE_ID_KEY: &str = "badgeId";

/// 单条推送请求，仅在一次分发过程中存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// 推送通道要求数据负载为字符串键值对
    pub data: BTreeMap<String, String>,
}

impl NotificationRequest {
    /// 徽章解锁通知
    pub fn badge_unlocked(badge: &BadgeId) -> Self {
        let mut data = BTreeMap::new();
        data.insert(BADGE_ID_KEY.to_string(), badge.to_string());

        Self {
            title: BADGE_UNLOCKED_TITLE.to_string(),
            body: format!("You unlocked {badge}"),
            data,
        }
    }

    /// 数据负载中的徽章标识
    pub fn badge_id(&self) -> Option<&str> {
        self.data.get(BADGE_ID_KEY).map(String::as_str)
    }
}
