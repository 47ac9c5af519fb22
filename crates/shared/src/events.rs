//! 触发事件模型
//!
//! 定义用户文档变更事件的统一信封格式。文档存储在记录更新时
//! 投递变更前后两份快照，快照保持原始 JSON 形态，字段是否存在、
//! 类型是否正确均由消费方自行归一化。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户文档变更事件
///
/// `before` / `after` 为 `None` 表示对应时刻文档不存在或无数据，
/// 消费方应视为空文档而非错误。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChangeEvent {
    /// 事件唯一标识（UUID v7），仅用于日志关联
    pub event_id: String,
    /// 被更新文档的用户 ID
    pub user_id: String,
    /// 更新前快照
    pub before: Option<serde_json::Value>,
    /// 更新后快照
    pub after: Option<serde_json::Value>,
    /// 事件接收时间
    pub received_at: DateTime<Utc>,
}

impl UserChangeEvent {
    /// 构建新事件，自动生成 UUID v7 作为 event_id 并记录当前时间
    pub fn new(
        user_id: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            before,
            after,
            received_at: Utc::now(),
        }
    }

    /// 沿用上游给出的事件 ID（如存在）
    pub fn with_event_id(mut self, event_id: Option<String>) -> Self {
        if let Some(id) = event_id.filter(|id| !id.is_empty()) {
            self.event_id = id;
        }
        self
    }
}
