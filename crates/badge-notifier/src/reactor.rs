//! 徽章变更响应器
//!
//! 用户文档更新时，比较更新前后两份快照中的徽章列表，
//! 为每个新增徽章向用户设备并行发送一条推送通知。
//!
//! 处理流程：归一化快照 → 求差集 → 无新增则结束 → 无令牌则跳过
//! → 逐个构造推送请求 → 并行提交 → 等待全部完成 → 汇总结果。
//!
//! 响应器本身无状态，不在调用之间保留任何数据。同一用户文档被快速连续
//! 更新时，两次调用可能基于重叠的快照计算出相同的新增徽章，
//! 这是基于快照差集的固有限制，这里不做去重。

use std::collections::HashSet;
use std::sync::Arc;

use badge_shared::config::TriggerConfig;
use badge_shared::events::UserChangeEvent;
use badge_shared::observability::metrics;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::error::NotificationError;
use crate::record::{BadgeId, UserRecord};
use crate::sender::PushSender;
use crate::templates::NotificationRequest;

/// 分发成功路径上的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 没有新增徽章，未尝试任何投递
    NoNewBadges,
    /// 用户没有推送令牌，未尝试任何投递
    SkippedNoToken,
    /// 全部投递成功
    Delivered { count: usize },
}

/// 一次变更调用的最终结果
///
/// 所有情况都在调用内部处理完毕，不会以错误形式向宿主传播。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    NoNewBadges,
    SkippedNoToken,
    Delivered {
        count: usize,
    },
    DeliveryFailed {
        failed: usize,
        total: usize,
        error: String,
    },
}

impl InvocationOutcome {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoNewBadges => "no_new_badges",
            Self::SkippedNoToken => "skipped_no_token",
            Self::Delivered { .. } => "delivered",
            Self::DeliveryFailed { .. } => "delivery_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::DeliveryFailed { .. })
    }
}

impl From<DispatchOutcome> for InvocationOutcome {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::NoNewBadges => Self::NoNewBadges,
            DispatchOutcome::SkippedNoToken => Self::SkippedNoToken,
            DispatchOutcome::Delivered { count } => Self::Delivered { count },
        }
    }
}

/// 计算新增徽章：出现在 `after` 而不在 `before` 中的标识
///
/// 结果按在 `after` 中首次出现的顺序排列，每个标识只出现一次。
pub fn new_badges(before: &[BadgeId], after: &[BadgeId]) -> Vec<BadgeId> {
    let known: HashSet<&BadgeId> = before.iter().collect();
    let mut seen: HashSet<&BadgeId> = HashSet::new();

    after
        .iter()
        .filter(|badge| !known.contains(*badge) && seen.insert(*badge))
        .cloned()
        .collect()
}

/// 徽章变更响应器
///
/// 推送发送器由调用方构造后注入。
#[derive(Clone)]
pub struct BadgeChangeReactor {
    sender: Arc<dyn PushSender>,
    fields: TriggerConfig,
}

impl BadgeChangeReactor {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self {
            sender,
            fields: TriggerConfig::default(),
        }
    }

    /// 指定文档中徽章列表与推送令牌的字段名
    pub fn with_fields(mut self, fields: TriggerConfig) -> Self {
        self.fields = fields;
        self
    }

    /// 比较两份快照，返回新增徽章
    ///
    /// 纯函数：缺失或畸形的徽章字段按空集合处理，不会失败。
    pub fn compute_new_badges(&self, before: &UserRecord, after: &UserRecord) -> Vec<BadgeId> {
        new_badges(
            &before.badges(&self.fields.badges_field),
            &after.badges(&self.fields.badges_field),
        )
    }

    /// 为新增徽章发送推送通知
    ///
    /// 所有推送请求同时发出，等待全部完成后汇总。任一请求失败时返回
    /// `DispatchFailed`，其余请求不回滚、不重试。
    pub async fn dispatch(
        &self,
        record: &UserRecord,
        new_badges: &[BadgeId],
    ) -> Result<DispatchOutcome, NotificationError> {
        if new_badges.is_empty() {
            debug!("没有新增徽章");
            return Ok(DispatchOutcome::NoNewBadges);
        }

        let Some(token) = record.notification_token(&self.fields.token_field) else {
            info!(
                new_badges = new_badges.len(),
                token_field = %self.fields.token_field,
                "用户没有推送令牌，跳过通知"
            );
            return Ok(DispatchOutcome::SkippedNoToken);
        };

        let sender = &self.sender;
        let sends: Vec<_> = new_badges
            .iter()
            .map(|badge| {
                let request = NotificationRequest::badge_unlocked(badge);
                async move { sender.send(token, &request).await }
            })
            .collect();

        let results = join_all(sends).await;

        let total = results.len();
        let mut failed = 0;
        let mut first_error = None;
        for (badge, result) in new_badges.iter().zip(results) {
            match result {
                Ok(receipt) => {
                    debug!(badge_id = %badge, message_id = %receipt.message_id, "徽章通知已投递");
                }
                Err(e) => {
                    failed += 1;
                    warn!(badge_id = %badge, error = %e, "徽章通知投递失败");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        metrics::record_deliveries(self.sender.provider(), total - failed, failed);

        if let Some(first) = first_error {
            return Err(NotificationError::DispatchFailed {
                failed,
                total,
                first: Box::new(first),
            });
        }

        info!(count = total, "徽章通知发送完成");
        Ok(DispatchOutcome::Delivered { count: total })
    }

    /// 处理一次用户文档变更
    ///
    /// 宿主触发机制的入口。投递失败在此记录并转换为结果值，不向外传播。
    #[instrument(
        skip(self, event),
        fields(user_id = %event.user_id, event_id = %event.event_id)
    )]
    pub async fn handle_change(&self, event: UserChangeEvent) -> InvocationOutcome {
        let before = UserRecord::from_snapshot(event.before);
        let after = UserRecord::from_snapshot(event.after);

        let new_badges = self.compute_new_badges(&before, &after);

        let outcome = match self.dispatch(&after, &new_badges).await {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                error!(error = %e, "发送徽章通知失败");
                let (failed, total) = match &e {
                    NotificationError::DispatchFailed { failed, total, .. } => (*failed, *total),
                    _ => (new_badges.len(), new_badges.len()),
                };
                InvocationOutcome::DeliveryFailed {
                    failed,
                    total,
                    error: e.to_string(),
                }
            }
        };

        metrics::record_invocation(outcome.label());
        outcome
    }
}
