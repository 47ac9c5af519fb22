//! 测试工具模块
//!
//! 提供单元测试与集成测试共用的快照构造器和测试数据生成器。

use serde_json::{Value, json};
use uuid::Uuid;

use crate::events::UserChangeEvent;

/// 生成唯一的测试用户 ID
pub fn test_user_id() -> String {
    format!("test-user-{}", Uuid::new_v4())
}

/// 构造用户文档快照
///
/// `token` 为 `None` 时不写入令牌字段，模拟尚未注册设备的用户。
pub fn user_snapshot(badges: &[&str], token: Option<&str>) -> Value {
    let mut doc = json!({ "badges": badges });
    if let Some(token) = token {
        doc["notificationToken"] = json!(token);
    }
    doc
}

/// 构造没有 badges 字段的用户文档快照
pub fn snapshot_without_badges(token: Option<&str>) -> Value {
    match token {
        Some(token) => json!({ "notificationToken": token }),
        None => json!({}),
    }
}

/// 构造完整的变更事件
pub fn change_event(user_id: &str, before: Value, after: Value) -> UserChangeEvent {
    UserChangeEvent::new(user_id, Some(before), Some(after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_user_ids() {
        assert_ne!(test_user_id(), test_user_id());
    }

    #[test]
    fn test_user_snapshot_shape() {
        let doc = user_snapshot(&["a", "b"], Some("tok"));
        assert_eq!(doc["badges"], json!(["a", "b"]));
        assert_eq!(doc["notificationToken"], "tok");

        let doc = user_snapshot(&[], None);
        assert!(doc.get("notificationToken").is_none());
    }

    #[test]
    fn test_snapshot_without_badges() {
        assert!(snapshot_without_badges(None).get("badges").is_none());
        assert_eq!(snapshot_without_badges(Some("t"))["notificationToken"], "t");
    }
}
