//! 用户文档快照
//!
//! 文档存储给出的快照是松散类型的 JSON：字段可能缺失，也可能类型不符。
//! 这里统一做防御性归一化，任何畸形输入都只会得到空值，不会报错。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 徽章标识，不假设任何内部结构
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(String);

impl BadgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BadgeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 用户文档的只读快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    fields: Map<String, Value>,
}

impl UserRecord {
    /// 由存储快照构造
    ///
    /// 快照缺失或不是 JSON 对象时视为空文档。
    pub fn from_snapshot(snapshot: Option<Value>) -> Self {
        match snapshot {
            Some(Value::Object(fields)) => Self { fields },
            _ => Self::default(),
        }
    }

    /// 读取徽章列表
    ///
    /// 字段缺失或不是数组时返回空列表。徽章标识只能是字符串，
    /// 其余类型的元素（数值、null、布尔、对象、数组）一律忽略。
    pub fn badges(&self, field: &str) -> Vec<BadgeId> {
        let Some(Value::Array(items)) = self.fields.get(field) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| item.as_str().map(BadgeId::from))
            .collect()
    }

    /// 读取推送令牌
    ///
    /// 空字符串与缺失等价。
    pub fn notification_token(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(Value::String(token)) if !token.is_empty() => Some(token.as_str()),
            _ => None,
        }
    }
}

impl From<Value> for UserRecord {
    fn from(value: Value) -> Self {
        Self::from_snapshot(Some(value))
    }
}
