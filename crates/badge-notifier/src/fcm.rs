//! Firebase Cloud Messaging 发送器
//!
//! 调用 FCM HTTP v1 接口 `POST /v1/projects/{project}/messages:send`。
//! 访问令牌由外部签发后通过配置注入，这里只负责携带。

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use badge_shared::config::PushConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::NotificationError;
use crate::sender::{PushSender, SendReceipt};
use crate::templates::NotificationRequest;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: Message<'a>,
}

#[derive(Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: Notification<'a>,
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct Notification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// FCM HTTP v1 发送器
pub struct FcmSender {
    client: reqwest::Client,
    send_url: String,
    access_token: String,
}

impl FcmSender {
    pub fn new(config: &PushConfig) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                config.endpoint.trim_end_matches('/'),
                config.project_id
            ),
            access_token: config.access_token.clone(),
        })
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl PushSender for FcmSender {
    async fn send(
        &self,
        token: &str,
        request: &NotificationRequest,
    ) -> Result<SendReceipt, NotificationError> {
        let body = SendMessageRequest {
            message: Message {
                token,
                notification: Notification {
                    title: &request.title,
                    body: &request.body,
                },
                data: &request.data,
            },
        };

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "读取 FCM 错误响应体失败");
                    String::new()
                }
            };
            let reason = rejection_reason(status, &text);
            warn!(status = status.as_u16(), reason = %reason, "FCM 拒绝推送请求");
            return Err(NotificationError::DeliveryRejected {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let parsed: SendMessageResponse = response.json().await.map_err(map_transport_error)?;
        debug!(message_id = %parsed.name, "FCM 已接受推送请求");

        Ok(SendReceipt {
            message_id: parsed.name,
        })
    }

    fn provider(&self) -> &'static str {
        "fcm"
    }
}

fn map_transport_error(err: reqwest::Error) -> NotificationError {
    if err.is_timeout() {
        NotificationError::Timeout
    } else {
        NotificationError::Transport(err)
    }
}

/// 从错误响应体提取可读原因，无法解析时保留原文，响应体为空时使用状态码描述
fn rejection_reason(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status.canonical_reason().unwrap_or("unknown").to_string();
    }

    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => match (error.status, error.message) {
            (Some(status), Some(message)) => format!("{status}: {message}"),
            (Some(status), None) => status,
            (None, Some(message)) => message,
            (None, None) => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BadgeId;

    fn push_config(endpoint: &str) -> PushConfig {
        PushConfig {
            endpoint: endpoint.to_string(),
            project_id: "demo-project".to_string(),
            access_token: "ya29.test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_send_url() {
        let sender = FcmSender::new(&push_config("https://fcm.googleapis.com/")).unwrap();
        assert_eq!(
            sender.send_url(),
            "https://fcm.googleapis.com/v1/projects/demo-project/messages:send"
        );
        assert_eq!(sender.provider(), "fcm");
    }

    #[test]
    fn test_request_body_shape() {
        let request = NotificationRequest::badge_unlocked(&BadgeId::from("b7"));
        let body = SendMessageRequest {
            message: Message {
                token: "device-1",
                notification: Notification {
                    title: &request.title,
                    body: &request.body,
                },
                data: &request.data,
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "message": {
                    "token": "device-1",
                    "notification": {
                        "title": "Badge Unlocked!",
                        "body": "You unlocked b7"
                    },
                    "data": { "badgeId": "b7" }
                }
            })
        );
    }

    #[test]
    fn test_rejection_reason() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            rejection_reason(StatusCode::NOT_FOUND, body),
            "NOT_FOUND: Requested entity was not found."
        );
        assert_eq!(
            rejection_reason(StatusCode::BAD_GATEWAY, "upstream broke"),
            "upstream broke"
        );
        assert_eq!(
            rejection_reason(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":{"status":"INTERNAL"}}"#),
            "INTERNAL"
        );
    }

    #[test]
    fn test_empty_rejection_body_uses_status_text() {
        assert_eq!(
            rejection_reason(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
        assert_eq!(
            rejection_reason(StatusCode::INTERNAL_SERVER_ERROR, "  \n"),
            "Internal Server Error"
        );
        assert_eq!(rejection_reason(StatusCode::from_u16(599).unwrap(), ""), "unknown");
    }
}
