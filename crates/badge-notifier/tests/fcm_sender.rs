//! FCM 发送器集成测试
//!
//! 在本地端口启动一个模拟 FCM HTTP v1 的 axum 服务，
//! 验证请求格式、鉴权头与错误映射。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use badge_notifier::error::NotificationError;
use badge_notifier::fcm::FcmSender;
use badge_notifier::record::BadgeId;
use badge_notifier::sender::PushSender;
use badge_notifier::templates::NotificationRequest;
use badge_shared::config::{PushConfig, PushProvider};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct StubState {
    received: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

/// 模拟 FCM：token 为 "unregistered" 时返回 404，为 "crash" 时返回空响应体的 500，
/// 为 "slow" 时延迟响应
async fn send_message(
    State(state): State<StubState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state
        .received
        .lock()
        .await
        .push((project.clone(), auth, body.clone()));

    match body["message"]["token"].as_str() {
        Some("unregistered") => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND"
                }
            })),
        )
            .into_response(),
        Some("crash") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("slow") => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, Json(json!({ "name": "late" }))).into_response()
        }
        _ => (
            StatusCode::OK,
            Json(json!({ "name": format!("projects/{project}/messages/0:1500415314455276%31bd1c9631bd1c96") })),
        )
            .into_response(),
    }
}

async fn start_stub() -> (String, StubState) {
    let state = StubState::default();
    // 路径形如 /v1/projects/demo/messages:send，项目段后缀固定
    let app = Router::new()
        .route("/v1/projects/{project}/messages:send", post(send_message))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn push_config(endpoint: &str, timeout_seconds: u64) -> PushConfig {
    PushConfig {
        provider: PushProvider::Fcm,
        endpoint: endpoint.to_string(),
        project_id: "demo".to_string(),
        access_token: "ya29.test-token".to_string(),
        timeout_seconds,
    }
}

fn request(badge: &str) -> NotificationRequest {
    NotificationRequest::badge_unlocked(&BadgeId::from(badge))
}

#[tokio::test]
async fn test_send_success() {
    let (endpoint, state) = start_stub().await;
    let sender = FcmSender::new(&push_config(&endpoint, 5)).unwrap();

    let receipt = sender.send("device-1", &request("gold")).await.unwrap();
    assert!(receipt.message_id.starts_with("projects/demo/messages/"));

    let received = state.received.lock().await;
    assert_eq!(received.len(), 1);
    let (project, auth, body) = &received[0];
    assert_eq!(project, "demo");
    assert_eq!(auth.as_deref(), Some("Bearer ya29.test-token"));
    assert_eq!(
        body,
        &json!({
            "message": {
                "token": "device-1",
                "notification": {
                    "title": "Badge Unlocked!",
                    "body": "You unlocked gold"
                },
                "data": { "badgeId": "gold" }
            }
        })
    );
}

#[tokio::test]
async fn test_send_rejected() {
    let (endpoint, _state) = start_stub().await;
    let sender = FcmSender::new(&push_config(&endpoint, 5)).unwrap();

    let err = sender
        .send("unregistered", &request("gold"))
        .await
        .unwrap_err();

    match err {
        NotificationError::DeliveryRejected { status, reason } => {
            assert_eq!(status, Some(404));
            assert_eq!(reason, "NOT_FOUND: Requested entity was not found.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_send_rejected_empty_body() {
    let (endpoint, _state) = start_stub().await;
    let sender = FcmSender::new(&push_config(&endpoint, 5)).unwrap();

    let err = sender.send("crash", &request("gold")).await.unwrap_err();

    match err {
        NotificationError::DeliveryRejected { status, reason } => {
            assert_eq!(status, Some(500));
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_send_timeout() {
    let (endpoint, _state) = start_stub().await;
    let sender = FcmSender::new(&push_config(&endpoint, 1)).unwrap();

    let err = sender.send("slow", &request("gold")).await.unwrap_err();
    assert!(matches!(err, NotificationError::Timeout));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // 绑定后立即释放端口，确保无人监听
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sender = FcmSender::new(&push_config(&format!("http://{addr}"), 2)).unwrap();
    let err = sender.send("device-1", &request("gold")).await.unwrap_err();
    assert!(matches!(err, NotificationError::Transport(_)));
}
