//! 触发入口
//!
//! 文档存储的变更触发机制通过 HTTP 投递更新前后快照，
//! 每个请求对应一次独立的响应器调用。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use badge_shared::events::UserChangeEvent;
use badge_shared::observability::middleware as obs_middleware;
use serde::Deserialize;
use tower_http::timeout::TimeoutLayer;

use crate::reactor::{BadgeChangeReactor, InvocationOutcome};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub reactor: Arc<BadgeChangeReactor>,
}

impl AppState {
    pub fn new(reactor: BadgeChangeReactor) -> Self {
        Self {
            reactor: Arc::new(reactor),
        }
    }
}

/// 变更投递请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
    #[serde(default)]
    pub event_id: Option<String>,
}

/// 构建路由
///
/// `request_timeout` 为宿主施加的单次调用时限，超时的请求返回 408。
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/triggers/users/{user_id}", post(user_updated))
        .route("/health", get(health_check))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

/// 用户文档更新
async fn user_updated(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ChangeRequest>,
) -> (StatusCode, Json<InvocationOutcome>) {
    let event = UserChangeEvent::new(user_id, request.before, request.after)
        .with_event_id(request.event_id);

    let outcome = state.reactor.handle_change(event).await;
    let status = if outcome.is_failure() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };

    (status, Json(outcome))
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "badge-notifier"
    }))
}
