use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::identity;
use crate::models::{Visit, VisitorAttributes};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub msg: String,
}

#[derive(Serialize)]
pub struct VisitResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub user_data: Visit,
}

#[derive(Serialize)]
pub struct VisitListResponse {
    pub success: bool,
    pub users: Vec<Visit>,
}

/// Liveness probe.
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        msg: "Server is running".to_string(),
    })
}

/// Record a visit: derive device signals and fingerprint from the request
/// and persist the assembled record.
pub async fn save_user(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(attrs): Json<VisitorAttributes>,
) -> Result<Json<VisitResponse>, (StatusCode, Json<StatusResponse>)> {
    info!(user_agent = %attrs.user_agent, ip = %attrs.user_ip, "received visitor attributes");

    let visit = identity::build_visit(&attrs, &headers, addr.ip());

    match state.storage.insert_visit(&visit).await {
        Ok(stored) => {
            info!("user saved with ID [{}]", stored.id);
            Ok(Json(VisitResponse {
                success: true,
                msg: Some("User saved successfully".to_string()),
                user_data: stored,
            }))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusResponse {
                success: false,
                msg: format!("Failed to save user: {}", e),
            }),
        )),
    }
}

/// Re-identify a visitor through the resolution cascade.
pub async fn search_user(
    State(state): State<Arc<AppState>>,
    Json(attrs): Json<VisitorAttributes>,
) -> Result<Json<VisitResponse>, (StatusCode, Json<StatusResponse>)> {
    info!(user_agent = %attrs.user_agent, ip = %attrs.user_ip, "searching for visitor");

    match identity::resolve(state.storage.as_ref(), &attrs).await {
        Some(visit) => Ok(Json(VisitResponse {
            success: true,
            msg: None,
            user_data: visit,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                success: false,
                msg: "User not found".to_string(),
            }),
        )),
    }
}

/// Every recorded visit, newest first.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VisitListResponse>, (StatusCode, Json<StatusResponse>)> {
    match state.storage.list_visits().await {
        Ok(visits) => Ok(Json(VisitListResponse {
            success: true,
            users: visits,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusResponse {
                success: false,
                msg: format!("Failed to list users: {}", e),
            }),
        )),
    }
}

/// Guard for the write/query endpoints hit with the wrong verb.
pub async fn method_not_allowed() -> (StatusCode, Json<StatusResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(StatusResponse {
            success: false,
            msg: "GET method not allowed. Use POST method instead.".to_string(),
        }),
    )
}
