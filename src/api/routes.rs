use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::storage::Storage;

use super::handlers::{list_users, method_not_allowed, root, save_user, search_user, AppState};

pub fn create_router(storage: Arc<dyn Storage>) -> Router {
    let state = Arc::new(AppState { storage });

    Router::new()
        .route("/", get(root).post(root))
        .route("/save_user", post(save_user).get(method_not_allowed))
        .route("/search_user", post(search_user).get(method_not_allowed))
        .route("/users", get(list_users).post(list_users))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
