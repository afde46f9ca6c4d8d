use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers::{generate, health, model_info, root, webhook};
use crate::app::AppState;

pub fn create_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/model/info", get(model_info))
        .route("/generate", post(generate));

    if state.chat.is_some() {
        router = router.route("/webhook", post(webhook));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
