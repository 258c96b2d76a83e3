pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let media_root = settings.media.root.clone();
    let media_prefix = match settings.media.url_prefix.trim_end_matches('/') {
        "" => "/media".to_string(),
        prefix => prefix.to_string(),
    };

    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        // Display board live channel
        .route("/ws/display-board", get(handlers::ws::display_board))

        // Generated audio
        .nest_service(&media_prefix, ServeDir::new(media_root))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/announcements", announcement_routes(state))
        .route("/display", get(handlers::display::default_board))
        .route("/display/current", get(handlers::display::current))
        .route("/display-boards", get(handlers::display::list_boards))
        .route("/display-boards/:id", get(handlers::display::get_board))
}

fn announcement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::announcements::list))
        .route("/", post(handlers::announcements::create))
        .route("/:id", get(handlers::announcements::get))
        .route("/:id/status", get(handlers::announcements::status))
        // Admin-only operations
        .merge(Router::new()
            .route("/process-pending", post(handlers::announcements::process_pending))
            .route("/:id", delete(handlers::announcements::delete))
            .route("/:id/reprocess", post(handlers::announcements::reprocess))
            .route("/:id/resolve", post(handlers::announcements::resolve))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}
