//! API layer -- axum routes, handlers, and middleware.

mod routes;
pub mod state;

use self::state::AppState;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router: live dashboard at `/`, JSON API under
/// `/api/v1`, and the report directory served for everything else.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.report_dir.as_path());
    Router::new()
        .merge(routes::dashboard_routes())
        .nest("/api/v1", routes::api_routes())
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
