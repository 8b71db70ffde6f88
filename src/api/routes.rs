//! API route definitions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::error;

use super::state::AppState;
use crate::analysis::Analysis;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/analysis", get(full_analysis))
        .route("/basic-analysis", get(basic_analysis))
        .route("/ai-analysis", get(model_analysis))
}

fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    let message = format!("{:#}", e);
    error!(error = %message, "analysis request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

fn envelope(data: Value, analysis: &Analysis) -> Json<Value> {
    Json(json!({
        "data": data,
        "meta": {
            "request_id": uuid::Uuid::new_v4(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "skipped_lines": analysis.skipped_lines,
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn run(state: &AppState) -> ApiResult<Analysis> {
    state.run_analysis().await.map_err(internal_error)
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let analysis = run(&state).await?;
    crate::report::render(&analysis, chrono::Local::now())
        .map(Html)
        .map_err(internal_error)
}

async fn full_analysis(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let analysis = run(&state).await?;
    let data = serde_json::to_value(analysis.result.report())
        .map_err(|e| internal_error(e.into()))?;
    Ok(envelope(data, &analysis))
}

async fn basic_analysis(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let analysis = run(&state).await?;
    let data = analysis.result.basic_view(&analysis.records);
    Ok(envelope(data, &analysis))
}

async fn model_analysis(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let analysis = run(&state).await?;
    let data = analysis
        .result
        .model_view(analysis.model_name, state.detection.contamination);
    Ok(envelope(data, &analysis))
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::*;
    use crate::config::DetectionConfig;
    use axum::body::Body;
    use axum::http::Request;
    use std::io::Write;
    use tower::ServiceExt; // for `oneshot`

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn state_with_log(contents: &str) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("app.log");
        let mut f = std::fs::File::create(&log).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        let state = AppState::new(log, dir.path().to_path_buf(), DetectionConfig::default());
        (dir, state)
    }

    const LOG: &str = "garbage\n\
                       2024-01-01 10:00:00 ERROR db timeout\n\
                       2024-01-01 10:00:05 ERROR db timeout\n\
                       2024-01-01 10:00:10 ERROR db timeout\n\
                       2024-01-01 10:00:15 ERROR db timeout\n\
                       2024-01-01 10:00:20 INFO request served\n";

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, state) = state_with_log("");
        let (status, json) = get_json(state, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_full_analysis() {
        let (_dir, state) = state_with_log(LOG);
        let (status, json) = get_json(state, "/api/v1/analysis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_logs"], 5);
        assert_eq!(json["data"]["level_distribution"]["ERROR"], 4);
        assert_eq!(json["data"]["anomalies"][0]["count"], 4);
        assert_eq!(json["meta"]["skipped_lines"], 1);
    }

    #[tokio::test]
    async fn test_basic_and_model_views() {
        let (_dir, state) = state_with_log(LOG);
        let (_, basic) = get_json(state.clone(), "/api/v1/basic-analysis").await;
        assert_eq!(basic["data"]["recent_logs"].as_array().unwrap().len(), 5);
        assert_eq!(basic["data"]["anomalies"][0]["time"], "2024-01-01 10:00:00");

        let (_, model) = get_json(state, "/api/v1/ai-analysis").await;
        assert_eq!(model["data"]["model_info"]["algorithm"], "Isolation Forest");
        assert_eq!(model["data"]["model_info"]["contamination"], 0.1);
    }

    #[tokio::test]
    async fn test_missing_log_file_is_500() {
        let state = AppState::new(
            "/nonexistent/app.log".into(),
            ".".into(),
            DetectionConfig::default(),
        );
        let (status, json) = get_json(state, "/api/v1/analysis").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("failed to read log file"));
    }

    #[tokio::test]
    async fn test_dashboard_renders_html() {
        let (_dir, state) = state_with_log(LOG);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Total Logs"));
    }
}
