//! HTTP router for the pipeline boundary.
//!
//! Returns a composable `Router` so it can be mounted on any axum server.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the router: health probe plus the decision ingestion endpoint.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/decision", post(endpoints::decision::decide))
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::engine::EngineState;
    use crate::pipeline::inference::artifact::test_support::stump_artifact;
    use crate::pipeline::orchestrator::OrchestratorConfig;
    use crate::trigger::LogAlertTrigger;

    fn test_router(dir: &tempfile::TempDir) -> Router {
        let artifact = stump_artifact(
            100.0,
            vec![0.1, 0.82, 0.05, 0.03],
            vec![0.05, 0.05, 0.2, 0.7],
        );
        let path = dir.path().join("model.json");
        artifact.save(&path).unwrap();

        let engine = EngineState::load(&path, OrchestratorConfig::default()).unwrap();
        api_router(ApiContext::new(Arc::new(engine), Arc::new(LogAlertTrigger)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_loaded_engine() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["modelLoaded"], true);
        assert_eq!(json["modelVersion"], "stump-test");
    }

    #[tokio::test]
    async fn decision_endpoint_returns_the_event() {
        let dir = tempfile::tempdir().unwrap();
        let record = serde_json::json!({
            "id": "P1",
            "vitalSigns": { "heartRate": 78 }
        });

        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/decision")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(record.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["patientId"], "P1");
        assert_eq!(json["recommendedAction"], "monitor");
        assert_eq!(json["retrievalDegraded"], false);
    }

    #[tokio::test]
    async fn invalid_record_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let record = serde_json::json!({ "id": "P1" });

        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/decision")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(record.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_RECORD");
    }
}
