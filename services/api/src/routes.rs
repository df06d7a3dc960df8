use crate::infra::AppState;
use availability_intake::intake::{
    intake_router, AvailabilityGateway, IntakeSessionService, SessionStore,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_intake_routes<S, G>(service: Arc<IntakeSessionService<S, G>>) -> axum::Router
where
    S: SessionStore + 'static,
    G: AvailabilityGateway + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_gateway, InMemorySessionStore};
    use availability_intake::config::IntakeConfig;
    use availability_intake::intake::{CheckerConfig, SimulatedPolicy};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app(ready: bool) -> (axum::Router, InMemorySessionStore) {
        let store = InMemorySessionStore::default();
        let gateway = build_gateway(&IntakeConfig {
            checker: CheckerConfig::default(),
            gateway_latency: Duration::ZERO,
            gateway_policy: SimulatedPolicy::AlwaysEligible,
            ..IntakeConfig::default()
        });
        let service = Arc::new(IntakeSessionService::new(
            Arc::new(store.clone()),
            Arc::new(gateway),
            CheckerConfig::default(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let app = with_intake_routes(service).layer(Extension(state));
        (app, store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app(true);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let (app, _) = test_app(false);
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn sessions_are_served_alongside_health_routes() {
        let (app, store) = test_app(true);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/intake/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["state"], "initial");
        assert_eq!(body["expanded"], false);
        assert_eq!(store.len(), 1);
    }
}
