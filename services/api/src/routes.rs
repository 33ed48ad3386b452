use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use property_finder::workflows::deals::{
    deals_router, DealFinderService, NarrativeGenerator, PropertyProvider,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_deal_routes<P, N>(service: Arc<DealFinderService<P, N>>) -> axum::Router
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    deals_router(service)
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
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use property_finder::workflows::deals::{
        GenerationError, PropertyQuery, ProviderError, RawProperty, SalesTrend, ZipCode,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    struct EmptyProvider;

    impl PropertyProvider for EmptyProvider {
        fn fetch(&self, _query: &PropertyQuery) -> Result<Vec<RawProperty>, ProviderError> {
            Ok(Vec::new())
        }

        fn sales_trend(&self, _zip: &ZipCode) -> Result<SalesTrend, ProviderError> {
            Err(ProviderError::DataShape("unpublished".to_string()))
        }
    }

    struct SilentNarrator;

    impl NarrativeGenerator for SilentNarrator {
        fn explain(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Empty)
        }
    }

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(state: AppState) -> axum::Router {
        let service = Arc::new(DealFinderService::new(
            Arc::new(EmptyProvider),
            Arc::new(SilentNarrator),
        ));
        with_deal_routes(service).layer(Extension(state))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let state = state(false);
        let flag = state.readiness.clone();
        let router = app(state);

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        flag.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["status"], "ready");
    }

    #[tokio::test]
    async fn deal_routes_are_mounted_alongside_operational_ones() {
        let response = app(state(true))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/deals")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{ "zip_code": "02108" }"#))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["query"], "ZIP 02108");
        assert_eq!(payload["picks"], json!([]));
    }
}
