use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use skillpilot::workflows::placement::{
    placement_router, MatchMailer, PlacementRepository, PlacementService,
};
use std::sync::Arc;

pub(crate) fn with_placement_routes<R, M>(service: Arc<PlacementService<R, M>>) -> axum::Router
where
    R: PlacementRepository + 'static,
    M: MatchMailer + 'static,
{
    placement_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/ranking/policy",
            axum::routing::get(ranking_policy_endpoint),
        )
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

/// Coverage rules the ranking screens enforce before submitting, and the round's deadlines.
pub(crate) async fn ranking_policy_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<serde_json::Value> {
    let ranking = state.ranking;
    Json(json!({
        "student": {
            "policy": ranking.student_policy.to_string(),
            "description": ranking.student_policy.describe(),
        },
        "opportunity": {
            "policy": ranking.opportunity_policy.to_string(),
            "description": ranking.opportunity_policy.describe(),
        },
        "deadlines": ranking.deadlines,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryMailer, InMemoryPlacementRepository};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use skillpilot::config::RankingConfig;
    use skillpilot::workflows::ranking::CoveragePolicy;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            ranking: RankingConfig {
                student_policy: CoveragePolicy::FixedCount(5),
                opportunity_policy: CoveragePolicy::FractionOfTotal(0.5),
                deadlines: None,
            },
        }
    }

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(PlacementService::new(
            Arc::new(InMemoryPlacementRepository::seeded()),
            Arc::new(InMemoryMailer::default()),
        ));
        with_placement_routes(service).layer(Extension(state(ready)))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let (status, body) = get(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "status": "initializing" }));

        let (status, _) = get(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn ranking_policy_exposes_both_screens() {
        let (status, body) = get(app(true), "/api/v1/ranking/policy").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["student"]["policy"], "fixed:5");
        assert_eq!(body["opportunity"]["policy"], "fraction:0.5");
        assert_eq!(body["deadlines"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn placement_routes_are_mounted_next_to_health() {
        let (status, body) = get(app(true), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let response = app(true)
            .oneshot(
                Request::delete("/skills/delete?skill_id=sk-rust")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
