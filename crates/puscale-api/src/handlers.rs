//! Request handlers.
//!
//! Responses are plain text: the decision summary on success, a short
//! reason on failure.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use puscale_autoscale::ScaleError;
use puscale_core::ScaleRequest;

use crate::ApiState;

fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

fn scale_error_response(err: &ScaleError) -> Response {
    let reason = match err {
        ScaleError::ReadCapacity { .. } => "Failed to get current processing units",
        ScaleError::ReadUtilization { .. } => "Failed to get utilization",
        ScaleError::ApplyCapacity { .. } => "Failed to update processing units",
    };
    text_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{reason}: {err}"))
}

// ── Scaling ────────────────────────────────────────────────────

/// POST / and POST /scale
pub async fn scale(State(state): State<ApiState>, body: Bytes) -> Response {
    let req: ScaleRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "rejected malformed request body");
            return text_response(StatusCode::BAD_REQUEST, "Invalid JSON request body.");
        }
    };

    let (resource, policy) = match req.into_policy(state.cooldown) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "rejected invalid scaling request");
            return text_response(StatusCode::BAD_REQUEST, format!("Invalid request: {e}."));
        }
    };

    info!(
        resource = %resource,
        pu_step = policy.step,
        pu_min = policy.min_units,
        pu_max = policy.max_units,
        scale_up_threshold = policy.scale_up_threshold,
        scale_down_threshold = policy.scale_down_threshold,
        cooldown_secs = policy.cooldown.as_secs(),
        "request received"
    );

    match state.autoscaler.run_once(&resource, &policy).await {
        Ok(outcome) => text_response(StatusCode::OK, outcome.decision.summary()),
        Err(e) => {
            warn!(resource = %resource, stage = e.stage(), error = %e, "scaling pass failed");
            scale_error_response(&e)
        }
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    text_response(StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use puscale_autoscale::{Autoscaler, InMemoryCooldownStore, InMemoryFleet, InjectedFailure};
    use puscale_core::ResourceId;

    async fn test_state(units: u32, utilization: Option<f64>) -> (ApiState, Arc<InMemoryFleet>) {
        let fleet = Arc::new(InMemoryFleet::new());
        fleet
            .insert(ResourceId::new("acme", "orders"), units, utilization)
            .await;
        let autoscaler =
            Autoscaler::with_backend(fleet.clone(), Arc::new(InMemoryCooldownStore::new()));
        let state = ApiState {
            autoscaler,
            cooldown: Duration::from_secs(30 * 60),
        };
        (state, fleet)
    }

    fn body(json: &str) -> Bytes {
        Bytes::from(json.to_string())
    }

    const REQUEST: &str =
        r#"{"project":"acme","instance":"orders","puStep":100,"puMin":100,"puMax":1000}"#;

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn scale_up_returns_summary() {
        let (state, fleet) = test_state(500, Some(80.0)).await;
        let resp = scale(State(state), body(REQUEST)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Scaled up to 600 PUs.");
        assert_eq!(
            fleet.units(&ResourceId::new("acme", "orders")).await,
            Some(600)
        );
    }

    #[tokio::test]
    async fn dead_zone_returns_summary() {
        let (state, _) = test_state(400, Some(40.0)).await;
        let resp = scale(State(state), body(REQUEST)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "Utilization is within the normal range.");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (state, _) = test_state(500, Some(80.0)).await;
        let resp = scale(State(state), body("{not json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "Invalid JSON request body.");
    }

    #[tokio::test]
    async fn missing_field_is_bad_request_without_side_effects() {
        let (state, fleet) = test_state(500, Some(80.0)).await;
        let resp = scale(
            State(state),
            body(r#"{"project":"acme","instance":"orders","puStep":100,"puMin":100}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(resp).await.contains("puMax"));
        assert!(fleet.writes().await.is_empty());
    }

    #[tokio::test]
    async fn read_failure_names_the_stage() {
        let (state, _) = test_state(500, None).await;
        let resp = scale(State(state), body(REQUEST)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(resp).await.starts_with("Failed to get utilization"));
    }

    #[tokio::test]
    async fn write_failure_names_the_stage() {
        let (state, fleet) = test_state(500, Some(80.0)).await;
        fleet
            .inject_failure(
                &ResourceId::new("acme", "orders"),
                Some(InjectedFailure::ApplyFailed),
            )
            .await;
        let resp = scale(State(state), body(REQUEST)).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(resp).await.starts_with("Failed to update processing units"));
    }

    #[tokio::test]
    async fn healthz_ok() {
        let resp = healthz().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
