//! puscale-api — HTTP surface for the autoscaler.
//!
//! Accepts a JSON scaling request, runs one scaling pass, and answers
//! with a plain-text summary of the decision.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/` | Run a scaling pass |
//! | POST | `/scale` | Same as `/` |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use puscale_autoscale::Autoscaler;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub autoscaler: Autoscaler,
    /// Scale-down cooldown applied to every request's policy.
    pub cooldown: Duration,
}

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", post(handlers::scale))
        .route("/scale", post(handlers::scale))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
