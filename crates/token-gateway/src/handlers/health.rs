//! Liveness check.
//!
//! The gateway holds no connections of its own, so liveness does not depend
//! on the upstream media server being reachable.

/// Handler for GET /health
#[tracing::instrument(name = "tg.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
