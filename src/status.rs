//! Liveness endpoints for the hosting platform's health checks.
//!
//! `GET /` and `GET /health` report a small JSON status document; `GET /ping`
//! answers with a fixed string.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serenity::cache::Cache;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state for the status routes.
#[derive(Clone)]
pub struct StatusState {
    pub cache: Arc<Cache>,
    pub started_at: Instant,
}

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
    uptime_secs: u64,
    guilds: usize,
    memory_rss_kb: u64,
}

async fn health(State(state): State<StatusState>) -> Json<StatusBody> {
    Json(StatusBody {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        guilds: state.cache.guilds().len(),
        memory_rss_kb: rss_kb().unwrap_or(0),
    })
}

async fn ping() -> &'static str {
    "Pong!"
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/ping", get(ping))
        .with_state(state)
}

/// Bind and serve the status routes until the process exits.
pub async fn serve(state: StatusState, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("status server listening on port {}", port);
    axum::serve(listener, router(state)).await
}

/// Resident set size of this process in kB, read from /proc. Returns None on
/// platforms without procfs.
fn rss_kb() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    parse_statm(&statm)
}

/// Second field of /proc/self/statm is the RSS in pages; pages are 4 kB on
/// the targets this runs on.
fn parse_statm(statm: &str) -> Option<u64> {
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * 4)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_statm_rss_field() {
        assert_eq!(parse_statm("12345 678 90 1 0 2 0"), Some(678 * 4));
    }

    #[test]
    fn rejects_malformed_statm() {
        assert_eq!(parse_statm(""), None);
        assert_eq!(parse_statm("only-one-field"), None);
        assert_eq!(parse_statm("1 not-a-number"), None);
    }
}
