//! Transport entry points: stdio for desktop clients, Streamable HTTP for
//! everything else.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anvil::McpState;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use forgeconf::ServerConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::handler::ForgeHandler;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const SESSION_MAX_IDLE: Duration = Duration::from_secs(300);

/// Serve MCP over stdin/stdout until EOF or a shutdown signal.
pub async fn run_stdio(handler: ForgeHandler) -> Result<()> {
    let state = Arc::new(McpState::new(handler));
    info!("MCP stdio transport ready");

    tokio::select! {
        result = anvil::serve_stdio(state) => {
            result.context("stdio transport failed")?;
            info!("stdin closed, exiting");
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}

#[derive(Clone)]
struct HealthState {
    mcp: Arc<McpState<ForgeHandler>>,
    start_time: Instant,
}

async fn handle_health(
    axum::extract::State(state): axum::extract::State<HealthState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "agents": state.mcp.handler.registry().len().await,
        "sessions": state.mcp.sessions.len(),
    }))
}

/// Build the HTTP app: MCP on `/`, health on `/health`.
pub fn router(state: Arc<McpState<ForgeHandler>>) -> Router {
    let health = Router::new()
        .route("/health", get(handle_health))
        .with_state(HealthState {
            mcp: Arc::clone(&state),
            start_time: Instant::now(),
        });

    anvil::streamable_router(state).merge(health)
}

/// Serve MCP over Streamable HTTP on `host:port`.
///
/// On a shutdown signal, in-flight requests get `shutdown_timeout` seconds
/// to finish before the server is abandoned.
pub async fn run_http(handler: ForgeHandler, config: &ServerConfig) -> Result<()> {
    let state = Arc::new(McpState::new(handler));

    let cancel = CancellationToken::new();
    let _cleanup = anvil::spawn_cleanup_task(
        Arc::clone(&state.sessions),
        SESSION_SWEEP_INTERVAL,
        SESSION_MAX_IDLE,
        cancel.clone(),
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("MCP (Streamable): POST http://{}/", addr);
    info!("Health: GET http://{}/health", addr);

    let server = axum::serve(listener, router(state)).with_graceful_shutdown({
        let cancel = cancel.clone();
        async move { cancel.cancelled().await }
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => {
            joined.context("HTTP server task failed")?.context("Server error")?;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    cancel.cancel();
    let drain = Duration::from_secs(config.shutdown_timeout);
    match tokio::time::timeout(drain, server).await {
        Ok(joined) => {
            joined.context("HTTP server task failed")?.context("Server error")?;
            info!("Shutdown complete");
        }
        Err(_) => {
            tracing::warn!(timeout_secs = config.shutdown_timeout, "Shutdown timed out, dropping open connections");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmGateway;
    use crate::registry::AgentRegistry;
    use crate::testing::ScriptedBackend;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_counts() {
        let registry = Arc::new(AgentRegistry::new(LlmGateway::new(Arc::new(
            ScriptedBackend::replying("p"),
        ))));
        registry.create("One", "first").await.unwrap();
        let state = Arc::new(McpState::new(ForgeHandler::new(registry)));

        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agents"], 1);
    }
}
