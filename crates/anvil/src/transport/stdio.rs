//! Stdio Transport
//!
//! One JSON-RPC message per line. Every request is dispatched on its own
//! task so a slow tool call does not block `ping` or cancellation; replies
//! funnel through a single writer task so lines never interleave.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::McpState;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::{JsonRpcMessage, JsonRpcReply, RequestId};
use crate::types::protocol::CancelledParams;
use crate::Handler;

/// Session id used for the single stdio peer.
const STDIO_SESSION: &str = "stdio";

/// Buffered replies waiting for the writer.
const REPLY_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("stdio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("reply serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Pending requests by id. The slot number tells a finishing task whether
/// the entry is still its own.
type InFlight = Arc<DashMap<RequestId, (u64, CancellationToken)>>;

/// Serve MCP over the process's stdin/stdout until EOF.
pub async fn serve_stdio<H: Handler>(state: Arc<McpState<H>>) -> Result<(), TransportError> {
    serve_io(state, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve MCP over an arbitrary reader/writer pair until the reader hits EOF.
///
/// In-flight requests are allowed to finish after EOF before this returns.
pub async fn serve_io<H, R, W>(
    state: Arc<McpState<H>>,
    reader: R,
    writer: W,
) -> Result<(), TransportError>
where
    H: Handler,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let session_id: Arc<str> = state.sessions.get_or_create(Some(STDIO_SESSION)).into();
    let (tx, rx) = mpsc::channel::<JsonRpcReply>(REPLY_QUEUE);
    let writer_task = tokio::spawn(write_replies(writer, rx));

    let in_flight: InFlight = Arc::new(DashMap::new());
    let mut tasks = JoinSet::new();
    let mut next_slot: u64 = 0;
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable stdio line");
                let reply = JsonRpcReply::error(
                    Value::Null,
                    ErrorData::parse_error(format!("Invalid JSON: {}", e)),
                );
                let _ = tx.send(reply).await;
                continue;
            }
        };

        // Replies from the client to server-initiated requests; we never send any.
        if raw.get("method").is_none() && (raw.get("result").is_some() || raw.get("error").is_some()) {
            tracing::debug!("Ignoring client response on stdio");
            continue;
        }

        let raw_id = raw.get("id").cloned().unwrap_or(Value::Null);
        let message: JsonRpcMessage = match serde_json::from_value(raw) {
            Ok(message) => message,
            Err(e) => {
                let reply = JsonRpcReply::error(
                    raw_id,
                    ErrorData::invalid_request(format!("Invalid JSON-RPC: {}", e)),
                );
                let _ = tx.send(reply).await;
                continue;
            }
        };

        let Some(request_id) = message.id.clone() else {
            handle_notification(&message, &in_flight);
            continue;
        };

        let token = CancellationToken::new();
        let slot = next_slot;
        next_slot += 1;
        let accepted = match in_flight.entry(request_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert((slot, token.clone()));
                true
            }
        };
        if !accepted {
            tracing::warn!(request_id = %request_id, "Request id already in flight");
            let error = ErrorData::invalid_request(format!("Request id {} is already in flight", request_id));
            let _ = tx.send(JsonRpcReply::from_result(&request_id, Err(error))).await;
            continue;
        }

        let state = Arc::clone(&state);
        let session_id = Arc::clone(&session_id);
        let tx = tx.clone();
        let in_flight = Arc::clone(&in_flight);

        tasks.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(request_id = %request_id, "Request cancelled by client");
                }
                result = crate::protocol::dispatch(&state, &session_id, &message) => {
                    let _ = tx.send(JsonRpcReply::from_result(&request_id, result)).await;
                }
            }
            in_flight.remove_if(&request_id, |_, (owner, _)| *owner == slot);
        });

        // Reap finished tasks so the set does not grow for long sessions.
        while let Some(joined) = tasks.try_join_next() {
            joined?;
        }
    }

    tracing::info!(pending = tasks.len(), "stdin closed, draining in-flight requests");
    while let Some(joined) = tasks.join_next().await {
        joined?;
    }

    drop(tx);
    writer_task.await??;
    Ok(())
}

fn handle_notification(message: &JsonRpcMessage, in_flight: &InFlight) {
    match message.method.as_str() {
        "notifications/initialized" => {
            tracing::info!("Client initialized notification received");
        }
        "notifications/cancelled" => match message.parse_params::<CancelledParams>("cancelled") {
            Ok(params) => {
                if let Some((_, (_, token))) = in_flight.remove(&params.request_id) {
                    tracing::debug!(
                        request_id = %params.request_id,
                        reason = params.reason.as_deref().unwrap_or(""),
                        "Cancelling in-flight request"
                    );
                    token.cancel();
                }
            }
            Err(e) => tracing::warn!(error = %e, "Malformed cancellation notification"),
        },
        other => {
            tracing::debug!(method = %other, "Unknown notification received");
        }
    }
}

async fn write_replies<W>(mut writer: W, mut rx: mpsc::Receiver<JsonRpcReply>) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = rx.recv().await {
        let mut line = serde_json::to_vec(&reply)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
