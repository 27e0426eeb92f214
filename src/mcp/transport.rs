//! Newline-delimited JSON-RPC transport (stdio).
//!
//! Requests are handled on their own tasks so a slow tool call does not
//! hold up `tools/list`. All output goes through one writer task.

use crate::mcp::protocol::{JsonRpcNotification, TOOLS_LIST_CHANGED};
use crate::mcp::server::McpServer;
use crate::registry::RegistryEvent;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Serve MCP on the process's stdin/stdout.
pub async fn serve_stdio(server: Arc<McpServer>, cancel: CancellationToken) -> Result<()> {
    serve(server, tokio::io::stdin(), tokio::io::stdout(), cancel).await
}

/// Serve MCP until the input closes or `cancel` fires.
pub async fn serve<R, W>(
    server: Arc<McpServer>,
    reader: R,
    writer: W,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(64);
    let writer_task = tokio::spawn(write_lines(writer, rx));
    let notifier = tokio::spawn(forward_notifications(server.registry().subscribe(), tx.clone()));

    info!("MCP server listening on stdio");
    let mut lines = BufReader::new(reader).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read MCP input")? else {
                    debug!("MCP input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let server = server.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = server.handle_line(&line).await {
                        let _ = tx.send(response).await;
                    }
                });
            }
            _ = cancel.cancelled() => {
                debug!("MCP transport cancelled");
                break;
            }
        }
    }

    notifier.abort();
    drop(tx);
    // Ends once in-flight requests have written their responses.
    writer_task.await.context("MCP writer task failed")??;
    Ok(())
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::Receiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn forward_notifications(
    mut events: broadcast::Receiver<RegistryEvent>,
    tx: mpsc::Sender<String>,
) {
    let notification = match serde_json::to_string(&JsonRpcNotification::new(TOOLS_LIST_CHANGED)) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize tools/list_changed: {}", e);
            return;
        }
    };

    loop {
        match events.recv().await {
            // Lagging only means several changes collapsed into one notification.
            Ok(RegistryEvent::ToolListChanged) | Err(broadcast::error::RecvError::Lagged(_)) => {
                if tx.send(notification.clone()).await.is_err() {
                    return;
                }
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
