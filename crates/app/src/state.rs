//! Background workers for the session orchestrator.
//!
//! The UI thread never blocks: startup and chat requests run on worker
//! threads that own a private tokio runtime and report back over mpsc
//! channels polled each frame.

use crate::session;
use crate::types::{ReplyOutcome, StartupOutcome};
use client::AssistantClient;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// Drives the client's async startup step off the UI thread.
pub fn run_session_startup(client: Arc<dyn AssistantClient>, tx: Sender<StartupOutcome>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(StartupOutcome {
                    result: Err(format!("Failed to start async runtime: {}", e)),
                });
                return;
            }
        };
        let result = rt.block_on(client.startup()).map_err(|e| e.to_string());
        let _ = tx.send(StartupOutcome { result });
    });
}

/// Issues one chat request off the UI thread, bounded by `timeout`. The
/// outcome is always display text; error mapping happens in
/// [`session::exchange`].
pub fn run_chat_exchange(
    client: Arc<dyn AssistantClient>,
    message: String,
    timeout: Duration,
    tx: Sender<ReplyOutcome>,
) {
    std::thread::spawn(move || {
        let reply = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(session::exchange(client.as_ref(), &message, timeout)),
            Err(e) => {
                tracing::error!("failed to start async runtime: {e}");
                format!("Error: {}", e)
            }
        };
        let _ = tx.send(ReplyOutcome { reply });
    });
}
