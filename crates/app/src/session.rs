//! Session lifecycle and request/response orchestration.
//!
//! The orchestrator owns the single assistant-client handle and the
//! conversation log. Its lifecycle is an explicit tagged state, never a
//! nullable field, and the busy flag is the mutual-exclusion guard that
//! keeps at most one chat exchange in flight, independent of any widget
//! enablement derived from it.

use crate::selector::TargetSelection;
use client::AssistantClient;
use shared::settings::ProviderConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on one "submit message, await answer" exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const NOT_READY_MESSAGE: &str = "Please select a file or directory and run Mentat first.";
pub const NO_TARGET_MESSAGE: &str = "No target file or directory selected.";
pub const READY_MESSAGE: &str = "Mentat initialized. You can start chatting now.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Starting,
    Ready,
    /// Startup failed; a re-run is required to recover.
    Failed,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unstarted => "not started",
            SessionState::Starting => "starting…",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Mentat,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Mentat => "Mentat",
        }
    }
}

/// One line of the conversation log. Status lines (startup notices,
/// selection problems) carry no role and render without a prefix.
#[derive(Clone, Debug)]
pub struct ChatEntry {
    pub role: Option<Role>,
    pub text: String,
    pub timestamp: String,
}

impl ChatEntry {
    fn new(role: Option<Role>, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().format("%H:%M").to_string(),
        }
    }
}

/// Append-only, display-only record of the conversation. Not persisted.
#[derive(Default)]
pub struct ConversationLog {
    entries: Vec<ChatEntry>,
}

impl ConversationLog {
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(ChatEntry::new(Some(Role::User), text));
    }

    pub fn push_mentat(&mut self, text: impl Into<String>) {
        self.entries.push(ChatEntry::new(Some(Role::Mentat), text));
    }

    pub fn push_status(&mut self, text: impl Into<String>) {
        self.entries.push(ChatEntry::new(None, text));
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendRejection {
    /// Message was blank after trimming; dropped silently.
    #[error("message is empty")]
    Blank,
    /// No started session; the caller shows the fixed message.
    #[error("{}", NOT_READY_MESSAGE)]
    NotReady,
    /// An exchange is already in flight.
    #[error("a request is already in progress")]
    Busy,
}

pub struct SessionOrchestrator {
    state: SessionState,
    client: Option<Arc<dyn AssistantClient>>,
    log: ConversationLog,
    busy: bool,
    request_timeout: Duration,
}

impl Default for SessionOrchestrator {
    fn default() -> Self {
        Self {
            state: SessionState::Unstarted,
            client: None,
            log: ConversationLog::default(),
            busy: false,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl SessionOrchestrator {
    #[cfg(test)]
    fn with_request_timeout(timeout: Duration) -> Self {
        Self {
            request_timeout: timeout,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_send(&self) -> bool {
        self.state == SessionState::Ready && !self.busy
    }

    /// Run may be retried from Failed, but not while startup or an
    /// exchange is still in flight.
    pub fn can_run(&self) -> bool {
        self.state != SessionState::Starting && !self.busy
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ConversationLog {
        &mut self.log
    }

    /// Starts (or restarts) a session. Constructs a fresh client handle via
    /// `connect`, replacing any existing handle, and moves to Starting; the
    /// caller drives the returned handle's async startup and reports back
    /// through [`finish_run`](Self::finish_run).
    ///
    /// With no selection, appends the no-target notice and stays in the
    /// current state. A construction failure moves straight to Failed.
    pub fn run(
        &mut self,
        selection: Option<&TargetSelection>,
        config: &ProviderConfig,
        connect: impl FnOnce(&TargetSelection, &ProviderConfig) -> anyhow::Result<Arc<dyn AssistantClient>>,
    ) -> Option<Arc<dyn AssistantClient>> {
        if !self.can_run() {
            return None;
        }
        let Some(selection) = selection else {
            self.log.push_status(NO_TARGET_MESSAGE);
            return None;
        };
        match connect(selection, config) {
            Ok(client) => {
                self.client = Some(client.clone());
                self.state = SessionState::Starting;
                Some(client)
            }
            Err(e) => {
                tracing::error!("failed to initialize Mentat: {e}");
                self.client = None;
                self.state = SessionState::Failed;
                self.log
                    .push_status(format!("Failed to initialize Mentat: {e}"));
                None
            }
        }
    }

    /// Completes the startup step begun by [`run`](Self::run).
    pub fn finish_run(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.state = SessionState::Ready;
                self.log.push_status(READY_MESSAGE);
            }
            Err(e) => {
                tracing::error!("failed to initialize Mentat: {e}");
                self.client = None;
                self.state = SessionState::Failed;
                self.log
                    .push_status(format!("Failed to initialize Mentat: {e}"));
            }
        }
    }

    /// Gate for one outgoing message. On success the `User` entry is
    /// appended, the busy flag is raised, and the caller gets the handle to
    /// issue exactly one request against; it must report the outcome via
    /// [`finish_message`](Self::finish_message). Rejections leave the log
    /// untouched.
    pub fn begin_message(
        &mut self,
        text: &str,
    ) -> Result<(Arc<dyn AssistantClient>, String), SendRejection> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SendRejection::Blank);
        }
        if self.state != SessionState::Ready {
            return Err(SendRejection::NotReady);
        }
        if self.busy {
            return Err(SendRejection::Busy);
        }
        let Some(client) = self.client.clone() else {
            return Err(SendRejection::NotReady);
        };
        self.log.push_user(trimmed);
        self.busy = true;
        Ok((client, trimmed.to_string()))
    }

    /// Appends the reply (answer or formatted error) and re-enables input.
    /// A failed exchange does not invalidate the session.
    pub fn finish_message(&mut self, reply: String) {
        self.log.push_mentat(reply);
        self.busy = false;
    }
}

/// Issues exactly one request against the client, bounded by `timeout`.
/// Always produces display text: the answer, or an `"Error: …"` string on
/// failure or timeout. Errors are also recorded via the logging collaborator.
pub async fn exchange(client: &dyn AssistantClient, message: &str, timeout: Duration) -> String {
    match tokio::time::timeout(timeout, client.call(message)).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            tracing::error!("mentat request failed: {e}");
            format!("Error: {e}")
        }
        Err(_) => {
            let reason = format!(
                "request did not complete within {} seconds",
                timeout.as_secs()
            );
            tracing::error!("mentat request timed out: {reason}");
            format!("Error: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct MockClient {
        reply: String,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(reply: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AssistantClient for MockClient {
        async fn startup(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn call(&self, _message: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug)]
    struct FailingClient;

    #[async_trait]
    impl AssistantClient for FailingClient {
        async fn startup(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn call(&self, _message: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn selection() -> TargetSelection {
        TargetSelection::new(vec![std::path::PathBuf::from("/proj/main.rs")]).unwrap()
    }

    fn ready_session(client: Arc<dyn AssistantClient>) -> SessionOrchestrator {
        let mut session = SessionOrchestrator::default();
        let handle = session
            .run(Some(&selection()), &ProviderConfig::default(), |_, _| {
                Ok(client)
            })
            .unwrap();
        drop(handle);
        session.finish_run(Ok(()));
        session
    }

    #[test]
    fn send_is_a_no_op_before_run() {
        let mut session = SessionOrchestrator::default();
        let err = session.begin_message("hello").unwrap_err();
        assert_eq!(err, SendRejection::NotReady);
        assert_eq!(err.to_string(), NOT_READY_MESSAGE);
        assert!(session.log().is_empty());
    }

    #[test]
    fn blank_message_is_dropped_without_log_mutation() {
        let mut session = ready_session(MockClient::answering("hi"));
        let before = session.log().entries().len();
        assert_eq!(
            session.begin_message("   ").unwrap_err(),
            SendRejection::Blank
        );
        assert_eq!(session.log().entries().len(), before);
    }

    #[test]
    fn run_without_selection_keeps_state_unstarted() {
        let mut session = SessionOrchestrator::default();
        let out = session.run(None, &ProviderConfig::default(), |_, _| {
            panic!("connect must not be called without a selection")
        });
        assert!(out.is_none());
        assert_eq!(session.state(), SessionState::Unstarted);
        let last = session.log().entries().last().unwrap();
        assert_eq!(last.text, NO_TARGET_MESSAGE);
        assert!(last.role.is_none());
    }

    #[test]
    fn construction_failure_moves_to_failed() {
        let mut session = SessionOrchestrator::default();
        let out = session.run(Some(&selection()), &ProviderConfig::default(), |_, _| {
            Err(anyhow::anyhow!("bad working directory"))
        });
        assert!(out.is_none());
        assert_eq!(session.state(), SessionState::Failed);
        let last = session.log().entries().last().unwrap();
        assert!(last.text.contains("Failed to initialize Mentat"));
        assert!(last.text.contains("bad working directory"));
        assert!(!session.can_send());
    }

    #[test]
    fn startup_failure_moves_to_failed_and_allows_rerun() {
        let mut session = SessionOrchestrator::default();
        session
            .run(Some(&selection()), &ProviderConfig::default(), |_, _| {
                Ok(MockClient::answering("hi") as Arc<dyn AssistantClient>)
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Starting);
        assert!(!session.can_run());

        session.finish_run(Err("model not available".into()));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.can_run());
        assert!(!session.can_send());
    }

    #[tokio::test]
    async fn successful_exchange_appends_user_then_mentat() {
        let mock = MockClient::answering("the answer");
        let mut session = ready_session(mock.clone());
        let baseline = session.log().entries().len();

        let (client, message) = session.begin_message("hello").unwrap();
        assert!(session.is_busy(), "input must be disabled between entries");
        assert!(!session.can_send());

        let reply = exchange(client.as_ref(), &message, REQUEST_TIMEOUT).await;
        session.finish_message(reply);

        assert!(!session.is_busy());
        let entries = &session.log().entries()[baseline..];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Some(Role::User));
        assert_eq!(entries[0].text, "hello");
        assert_eq!(entries[1].role, Some(Role::Mentat));
        assert_eq!(entries[1].text, "the answer");
        assert_eq!(mock.calls(), 1, "exactly one request per user message");
    }

    #[tokio::test]
    async fn request_failure_is_displayed_and_session_stays_ready() {
        let mut session = ready_session(Arc::new(FailingClient));

        let (client, message) = session.begin_message("hello").unwrap();
        let reply = exchange(client.as_ref(), &message, REQUEST_TIMEOUT).await;
        session.finish_message(reply);

        let last = session.log().entries().last().unwrap();
        assert!(last.text.starts_with("Error:"));
        assert!(last.text.contains("connection refused"));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.can_send());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_request_yields_error_text_and_keeps_session_usable() {
        let mock = MockClient::slow("too late", Duration::from_secs(120));
        let mut session = SessionOrchestrator::with_request_timeout(Duration::from_secs(30));
        session
            .run(Some(&selection()), &ProviderConfig::default(), |_, _| {
                Ok(mock.clone() as Arc<dyn AssistantClient>)
            })
            .unwrap();
        session.finish_run(Ok(()));

        let (client, message) = session.begin_message("hello").unwrap();
        let reply = exchange(client.as_ref(), &message, session.request_timeout()).await;
        session.finish_message(reply);

        let last = session.log().entries().last().unwrap();
        assert!(last.text.starts_with("Error:"));
        assert!(last.text.contains("30 seconds"));
        assert_eq!(session.state(), SessionState::Ready);

        // A follow-up message is accepted after the timeout.
        assert!(session.begin_message("still there?").is_ok());
    }

    #[test]
    fn second_message_is_rejected_while_one_is_in_flight() {
        let mut session = ready_session(MockClient::answering("hi"));
        session.begin_message("first").unwrap();
        assert_eq!(
            session.begin_message("second").unwrap_err(),
            SendRejection::Busy
        );
        let users = session
            .log()
            .entries()
            .iter()
            .filter(|e| e.role == Some(Role::User))
            .count();
        assert_eq!(users, 1);
    }

    #[tokio::test]
    async fn rerun_replaces_the_session_handle() {
        let first = MockClient::answering("from first");
        let second = MockClient::answering("from second");
        let mut session = ready_session(first.clone());

        session
            .run(Some(&selection()), &ProviderConfig::default(), |_, _| {
                Ok(second.clone() as Arc<dyn AssistantClient>)
            })
            .unwrap();
        session.finish_run(Ok(()));

        let (client, message) = session.begin_message("hello").unwrap();
        let reply = exchange(client.as_ref(), &message, REQUEST_TIMEOUT).await;
        session.finish_message(reply);

        assert_eq!(session.log().entries().last().unwrap().text, "from second");
        assert_eq!(first.calls(), 0, "old handle must never be used again");
        assert_eq!(second.calls(), 1);
    }
}
