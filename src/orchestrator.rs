//! Orchestrator: the session-and-request state machine
//!
//! One orchestrator per presentation panel, constructed and disposed by the
//! host. It owns the session store, drives the backend client, applies the
//! sanitizer at both boundaries, and emits outbound notifications. Runs as an
//! actor: inbound panel messages arrive on a channel, and the single
//! outstanding backend request is polled alongside them so a session reset
//! can be processed while a request is in flight.
//!
//! Failure policy: nothing escapes `run` as a panic or an error. Every caught
//! failure is logged and surfaced as exactly one `error` notification with a
//! retryability flag; the session stays usable afterwards.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::client::{BackendClient, BackendError, BackendReply};
use crate::document::{self, DocumentSink};
use crate::error::ChatError;
use crate::protocol::{PanelMessage, UiMessage};
use crate::sanitize;
use crate::session::{ConversationTurn, IntakeRecord, SessionStore};

const INBOUND_BUFFER: usize = 32;

/// Transient host-level acknowledgments (e.g. toasts), distinct from the
/// outbound message protocol
pub trait HostNotifier: Send + Sync {
    fn notify_info(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Default notifier that routes acknowledgments to the log sink
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl HostNotifier for LogNotifier {
    fn notify_info(&self, message: &str) {
        info!(%message, "host notice");
    }

    fn notify_error(&self, message: &str) {
        warn!(%message, "host notice");
    }
}

struct PendingRequest {
    /// Session generation captured at send time; a mismatch on completion
    /// means the session was reset or restarted and the reply is stale
    generation: u64,
    task: JoinHandle<Result<BackendReply, BackendError>>,
}

/// The request/response state machine behind one panel
pub struct Orchestrator {
    client: Arc<dyn BackendClient>,
    sink: Arc<dyn DocumentSink>,
    notifier: Arc<dyn HostNotifier>,
    outbound: mpsc::Sender<UiMessage>,
    store: SessionStore,
    pending: Option<PendingRequest>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn BackendClient>,
        sink: Arc<dyn DocumentSink>,
        notifier: Arc<dyn HostNotifier>,
        outbound: mpsc::Sender<UiMessage>,
    ) -> Self {
        Self {
            client,
            sink,
            notifier,
            outbound,
            store: SessionStore::new(),
            pending: None,
        }
    }

    /// Spawn the orchestrator onto the runtime, returning its inbound sender
    ///
    /// Dropping the sender disposes the orchestrator.
    pub fn spawn(self) -> mpsc::Sender<PanelMessage> {
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        tokio::spawn(self.run(rx));
        tx
    }

    /// Process panel messages until the inbound channel closes
    pub async fn run(mut self, mut inbound: mpsc::Receiver<PanelMessage>) {
        enum Wakeup {
            Inbound(Option<PanelMessage>),
            Completed(Result<Result<BackendReply, BackendError>, JoinError>),
        }

        info!("run: orchestrator started");
        loop {
            match self.pending.take() {
                Some(mut pending) => {
                    let wakeup = tokio::select! {
                        maybe = inbound.recv() => Wakeup::Inbound(maybe),
                        joined = &mut pending.task => Wakeup::Completed(joined),
                    };
                    match wakeup {
                        Wakeup::Inbound(Some(msg)) => {
                            self.pending = Some(pending);
                            self.dispatch(msg).await;
                        }
                        Wakeup::Inbound(None) => {
                            pending.task.abort();
                            break;
                        }
                        Wakeup::Completed(joined) => {
                            self.on_reply(pending.generation, joined).await;
                        }
                    }
                }
                None => match inbound.recv().await {
                    Some(msg) => self.dispatch(msg).await,
                    None => break,
                },
            }
        }
        info!("run: orchestrator stopped");
    }

    async fn dispatch(&mut self, msg: PanelMessage) {
        debug!(?msg, "dispatch: called");
        match msg {
            PanelMessage::SubmitIntake { intake } => self.submit_intake(intake).await,
            PanelMessage::SendMessage { message } => self.send_message(message).await,
            PanelMessage::NewSession => self.new_session().await,
            PanelMessage::SaveDocument { content, filename } => {
                self.save_document(content, filename).await
            }
        }
    }

    /// Op 1: store the sanitized intake and acknowledge; no backend call
    async fn submit_intake(&mut self, intake: IntakeRecord) {
        self.discard_pending();
        self.store.start_session(intake.sanitized());
        self.notify(UiMessage::Loading { is_loading: false }).await;
    }

    /// Op 2: send a chat message, choosing the init or chat endpoint
    async fn send_message(&mut self, message: String) {
        if self.pending.is_some() {
            self.notify(UiMessage::Error {
                message: "A request is already in progress; wait for it to finish".to_string(),
                can_retry: None,
            })
            .await;
            return;
        }

        let text = sanitize::sanitize_plain_text(&message);
        if text.is_empty() {
            self.notify(UiMessage::Error {
                message: "Message is empty".to_string(),
                can_retry: None,
            })
            .await;
            return;
        }

        self.store.append_turn(ConversationTurn::user(text.clone()));
        self.notify(UiMessage::Loading { is_loading: true }).await;

        let generation = self.store.generation();
        let client = Arc::clone(&self.client);

        // History length 1 means this user turn is the first ever backend
        // call of the session, which carries the stored intake.
        let task = if self.store.history_len() == 1 {
            let intake = self.store.intake().cloned().unwrap_or_else(|| {
                // Caller-contract violation (message before intake); proceed
                // with an empty record rather than crash.
                warn!("send_message: no intake stored, sending empty record");
                IntakeRecord::default()
            });
            tokio::spawn(async move { client.send_initial(&intake, &text).await })
        } else {
            let history = self.store.history();
            tokio::spawn(async move { client.send_follow_up(&text, &history).await })
        };

        self.pending = Some(PendingRequest { generation, task });
    }

    /// Handle the completed backend request
    async fn on_reply(
        &mut self,
        generation: u64,
        joined: Result<Result<BackendReply, BackendError>, JoinError>,
    ) {
        if generation != self.store.generation() {
            debug!(
                generation,
                current = self.store.generation(),
                "on_reply: stale response discarded"
            );
            return;
        }

        let result = match joined {
            Ok(r) => r.map_err(ChatError::from),
            Err(e) => Err(ChatError::Unknown(format!("Backend task failed: {e}"))),
        };

        match result {
            Ok(reply) => {
                if let Some(backend_error) = reply.error {
                    warn!(%backend_error, "on_reply: backend reported an error");
                    self.notify(UiMessage::Loading { is_loading: false }).await;
                    self.notify(UiMessage::Error {
                        message: backend_error,
                        can_retry: Some(false),
                    })
                    .await;
                    return;
                }

                let clean = sanitize::sanitize_rich_reply(&reply.message);
                self.store
                    .append_turn(ConversationTurn::assistant(clean.clone(), reply.is_final));
                self.notify(UiMessage::Loading { is_loading: false }).await;
                self.notify(UiMessage::ChatResponse {
                    message: clean,
                    is_final: reply.is_final,
                })
                .await;
            }
            Err(err) => {
                warn!(error = %err, retryable = err.is_retryable(), "on_reply: request failed");
                self.notify(UiMessage::Loading { is_loading: false }).await;
                self.notify(UiMessage::Error {
                    message: err.to_string(),
                    can_retry: Some(err.is_retryable()),
                })
                .await;
            }
        }
    }

    /// Op 3: discard the session; no backend call
    async fn new_session(&mut self) {
        self.discard_pending();
        self.store.reset();
        self.notify(UiMessage::SessionCleared).await;
    }

    /// Abort any request belonging to a session that is being discarded
    ///
    /// Frees the busy guard immediately instead of holding it until the dead
    /// session's request times out; the generation check in `on_reply` still
    /// covers a reply that slips through before the abort lands.
    fn discard_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("discard_pending: aborting request for a discarded session");
            pending.task.abort();
        }
    }

    /// Op 4: persist a document to the external writable location
    async fn save_document(&mut self, content: String, filename: String) {
        match document::write_document(self.sink.as_ref(), &filename, &content) {
            Ok(path) => {
                self.notifier
                    .notify_info(&format!("Document saved to {}", path.display()));
            }
            Err(err) => {
                let err = ChatError::from(err);
                warn!(error = %err, "save_document: failed");
                self.notifier.notify_error(&err.to_string());
                self.notify(UiMessage::Error {
                    message: err.to_string(),
                    can_retry: Some(false),
                })
                .await;
            }
        }
    }

    async fn notify(&self, msg: UiMessage) {
        if self.outbound.send(msg).await.is_err() {
            debug!("notify: presentation channel closed");
        }
    }
}
