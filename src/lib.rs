//! specchat - session and request orchestration for AI-assisted requirements chat
//!
//! The core of an editor extension that collects a structured project
//! questionnaire, relays it plus the conversation to a remote AI backend, and
//! renders the backend's replies, including the specially-flagged final
//! requirements document, back to the user.
//!
//! # Modules
//!
//! - [`sanitize`] - markup stripping, rich-reply allow-listing, file names
//! - [`config`] - endpoint settings validation with atomic default fallback
//! - [`client`] - backend HTTP client behind the [`BackendClient`] seam
//! - [`session`] - intake record, conversation turns, session store
//! - [`document`] - document persistence through a host-resolved location
//! - [`protocol`] - tagged messages exchanged with the presentation layer
//! - [`orchestrator`] - the state machine tying it all together
//!
//! The presentation layer, the backend's internals, and host-runtime services
//! (settings store, file target, log sink) are external collaborators reached
//! through the capability traits [`SettingsSource`], [`DocumentSink`], and
//! [`HostNotifier`].

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod protocol;
pub mod sanitize;
pub mod session;

pub use client::{BackendClient, BackendError, BackendReply, HttpBackendClient};
pub use config::{EndpointConfig, MemorySettings, ResolvedConfig, SettingsSource, resolve};
pub use document::{DocumentError, DocumentSink, NullSink, WorkspaceSink, write_document};
pub use error::ChatError;
pub use orchestrator::{HostNotifier, LogNotifier, Orchestrator};
pub use protocol::{PanelMessage, UiMessage};
pub use session::{ConversationTurn, IntakeRecord, ProcessingMode, Role, SessionStore};
