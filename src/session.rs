//! Session state: intake record, conversation turns, and the session store
//!
//! One store per panel, exclusively owned by its orchestrator. The generation
//! counter ties in-flight backend requests to the session they were issued
//! for, so replies that arrive after a reset or restart can be discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize;

/// How the described application processes data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    #[serde(rename = "real-time")]
    RealTime,
    #[serde(rename = "batch")]
    Batch,
}

impl Default for ProcessingMode {
    fn default() -> Self {
        ProcessingMode::RealTime
    }
}

/// The structured questionnaire captured once per session
///
/// All free-text fields are expected non-empty and `regions` non-empty before
/// the session counts as initialized; completeness is validated by the
/// presentation layer, not re-checked here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeRecord {
    /// Application category, e.g. "e-commerce" or "internal tooling"
    pub app_type: String,
    /// Expected user count bucket, e.g. "1k-10k"
    pub user_count: String,
    /// Traffic pattern descriptor, e.g. "spiky", "steady"
    pub traffic_pattern: String,
    pub processing_mode: ProcessingMode,
    /// Data sensitivity tier, e.g. "pii", "public"
    pub data_sensitivity: String,
    /// Target deployment regions, at least one expected
    pub regions: Vec<String>,
    /// Availability target, e.g. "99.9%"
    pub availability: String,
    /// Free-form project description
    pub description: String,
}

impl IntakeRecord {
    /// Return a copy with every free-text field run through the sanitizer
    pub fn sanitized(&self) -> Self {
        Self {
            app_type: sanitize::sanitize_plain_text(&self.app_type),
            user_count: sanitize::sanitize_plain_text(&self.user_count),
            traffic_pattern: sanitize::sanitize_plain_text(&self.traffic_pattern),
            processing_mode: self.processing_mode,
            data_sensitivity: sanitize::sanitize_plain_text(&self.data_sensitivity),
            regions: sanitize::sanitize_string_list(&self.regions),
            availability: sanitize::sanitize_plain_text(&self.availability),
            description: sanitize::sanitize_plain_text(&self.description),
        }
    }
}

/// Attribution of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One exchange unit in the conversation
///
/// Never mutated after creation; only assistant turns may carry `is_final`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// True only for the assistant turn recognized as the completed document
    #[serde(default)]
    pub is_final: bool,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_final: false,
        }
    }

    pub fn assistant(content: impl Into<String>, is_final: bool) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            is_final,
        }
    }
}

/// Holds one session's intake and ordered message history
///
/// All operations are synchronous and infallible; callers are responsible for
/// passing well-formed turns.
#[derive(Debug, Default)]
pub struct SessionStore {
    intake: Option<IntakeRecord>,
    history: Vec<ConversationTurn>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session with the given intake
    ///
    /// Clears any prior history unconditionally; starting over discards the
    /// previous conversation.
    pub fn start_session(&mut self, intake: IntakeRecord) {
        self.intake = Some(intake);
        self.history.clear();
        self.generation += 1;
        tracing::debug!(generation = self.generation, "start_session: session started");
    }

    /// Append a turn to the history
    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.history.push(turn);
    }

    /// Snapshot of the conversation history, in chronological order
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history.clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn intake(&self) -> Option<&IntakeRecord> {
        self.intake.as_ref()
    }

    /// Clear intake and history
    pub fn reset(&mut self) {
        self.intake = None;
        self.history.clear();
        self.generation += 1;
        tracing::debug!(generation = self.generation, "reset: session cleared");
    }

    /// Current session generation
    ///
    /// Bumped on every `start_session` and `reset`; a backend reply whose
    /// captured generation no longer matches is stale and must be dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(description: &str) -> IntakeRecord {
        IntakeRecord {
            app_type: "e-commerce".to_string(),
            user_count: "1k-10k".to_string(),
            traffic_pattern: "spiky".to_string(),
            processing_mode: ProcessingMode::RealTime,
            data_sensitivity: "pii".to_string(),
            regions: vec!["us-east".to_string()],
            availability: "99.9%".to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_start_session_discards_prior_conversation() {
        let mut store = SessionStore::new();

        store.start_session(intake("first"));
        store.append_turn(ConversationTurn::user("hello"));
        store.start_session(intake("second"));

        assert!(store.history().is_empty());
        assert_eq!(store.intake().unwrap().description, "second");
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let mut store = SessionStore::new();
        store.start_session(intake("x"));
        store.append_turn(ConversationTurn::user("hello"));

        let mut snapshot = store.history();
        snapshot.clear();

        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = SessionStore::new();
        store.start_session(intake("x"));
        store.append_turn(ConversationTurn::user("hello"));

        store.reset();

        assert!(store.intake().is_none());
        assert_eq!(store.history_len(), 0);
    }

    #[test]
    fn test_generation_bumps_on_start_and_reset() {
        let mut store = SessionStore::new();
        let g0 = store.generation();

        store.start_session(intake("x"));
        let g1 = store.generation();
        assert!(g1 > g0);

        store.reset();
        assert!(store.generation() > g1);
    }

    #[test]
    fn test_turns_keep_insertion_order() {
        let mut store = SessionStore::new();
        store.start_session(intake("x"));
        store.append_turn(ConversationTurn::user("one"));
        store.append_turn(ConversationTurn::assistant("two", false));

        let history = store.history();
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[0].content, "one");
        assert_eq!(history[1].content, "two");
    }

    #[test]
    fn test_intake_sanitized_strips_markup() {
        let raw = IntakeRecord {
            description: "<script>alert(1)</script>web shop".to_string(),
            regions: vec!["us-east".to_string(), "<b></b>".to_string()],
            ..intake("ignored")
        };

        let clean = raw.sanitized();
        assert_eq!(clean.description, "web shop");
        assert_eq!(clean.regions, vec!["us-east"]);
    }

    #[test]
    fn test_intake_serializes_camel_case() {
        let record = intake("desc");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["appType"], "e-commerce");
        assert_eq!(json["processingMode"], "real-time");
        assert_eq!(json["dataSensitivity"], "pii");
    }

    #[test]
    fn test_turn_serializes_is_final_camel_case() {
        let turn = ConversationTurn::assistant("done", true);
        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["isFinal"], true);
    }
}
