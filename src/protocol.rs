//! Message protocol between the presentation layer and the orchestrator
//!
//! Tagged JSON messages. Each carries a `type` discriminator plus camelCase
//! payload fields, matching what the webview side of the panel exchanges.

use serde::{Deserialize, Serialize};

use crate::session::IntakeRecord;

/// Messages from the presentation layer to the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelMessage {
    /// Store the completed questionnaire and begin a session
    #[serde(rename_all = "camelCase")]
    SubmitIntake { intake: IntakeRecord },

    /// Send one chat message to the backend
    #[serde(rename_all = "camelCase")]
    SendMessage { message: String },

    /// Discard the current session and return to the intake form
    NewSession,

    /// Persist a final document to the external writable location
    #[serde(rename_all = "camelCase")]
    SaveDocument { content: String, filename: String },
}

/// Notifications from the orchestrator to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiMessage {
    /// A new assistant turn is ready to render
    #[serde(rename_all = "camelCase")]
    ChatResponse { message: String, is_final: bool },

    /// An operation failed; `can_retry` tells the presentation layer whether
    /// re-issuing the same send is worthwhile
    #[serde(rename_all = "camelCase")]
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        can_retry: Option<bool>,
    },

    /// Toggle the busy indicator
    #[serde(rename_all = "camelCase")]
    Loading { is_loading: bool },

    /// Return the presentation layer to the intake/entry state
    SessionCleared,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ProcessingMode;

    #[test]
    fn test_send_message_serialize() {
        let msg = PanelMessage::SendMessage {
            message: "hello".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"sendMessage","message":"hello"}"#);
    }

    #[test]
    fn test_new_session_serialize() {
        let msg = PanelMessage::NewSession;
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"newSession"}"#);
    }

    #[test]
    fn test_save_document_serialize() {
        let msg = PanelMessage::SaveDocument {
            content: "# PRD".to_string(),
            filename: "prd.md".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r##"{"type":"saveDocument","content":"# PRD","filename":"prd.md"}"##
        );
    }

    #[test]
    fn test_submit_intake_deserialize() {
        let json = r#"{
            "type": "submitIntake",
            "intake": {
                "appType": "e-commerce",
                "userCount": "1k-10k",
                "trafficPattern": "spiky",
                "processingMode": "batch",
                "dataSensitivity": "pii",
                "regions": ["us-east", "eu-west"],
                "availability": "99.9%",
                "description": "a web shop"
            }
        }"#;

        let msg: PanelMessage = serde_json::from_str(json).unwrap();
        match msg {
            PanelMessage::SubmitIntake { intake } => {
                assert_eq!(intake.app_type, "e-commerce");
                assert_eq!(intake.processing_mode, ProcessingMode::Batch);
                assert_eq!(intake.regions.len(), 2);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_chat_response_serialize() {
        let msg = UiMessage::ChatResponse {
            message: "Hi".to_string(),
            is_final: false,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"chatResponse","message":"Hi","isFinal":false}"#);
    }

    #[test]
    fn test_error_serialize_with_retry_flag() {
        let msg = UiMessage::Error {
            message: "timed out".to_string(),
            can_retry: Some(true),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"timed out","canRetry":true}"#);
    }

    #[test]
    fn test_error_serialize_omits_absent_retry_flag() {
        let msg = UiMessage::Error {
            message: "empty message".to_string(),
            can_retry: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"empty message"}"#);
    }

    #[test]
    fn test_loading_serialize() {
        let msg = UiMessage::Loading { is_loading: true };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"loading","isLoading":true}"#);
    }

    #[test]
    fn test_session_cleared_serialize() {
        let msg = UiMessage::SessionCleared;
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"sessionCleared"}"#);
    }

    #[test]
    fn test_roundtrip_all_panel_messages() {
        let messages = vec![
            PanelMessage::SendMessage {
                message: "hi".to_string(),
            },
            PanelMessage::NewSession,
            PanelMessage::SaveDocument {
                content: "doc".to_string(),
                filename: "f".to_string(),
            },
        ];

        for msg in messages {
            let json = serde_json::to_string(&msg).unwrap();
            let parsed: PanelMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(msg, parsed);
        }
    }
}
