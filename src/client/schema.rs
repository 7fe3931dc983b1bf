use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A coordinated transaction session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub state: String,
    /// Seconds before the coordinator times the session out.
    #[serde(default)]
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default)]
    pub retries: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub terminate_reason: String,
}

/// A compensate/complete action attached to a participant. `data` is the
/// action's opaque payload; `results` accumulates one entry per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAction {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Value>,
    #[serde(default)]
    pub invoked_count: i64,
}

/// One participant of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub session_id: String,
    pub client_id: String,
    /// Caller-chosen request id; the coordinator deduplicates joins on it.
    pub request_id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensate_action: Option<ParticipantAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_action: Option<ParticipantAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/v1/sessions/{id}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantJoin {
    pub client_id: String,
    pub request_id: String,
}

/// Body of `POST /api/v1/sessions/{id}/partial-commit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCommit {
    #[serde(rename = "participantId")]
    pub id: i64,
    pub compensate: Option<ParticipantAction>,
    pub complete: Option<ParticipantAction>,
}
