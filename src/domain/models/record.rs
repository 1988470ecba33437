use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle of an outgoing message record.
///
/// Only `PendingSend` is eligible for relay. Values written by other producers
/// that this service does not know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordStatus {
    PendingSend,
    Sent,
    Error,
    Other(String),
}

impl RecordStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RecordStatus::PendingSend => "pending_send",
            RecordStatus::Sent => "sent",
            RecordStatus::Error => "error",
            RecordStatus::Other(value) => value.as_str(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RecordStatus::PendingSend)
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending_send" => RecordStatus::PendingSend,
            "sent" => RecordStatus::Sent,
            "error" => RecordStatus::Error,
            _ => RecordStatus::Other(value),
        }
    }
}

impl From<&str> for RecordStatus {
    fn from(value: &str) -> Self {
        RecordStatus::from(value.to_string())
    }
}

impl From<RecordStatus> for String {
    fn from(value: RecordStatus) -> Self {
        match value {
            RecordStatus::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

/// One unit of outbound communication, as stored under
/// `tenant/{tenant_id}/records/{record_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default)]
    pub record_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_payload: Option<String>,
    #[serde(default)]
    pub destination_address: String,
    #[serde(default)]
    pub sender_id: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_response_status: Option<u16>,
    /// Fields written by upstream producers that have no typed counterpart.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageRecord {
    /// Wire names of the typed fields. Passthrough keys must not reuse them,
    /// or the flattened output would carry the same key twice.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "recordId",
        "tenantId",
        "threadId",
        "text",
        "attachmentType",
        "attachmentPayload",
        "destinationAddress",
        "senderId",
        "status",
        "createdAt",
        "processedAt",
        "errorMessage",
        "relayResponseStatus",
    ];

    pub fn is_reserved_field(key: &str) -> bool {
        Self::FIELD_NAMES.contains(&key)
    }

    /// A new pending record with no identifier yet; the store allocates one on insert.
    pub fn pending(
        tenant_id: impl Into<String>,
        destination_address: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            record_id: String::new(),
            tenant_id: tenant_id.into(),
            thread_id: None,
            text: text.into(),
            attachment_type: None,
            attachment_payload: None,
            destination_address: destination_address.into(),
            sender_id: sender_id.into(),
            status: RecordStatus::PendingSend,
            created_at: Utc::now(),
            processed_at: None,
            error_message: None,
            relay_response_status: None,
            extra: Map::new(),
        }
    }

    /// Attachment type used on the wire, falling back to plain text.
    pub fn message_type(&self) -> &str {
        self.attachment_type.as_deref().unwrap_or("text")
    }
}

/// Tenant and record identifiers become path and subject segments, so they
/// must be non-empty and free of separators, wildcards and whitespace.
pub fn is_valid_key(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | '/' | '*' | '>'))
}
