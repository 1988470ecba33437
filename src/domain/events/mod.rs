use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::MessageRecord;

/// Activation fired once when a record is created under
/// `tenant/{tenant_id}/records/{record_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreatedEvent {
    pub event_id: Uuid,
    pub tenant_id: String,
    pub record_id: String,
    /// The record as created. `None` only for malformed activations.
    #[serde(default)]
    pub record: Option<MessageRecord>,
    pub occurred_at: DateTime<Utc>,
}

impl RecordCreatedEvent {
    pub fn for_record(record: &MessageRecord) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            tenant_id: record.tenant_id.clone(),
            record_id: record.record_id.clone(),
            record: Some(record.clone()),
            occurred_at: Utc::now(),
        }
    }

    /// Key used to drop duplicate publishes of the same creation.
    pub fn dedup_key(&self) -> String {
        format!("{}/{}", self.tenant_id, self.record_id)
    }
}

/// Body POSTed to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub interaction_id: String,
    pub tenant_id: String,
    pub text: String,
    pub customer_phone: String,
    pub sender_uid: String,
    pub sent_at: DateTime<Utc>,
    pub message_type: String,
    pub raw_message: MessageRecord,
}

impl OutboundPayload {
    pub fn from_record(record_id: &str, tenant_id: &str, record: &MessageRecord) -> Self {
        Self {
            interaction_id: record_id.to_string(),
            tenant_id: tenant_id.to_string(),
            text: record.text.clone(),
            customer_phone: record.destination_address.clone(),
            sender_uid: record.sender_id.clone(),
            sent_at: record.created_at,
            message_type: record.message_type().to_string(),
            raw_message: record.clone(),
        }
    }
}
