use chrono::{DateTime, Utc};

use super::record::{MessageRecord, RecordStatus};

pub const UNKNOWN_DELIVERY_ERROR: &str = "Unknown error";

/// Result of a single forward attempt.
///
/// Any HTTP response counts as delivered, whatever its status code. Only
/// transport failures (timeout, DNS, refused connection) are `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { response_status: u16 },
    Failed { error_message: String },
}

impl DeliveryOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let error_message = if message.trim().is_empty() {
            UNKNOWN_DELIVERY_ERROR.to_string()
        } else {
            message
        };
        DeliveryOutcome::Failed { error_message }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Partial update written back onto a record once its outcome is known.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeUpdate {
    pub status: RecordStatus,
    pub relay_response_status: Option<u16>,
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl OutcomeUpdate {
    /// Builds the terminal update for `record`. `processed_at` never precedes
    /// the record's `created_at`, even under clock skew between writers.
    pub fn for_outcome(record: &MessageRecord, outcome: &DeliveryOutcome, now: DateTime<Utc>) -> Self {
        let processed_at = now.max(record.created_at);
        match outcome {
            DeliveryOutcome::Delivered { response_status } => Self {
                status: RecordStatus::Sent,
                relay_response_status: Some(*response_status),
                error_message: None,
                processed_at,
            },
            DeliveryOutcome::Failed { error_message } => Self {
                status: RecordStatus::Error,
                relay_response_status: None,
                error_message: Some(error_message.clone()),
                processed_at,
            },
        }
    }

    /// Touches only lifecycle fields; content, routing and identity stay as they are.
    pub fn merge_into(&self, record: &mut MessageRecord) {
        record.status = self.status.clone();
        record.processed_at = Some(self.processed_at);
        if let Some(code) = self.relay_response_status {
            record.relay_response_status = Some(code);
        }
        if let Some(message) = &self.error_message {
            record.error_message = Some(message.clone());
        }
    }
}
