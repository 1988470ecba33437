use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    application::services::event_bus::RecordEventBus,
    domain::{
        errors::DomainError,
        events::RecordCreatedEvent,
        models::{MessageRecord, RecordStatus, is_valid_key},
        repositories::MessageRecordRepository,
    },
};

/// Standard creation path: store the record, then fire its creation event.
pub struct CreateRecordUseCase {
    records: Arc<dyn MessageRecordRepository>,
    bus: Arc<dyn RecordEventBus>,
}

pub struct CreateRecordRequest {
    pub tenant_id: String,
    pub thread_id: Option<String>,
    pub text: String,
    pub attachment_type: Option<String>,
    pub attachment_payload: Option<String>,
    pub destination_address: String,
    pub sender_id: String,
    pub status: Option<RecordStatus>,
    pub extra: Map<String, Value>,
}

impl CreateRecordUseCase {
    pub fn new(records: Arc<dyn MessageRecordRepository>, bus: Arc<dyn RecordEventBus>) -> Self {
        Self { records, bus }
    }

    pub async fn execute(&self, request: CreateRecordRequest) -> Result<MessageRecord, DomainError> {
        if !is_valid_key(&request.tenant_id) {
            return Err(DomainError::Validation(format!(
                "invalid tenant id '{}'",
                request.tenant_id
            )));
        }
        if request.destination_address.trim().is_empty() {
            return Err(DomainError::Validation(
                "destination address is required".to_string(),
            ));
        }
        if let Some(key) = request
            .extra
            .keys()
            .find(|key| MessageRecord::is_reserved_field(key))
        {
            return Err(DomainError::Validation(format!(
                "extra field '{key}' shadows a record field"
            )));
        }

        let record = MessageRecord {
            record_id: self.records.allocate_id(&request.tenant_id),
            tenant_id: request.tenant_id,
            thread_id: request.thread_id,
            text: request.text,
            attachment_type: request.attachment_type,
            attachment_payload: request.attachment_payload,
            destination_address: request.destination_address,
            sender_id: request.sender_id,
            status: request.status.unwrap_or(RecordStatus::PendingSend),
            created_at: Utc::now(),
            processed_at: None,
            error_message: None,
            relay_response_status: None,
            extra: request.extra,
        };

        let record = self
            .records
            .insert(record)
            .await
            .map_err(DomainError::from_anyhow)?;
        info!(
            tenant_id = %record.tenant_id,
            record_id = %record.record_id,
            status = record.status.as_str(),
            "record created"
        );

        self.bus
            .publish_created(RecordCreatedEvent::for_record(&record))
            .await?;

        Ok(record)
    }
}
