use std::sync::Arc;

use crate::domain::{
    errors::DomainError, models::MessageRecord, repositories::MessageRecordRepository,
};

pub struct GetRecordUseCase {
    records: Arc<dyn MessageRecordRepository>,
}

impl GetRecordUseCase {
    pub fn new(records: Arc<dyn MessageRecordRepository>) -> Self {
        Self { records }
    }

    pub async fn execute(&self, tenant_id: &str, record_id: &str) -> Result<MessageRecord, DomainError> {
        self.records
            .get(tenant_id, record_id)
            .await?
            .ok_or_else(|| DomainError::RecordNotFound {
                tenant_id: tenant_id.to_string(),
                record_id: record_id.to_string(),
            })
    }
}
