use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    errors::DomainError,
    models::{ConversationSummary, MessageRecord, OutcomeUpdate, SummaryUpdate},
    repositories::{ConversationSummaryRepository, MessageRecordRepository},
};

type TenantKey = (String, String);

fn key(tenant_id: &str, id: &str) -> TenantKey {
    (tenant_id.to_string(), id.to_string())
}

#[derive(Default)]
pub struct InMemoryMessageRecordRepository {
    records: Arc<RwLock<HashMap<TenantKey, MessageRecord>>>,
}

impl InMemoryMessageRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MessageRecordRepository for InMemoryMessageRecordRepository {
    async fn insert(&self, mut record: MessageRecord) -> anyhow::Result<MessageRecord> {
        if record.record_id.is_empty() {
            record.record_id = self.allocate_id(&record.tenant_id);
        }

        let mut records = self.records.write().await;
        let key = key(&record.tenant_id, &record.record_id);
        if records.contains_key(&key) {
            return Err(DomainError::DuplicateRecord {
                tenant_id: record.tenant_id,
                record_id: record.record_id,
            }
            .into());
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn get(&self, tenant_id: &str, record_id: &str) -> anyhow::Result<Option<MessageRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&key(tenant_id, record_id)).cloned())
    }

    async fn apply_outcome(
        &self,
        tenant_id: &str,
        record_id: &str,
        update: &OutcomeUpdate,
    ) -> anyhow::Result<bool> {
        // Check and write under one write lock so racing activations see a single winner.
        let mut records = self.records.write().await;
        match records.get_mut(&key(tenant_id, record_id)) {
            Some(record) if record.status.is_pending() => {
                update.merge_into(record);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryConversationSummaryRepository {
    summaries: Arc<RwLock<HashMap<TenantKey, ConversationSummary>>>,
}

impl InMemoryConversationSummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationSummaryRepository for InMemoryConversationSummaryRepository {
    async fn insert(&self, summary: ConversationSummary) -> anyhow::Result<()> {
        let mut summaries = self.summaries.write().await;
        summaries.insert(
            key(&summary.tenant_id, &summary.conversation_id),
            summary,
        );
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: &str,
        conversation_id: &str,
    ) -> anyhow::Result<Option<ConversationSummary>> {
        let summaries = self.summaries.read().await;
        Ok(summaries.get(&key(tenant_id, conversation_id)).cloned())
    }

    async fn apply_update(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        update: &SummaryUpdate,
    ) -> anyhow::Result<bool> {
        let mut summaries = self.summaries.write().await;
        match summaries.get_mut(&key(tenant_id, conversation_id)) {
            Some(summary) => {
                update.merge_into(summary);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
