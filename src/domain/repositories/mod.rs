use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{ConversationSummary, MessageRecord, OutcomeUpdate, SummaryUpdate};

#[async_trait]
pub trait MessageRecordRepository: Send + Sync {
    /// Pre-generates an identifier inside the tenant's record collection so it
    /// can be handed out before the record is written.
    fn allocate_id(&self, _tenant_id: &str) -> String {
        Uuid::new_v4().to_string()
    }

    /// Stores a new record, allocating an identifier when `record_id` is empty.
    async fn insert(&self, record: MessageRecord) -> anyhow::Result<MessageRecord>;

    async fn get(&self, tenant_id: &str, record_id: &str) -> anyhow::Result<Option<MessageRecord>>;

    /// Merges `update` into the record only while it is still `pending_send`.
    /// Returns `false` when the record is missing or already terminal.
    async fn apply_outcome(
        &self,
        tenant_id: &str,
        record_id: &str,
        update: &OutcomeUpdate,
    ) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait ConversationSummaryRepository: Send + Sync {
    async fn insert(&self, summary: ConversationSummary) -> anyhow::Result<()>;

    async fn get(
        &self,
        tenant_id: &str,
        conversation_id: &str,
    ) -> anyhow::Result<Option<ConversationSummary>>;

    /// Returns `false` when no summary exists; summaries are never created here.
    async fn apply_update(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        update: &SummaryUpdate,
    ) -> anyhow::Result<bool>;
}
