use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    models::{DeliveryOutcome, MessageRecord, OutcomeUpdate, SummaryUpdate, preview_for_attachment},
    repositories::{ConversationSummaryRepository, MessageRecordRepository},
};

/// Writes forwarding outcomes back onto records and, for the submission
/// flow, onto the conversation summary.
#[derive(Clone)]
pub struct OutcomeWriter {
    records: Arc<dyn MessageRecordRepository>,
    summaries: Arc<dyn ConversationSummaryRepository>,
}

impl OutcomeWriter {
    pub fn new(
        records: Arc<dyn MessageRecordRepository>,
        summaries: Arc<dyn ConversationSummaryRepository>,
    ) -> Self {
        Self { records, summaries }
    }

    /// Applies the terminal status to a stored record. Returns `None` when the
    /// record already left `pending_send`, in which case nothing is written.
    pub async fn apply_outcome(
        &self,
        tenant_id: &str,
        record_id: &str,
        record: &MessageRecord,
        outcome: &DeliveryOutcome,
    ) -> anyhow::Result<Option<OutcomeUpdate>> {
        let update = OutcomeUpdate::for_outcome(record, outcome, Utc::now());

        if !self
            .records
            .apply_outcome(tenant_id, record_id, &update)
            .await?
        {
            warn!(
                tenant_id,
                record_id, "record no longer pending_send, outcome dropped"
            );
            return Ok(None);
        }

        info!(
            tenant_id,
            record_id,
            status = update.status.as_str(),
            "record outcome written"
        );
        Ok(Some(update))
    }

    /// Refreshes the conversation card after a submission. Runs whatever the
    /// delivery outcome was. Returns `false` when the summary does not exist.
    pub async fn update_summary(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        record: &MessageRecord,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let update = SummaryUpdate {
            last_message_preview: preview_for_attachment(
                record.attachment_type.as_deref(),
                &record.text,
            )
            .to_string(),
            last_message_at: sent_at,
            unread_count: 0,
            updated_at: Utc::now(),
        };

        let updated = self
            .summaries
            .apply_update(tenant_id, conversation_id, &update)
            .await?;
        if updated {
            debug!(tenant_id, conversation_id, "conversation summary refreshed");
        } else {
            warn!(tenant_id, conversation_id, "conversation summary not found");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::models::{ConversationSummary, RecordStatus},
        infrastructure::repositories::in_memory::{
            InMemoryConversationSummaryRepository, InMemoryMessageRecordRepository,
        },
    };

    use super::*;

    fn writer() -> (
        OutcomeWriter,
        Arc<InMemoryMessageRecordRepository>,
        Arc<InMemoryConversationSummaryRepository>,
    ) {
        let records = Arc::new(InMemoryMessageRecordRepository::new());
        let summaries = Arc::new(InMemoryConversationSummaryRepository::new());
        (
            OutcomeWriter::new(records.clone(), summaries.clone()),
            records,
            summaries,
        )
    }

    #[tokio::test]
    async fn success_marks_record_sent() {
        let (writer, records, _) = writer();
        let record = records
            .insert(MessageRecord::pending("acme", "+1555", "agent-1", "hi"))
            .await
            .unwrap();

        let update = writer
            .apply_outcome(
                "acme",
                &record.record_id,
                &record,
                &DeliveryOutcome::Delivered { response_status: 202 },
            )
            .await
            .unwrap()
            .unwrap();

        let stored = records.get("acme", &record.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Sent);
        assert_eq!(stored.relay_response_status, Some(202));
        assert_eq!(stored.processed_at, Some(update.processed_at));
        assert_eq!(stored.error_message, None);
        assert_eq!(stored.text, "hi");
    }

    #[tokio::test]
    async fn second_outcome_is_dropped() {
        let (writer, records, _) = writer();
        let record = records
            .insert(MessageRecord::pending("acme", "+1555", "agent-1", "hi"))
            .await
            .unwrap();

        writer
            .apply_outcome("acme", &record.record_id, &record, &DeliveryOutcome::failed("timeout"))
            .await
            .unwrap();
        let second = writer
            .apply_outcome(
                "acme",
                &record.record_id,
                &record,
                &DeliveryOutcome::Delivered { response_status: 200 },
            )
            .await
            .unwrap();

        assert!(second.is_none());
        let stored = records.get("acme", &record.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Error);
        assert_eq!(stored.error_message.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn summary_gets_preview_and_zero_unread() {
        let (writer, _, summaries) = writer();
        summaries
            .insert(ConversationSummary {
                tenant_id: "acme".to_string(),
                conversation_id: "conv-1".to_string(),
                last_message_preview: "old".to_string(),
                last_message_at: None,
                unread_count: 4,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let mut record = MessageRecord::pending("acme", "+1555", "agent-1", "");
        record.attachment_type = Some("video/mp4".to_string());
        let sent_at = Utc::now();

        assert!(writer.update_summary("acme", "conv-1", &record, sent_at).await.unwrap());
        let summary = summaries.get("acme", "conv-1").await.unwrap().unwrap();
        assert_eq!(summary.last_message_preview, "🎥 Video");
        assert_eq!(summary.last_message_at, Some(sent_at));
        assert_eq!(summary.unread_count, 0);

        assert!(!writer.update_summary("acme", "missing", &record, sent_at).await.unwrap());
    }
}
