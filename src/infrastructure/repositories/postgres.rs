use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, Pool, Postgres, types::Json};

use crate::domain::{
    errors::DomainError,
    models::{ConversationSummary, MessageRecord, OutcomeUpdate, RecordStatus, SummaryUpdate},
    repositories::{ConversationSummaryRepository, MessageRecordRepository},
};

pub type PgPool = Pool<Postgres>;

const RECORD_COLUMNS: &str = r#"
    tenant_id, record_id, thread_id, text, attachment_type, attachment_payload,
    destination_address, sender_id, status, created_at, processed_at, error_message,
    relay_response_status, extra
"#;

#[derive(Clone)]
pub struct PostgresMessageRecordRepository {
    pool: PgPool,
}

impl PostgresMessageRecordRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl MessageRecordRepository for PostgresMessageRecordRepository {
    async fn insert(&self, mut record: MessageRecord) -> anyhow::Result<MessageRecord> {
        if record.record_id.is_empty() {
            record.record_id = self.allocate_id(&record.tenant_id);
        }

        let result = sqlx::query_as::<_, MessageRecordRow>(&format!(
            r#"
            INSERT INTO message_records ({RECORD_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&record.tenant_id)
        .bind(&record.record_id)
        .bind(&record.thread_id)
        .bind(&record.text)
        .bind(&record.attachment_type)
        .bind(&record.attachment_payload)
        .bind(&record.destination_address)
        .bind(&record.sender_id)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.processed_at)
        .bind(&record.error_message)
        .bind(record.relay_response_status.map(i32::from))
        .bind(Json(&record.extra))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(DomainError::DuplicateRecord {
                    tenant_id: record.tenant_id,
                    record_id: record.record_id,
                }
                .into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, tenant_id: &str, record_id: &str) -> anyhow::Result<Option<MessageRecord>> {
        let row = sqlx::query_as::<_, MessageRecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM message_records
            WHERE tenant_id = $1 AND record_id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageRecord::from))
    }

    async fn apply_outcome(
        &self,
        tenant_id: &str,
        record_id: &str,
        update: &OutcomeUpdate,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE message_records
            SET status = $3,
                relay_response_status = COALESCE($4, relay_response_status),
                error_message = COALESCE($5, error_message),
                processed_at = GREATEST($6, created_at)
            WHERE tenant_id = $1
              AND record_id = $2
              AND status = 'pending_send'
            "#,
        )
        .bind(tenant_id)
        .bind(record_id)
        .bind(update.status.as_str())
        .bind(update.relay_response_status.map(i32::from))
        .bind(&update.error_message)
        .bind(update.processed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[derive(Clone)]
pub struct PostgresConversationSummaryRepository {
    pool: PgPool,
}

impl PostgresConversationSummaryRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ConversationSummaryRepository for PostgresConversationSummaryRepository {
    async fn insert(&self, summary: ConversationSummary) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conversation_summaries (
                tenant_id, conversation_id, last_message_preview, last_message_at,
                unread_count, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT (tenant_id, conversation_id) DO UPDATE
            SET last_message_preview = EXCLUDED.last_message_preview,
                last_message_at = EXCLUDED.last_message_at,
                unread_count = EXCLUDED.unread_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&summary.tenant_id)
        .bind(&summary.conversation_id)
        .bind(&summary.last_message_preview)
        .bind(summary.last_message_at)
        .bind(unread_count_column(summary.unread_count)?)
        .bind(summary.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: &str,
        conversation_id: &str,
    ) -> anyhow::Result<Option<ConversationSummary>> {
        let row = sqlx::query_as::<_, ConversationSummaryRow>(
            r#"
            SELECT tenant_id, conversation_id, last_message_preview, last_message_at,
                   unread_count, updated_at
            FROM conversation_summaries
            WHERE tenant_id = $1 AND conversation_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ConversationSummary::from))
    }

    async fn apply_update(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        update: &SummaryUpdate,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_summaries
            SET last_message_preview = $3,
                last_message_at = $4,
                unread_count = $5,
                updated_at = $6
            WHERE tenant_id = $1 AND conversation_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(conversation_id)
        .bind(&update.last_message_preview)
        .bind(update.last_message_at)
        .bind(unread_count_column(update.unread_count)?)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn unread_count_column(count: u32) -> anyhow::Result<i32> {
    i32::try_from(count).with_context(|| format!("unread count {count} does not fit the column"))
}

#[derive(FromRow)]
struct MessageRecordRow {
    tenant_id: String,
    record_id: String,
    thread_id: Option<String>,
    text: String,
    attachment_type: Option<String>,
    attachment_payload: Option<String>,
    destination_address: String,
    sender_id: String,
    status: String,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    relay_response_status: Option<i32>,
    extra: Json<Map<String, Value>>,
}

impl From<MessageRecordRow> for MessageRecord {
    fn from(value: MessageRecordRow) -> Self {
        Self {
            record_id: value.record_id,
            tenant_id: value.tenant_id,
            thread_id: value.thread_id,
            text: value.text,
            attachment_type: value.attachment_type,
            attachment_payload: value.attachment_payload,
            destination_address: value.destination_address,
            sender_id: value.sender_id,
            status: RecordStatus::from(value.status),
            created_at: value.created_at,
            processed_at: value.processed_at,
            error_message: value.error_message,
            relay_response_status: value
                .relay_response_status
                .and_then(|code| u16::try_from(code).ok()),
            extra: value.extra.0,
        }
    }
}

#[derive(FromRow)]
struct ConversationSummaryRow {
    tenant_id: String,
    conversation_id: String,
    last_message_preview: String,
    last_message_at: Option<DateTime<Utc>>,
    unread_count: i32,
    updated_at: DateTime<Utc>,
}

impl From<ConversationSummaryRow> for ConversationSummary {
    fn from(value: ConversationSummaryRow) -> Self {
        Self {
            tenant_id: value.tenant_id,
            conversation_id: value.conversation_id,
            last_message_preview: value.last_message_preview,
            last_message_at: value.last_message_at,
            unread_count: value.unread_count.max(0) as u32,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use crate::domain::models::DeliveryOutcome;

    use super::*;

    /// Connects to `DATABASE_URL` and applies migrations, or returns `None`
    /// so the calling test can skip on machines without Postgres.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(&url)
            .await
            .ok()?;
        sqlx::migrate!().run(&pool).await.ok()?;
        Some(pool)
    }

    fn pending(tenant_id: &str) -> MessageRecord {
        MessageRecord::pending(tenant_id, "+1555", "agent-1", "hi")
    }

    #[test]
    fn unread_count_outside_column_range_is_an_error() {
        assert_eq!(unread_count_column(7).unwrap(), 7);
        assert!(unread_count_column(u32::MAX).is_err());
    }

    #[tokio::test]
    async fn outcome_is_written_only_while_pending() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: DATABASE_URL not set or unreachable");
            return;
        };
        let repo = PostgresMessageRecordRepository::new(pool);
        let tenant_id = format!("t{}", Uuid::new_v4().simple());

        let record = repo.insert(pending(&tenant_id)).await.unwrap();
        let first = OutcomeUpdate::for_outcome(
            &record,
            &DeliveryOutcome::Delivered { response_status: 202 },
            Utc::now(),
        );
        assert!(repo.apply_outcome(&tenant_id, &record.record_id, &first).await.unwrap());

        let second =
            OutcomeUpdate::for_outcome(&record, &DeliveryOutcome::failed("late"), Utc::now());
        assert!(!repo.apply_outcome(&tenant_id, &record.record_id, &second).await.unwrap());

        let stored = repo.get(&tenant_id, &record.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Sent);
        assert_eq!(stored.relay_response_status, Some(202));
        assert_eq!(stored.error_message, None);
    }

    #[tokio::test]
    async fn processed_at_never_precedes_created_at() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: DATABASE_URL not set or unreachable");
            return;
        };
        let repo = PostgresMessageRecordRepository::new(pool);
        let tenant_id = format!("t{}", Uuid::new_v4().simple());

        let record = repo.insert(pending(&tenant_id)).await.unwrap();
        let mut update =
            OutcomeUpdate::for_outcome(&record, &DeliveryOutcome::failed("boom"), Utc::now());
        update.processed_at = record.created_at - Duration::hours(1);

        assert!(repo.apply_outcome(&tenant_id, &record.record_id, &update).await.unwrap());

        let stored = repo.get(&tenant_id, &record.record_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Error);
        assert!(stored.processed_at.unwrap() >= stored.created_at);
        assert_eq!(stored.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn duplicate_ids_surface_as_domain_error() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: DATABASE_URL not set or unreachable");
            return;
        };
        let repo = PostgresMessageRecordRepository::new(pool);
        let tenant_id = format!("t{}", Uuid::new_v4().simple());

        let record = repo.insert(pending(&tenant_id)).await.unwrap();
        let err = repo.insert(record).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::DuplicateRecord { .. })
        ));
    }
}
