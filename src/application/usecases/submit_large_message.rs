use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{
        handlers::outcome_writer::OutcomeWriter,
        services::{
            forwarder::{Forwarder, WebhookRoutes},
            jwt::CallerIdentity,
        },
    },
    domain::{
        events::OutboundPayload,
        models::{DeliveryOutcome, MessageRecord, OutcomeUpdate, RecordStatus, is_valid_key},
        repositories::MessageRecordRepository,
    },
};

pub const VIDEO_ATTACHMENT_TYPE: &str = "video/mp4";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("caller is not authenticated")]
    Unauthenticated,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubmissionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Unauthenticated => "Unauthenticated",
            SubmissionError::InvalidArgument(_) => "InvalidArgument",
            SubmissionError::Internal(_) => "Internal",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SubmitLargeMessageRequest {
    pub tenant_id: Option<String>,
    pub conversation_id: Option<String>,
    pub text: Option<String>,
    pub base64_video: Option<String>,
    pub customer_phone: Option<String>,
    pub sender_uid: Option<String>,
    pub lead_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitLargeMessageResponse {
    pub success: bool,
    pub id: String,
}

/// Synchronous path for payloads too large for the standard creation flow.
///
/// The video is forwarded inline before anything is stored and is never
/// persisted. The record is written with its terminal status already set,
/// and success means the record was stored, not that it was delivered.
pub struct SubmitLargeMessageUseCase {
    records: Arc<dyn MessageRecordRepository>,
    forwarder: Arc<dyn Forwarder>,
    outcome_writer: OutcomeWriter,
    routes: WebhookRoutes,
    timeout: Duration,
}

impl SubmitLargeMessageUseCase {
    pub fn new(
        records: Arc<dyn MessageRecordRepository>,
        forwarder: Arc<dyn Forwarder>,
        outcome_writer: OutcomeWriter,
        routes: WebhookRoutes,
        timeout: Duration,
    ) -> Self {
        Self {
            records,
            forwarder,
            outcome_writer,
            routes,
            timeout,
        }
    }

    pub async fn execute(
        &self,
        caller: Option<&CallerIdentity>,
        request: SubmitLargeMessageRequest,
    ) -> Result<SubmitLargeMessageResponse, SubmissionError> {
        let caller = caller.ok_or(SubmissionError::Unauthenticated)?;

        let video = request
            .base64_video
            .filter(|video| !video.is_empty())
            .ok_or_else(|| SubmissionError::InvalidArgument("base64Video is required".to_string()))?;
        let tenant_id = request
            .tenant_id
            .filter(|tenant_id| is_valid_key(tenant_id))
            .ok_or_else(|| {
                SubmissionError::InvalidArgument("a valid tenantId is required".to_string())
            })?;

        let record_id = self.records.allocate_id(&tenant_id);

        let mut extra = Map::new();
        if let Some(lead_id) = request.lead_id {
            extra.insert("leadId".to_string(), Value::String(lead_id));
        }

        let mut record = MessageRecord {
            record_id: record_id.clone(),
            tenant_id: tenant_id.clone(),
            thread_id: request.conversation_id.clone(),
            text: request.text.unwrap_or_default(),
            attachment_type: Some(VIDEO_ATTACHMENT_TYPE.to_string()),
            attachment_payload: None,
            destination_address: request.customer_phone.unwrap_or_default(),
            sender_id: request.sender_uid.unwrap_or_else(|| caller.uid.clone()),
            status: RecordStatus::PendingSend,
            created_at: Utc::now(),
            processed_at: None,
            error_message: None,
            relay_response_status: None,
            extra,
        };

        info!(
            tenant_id = %tenant_id,
            record_id = %record_id,
            caller = %caller.uid,
            video_bytes = video.len(),
            "forwarding large submission"
        );

        let mut payload = OutboundPayload::from_record(&record_id, &tenant_id, &record);
        payload.raw_message.attachment_payload = Some(video);

        let outcome = self
            .forwarder
            .forward(self.routes.endpoint_for(&tenant_id), &payload, self.timeout)
            .await;

        if let DeliveryOutcome::Failed { error_message } = &outcome {
            warn!(
                tenant_id = %tenant_id,
                record_id = %record_id,
                error = %error_message,
                "large submission delivery failed"
            );
        }

        OutcomeUpdate::for_outcome(&record, &outcome, Utc::now()).merge_into(&mut record);
        let record = self.records.insert(record).await?;

        match request.conversation_id.as_deref() {
            Some(conversation_id) => {
                if let Err(err) = self
                    .outcome_writer
                    .update_summary(&tenant_id, conversation_id, &record, record.created_at)
                    .await
                {
                    warn!(
                        tenant_id = %tenant_id,
                        conversation_id,
                        error = %err,
                        "failed to refresh conversation summary"
                    );
                }
            }
            None => info!(
                tenant_id = %tenant_id,
                record_id = %record_id,
                "submission has no conversation, summary untouched"
            ),
        }

        Ok(SubmitLargeMessageResponse {
            success: true,
            id: record_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::{
        domain::{models::ConversationSummary, repositories::ConversationSummaryRepository},
        infrastructure::repositories::in_memory::{
            InMemoryConversationSummaryRepository, InMemoryMessageRecordRepository,
        },
    };

    use super::*;

    struct ScriptedForwarder {
        outcome: DeliveryOutcome,
        payloads: Mutex<Vec<OutboundPayload>>,
    }

    #[async_trait]
    impl Forwarder for ScriptedForwarder {
        async fn forward(
            &self,
            _endpoint: &str,
            payload: &OutboundPayload,
            _timeout: Duration,
        ) -> DeliveryOutcome {
            self.payloads.lock().unwrap().push(payload.clone());
            self.outcome.clone()
        }
    }

    struct Fixture {
        usecase: SubmitLargeMessageUseCase,
        forwarder: Arc<ScriptedForwarder>,
        records: Arc<InMemoryMessageRecordRepository>,
        summaries: Arc<InMemoryConversationSummaryRepository>,
    }

    async fn fixture(outcome: DeliveryOutcome) -> Fixture {
        let records = Arc::new(InMemoryMessageRecordRepository::new());
        let summaries = Arc::new(InMemoryConversationSummaryRepository::new());
        summaries
            .insert(ConversationSummary {
                tenant_id: "acme".to_string(),
                conversation_id: "conv-1".to_string(),
                last_message_preview: "hello".to_string(),
                last_message_at: None,
                unread_count: 3,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let forwarder = Arc::new(ScriptedForwarder {
            outcome,
            payloads: Mutex::new(Vec::new()),
        });
        let usecase = SubmitLargeMessageUseCase::new(
            records.clone(),
            forwarder.clone(),
            OutcomeWriter::new(records.clone(), summaries.clone()),
            WebhookRoutes::new("http://hooks.local"),
            Duration::from_secs(540),
        );
        Fixture {
            usecase,
            forwarder,
            records,
            summaries,
        }
    }

    fn caller() -> CallerIdentity {
        CallerIdentity {
            uid: "agent-1".to_string(),
        }
    }

    fn request() -> SubmitLargeMessageRequest {
        SubmitLargeMessageRequest {
            tenant_id: Some("acme".to_string()),
            conversation_id: Some("conv-1".to_string()),
            text: Some("look".to_string()),
            base64_video: Some("AAAAIGZ0eXBpc29t".to_string()),
            customer_phone: Some("+1555".to_string()),
            sender_uid: Some("agent-1".to_string()),
            lead_id: Some("lead-9".to_string()),
        }
    }

    #[tokio::test]
    async fn unauthenticated_caller_creates_nothing() {
        let fx = fixture(DeliveryOutcome::Delivered { response_status: 200 }).await;

        let err = fx.usecase.execute(None, request()).await.unwrap_err();

        assert!(matches!(err, SubmissionError::Unauthenticated));
        assert_eq!(fx.records.len().await, 0);
        assert!(fx.forwarder.payloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_video_is_invalid_argument() {
        let fx = fixture(DeliveryOutcome::Delivered { response_status: 200 }).await;
        let mut req = request();
        req.base64_video = None;

        let err = fx.usecase.execute(Some(&caller()), req).await.unwrap_err();

        assert_eq!(err.kind(), "InvalidArgument");
        assert_eq!(fx.records.len().await, 0);
    }

    #[tokio::test]
    async fn video_is_relayed_but_not_stored() {
        let fx = fixture(DeliveryOutcome::Delivered { response_status: 201 }).await;

        let response = fx.usecase.execute(Some(&caller()), request()).await.unwrap();
        assert!(response.success);

        let payloads = fx.forwarder.payloads.lock().unwrap().clone();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].interaction_id, response.id);
        assert_eq!(payloads[0].message_type, VIDEO_ATTACHMENT_TYPE);
        assert_eq!(
            payloads[0].raw_message.attachment_payload.as_deref(),
            Some("AAAAIGZ0eXBpc29t")
        );

        let stored = fx.records.get("acme", &response.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Sent);
        assert_eq!(stored.relay_response_status, Some(201));
        assert_eq!(stored.attachment_payload, None);
        assert_eq!(stored.extra.get("leadId"), Some(&Value::String("lead-9".to_string())));
    }

    #[tokio::test]
    async fn failed_delivery_still_reports_success() {
        let fx = fixture(DeliveryOutcome::failed("connection refused")).await;

        let response = fx.usecase.execute(Some(&caller()), request()).await.unwrap();
        assert_eq!(
            response,
            SubmitLargeMessageResponse {
                success: true,
                id: response.id.clone(),
            }
        );

        let stored = fx.records.get("acme", &response.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Error);
        assert_eq!(stored.error_message.as_deref(), Some("connection refused"));
        assert!(stored.processed_at.unwrap() >= stored.created_at);

        let summary = fx.summaries.get("acme", "conv-1").await.unwrap().unwrap();
        assert_eq!(summary.last_message_preview, "🎥 Video");
        assert_eq!(summary.unread_count, 0);
        assert_eq!(summary.last_message_at, Some(stored.created_at));
    }

    #[tokio::test]
    async fn missing_summary_does_not_fail_submission() {
        let fx = fixture(DeliveryOutcome::Delivered { response_status: 200 }).await;
        let mut req = request();
        req.conversation_id = Some("conv-unknown".to_string());

        let response = fx.usecase.execute(Some(&caller()), req).await.unwrap();
        assert!(response.success);
        assert!(fx.summaries.get("acme", "conv-unknown").await.unwrap().is_none());
    }
}
