use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    application::{
        handlers::outcome_writer::OutcomeWriter,
        services::forwarder::{Forwarder, WebhookRoutes},
    },
    domain::{
        events::{OutboundPayload, RecordCreatedEvent},
        models::{DeliveryOutcome, RecordStatus},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The activation carried no record.
    MissingData,
    /// The record was not `pending_send` when the activation arrived.
    Ineligible(RecordStatus),
    /// The record was forwarded; `written` is false if another writer got
    /// there first.
    Relayed {
        outcome: DeliveryOutcome,
        written: bool,
    },
}

/// Handles one record-creation activation.
///
/// Acts only on the record as carried by the activation and never re-reads
/// it. Single delivery of activations is assumed; the conditional outcome
/// write keeps duplicates from producing a second terminal status.
pub struct RelayTrigger {
    forwarder: Arc<dyn Forwarder>,
    outcome_writer: OutcomeWriter,
    routes: WebhookRoutes,
    timeout: Duration,
}

impl RelayTrigger {
    pub fn new(
        forwarder: Arc<dyn Forwarder>,
        outcome_writer: OutcomeWriter,
        routes: WebhookRoutes,
        timeout: Duration,
    ) -> Self {
        Self {
            forwarder,
            outcome_writer,
            routes,
            timeout,
        }
    }

    pub async fn handle(&self, event: RecordCreatedEvent) -> anyhow::Result<TriggerOutcome> {
        let tenant_id = event.tenant_id.as_str();
        let record_id = event.record_id.as_str();

        let Some(record) = event.record.as_ref() else {
            warn!(tenant_id, record_id, "creation event without record data, ignoring");
            return Ok(TriggerOutcome::MissingData);
        };

        if !record.status.is_pending() {
            debug!(
                tenant_id,
                record_id,
                status = record.status.as_str(),
                "record not pending_send, skipping"
            );
            return Ok(TriggerOutcome::Ineligible(record.status.clone()));
        }

        info!(tenant_id, record_id, "relaying record");

        let payload = OutboundPayload::from_record(record_id, tenant_id, record);
        let outcome = self
            .forwarder
            .forward(self.routes.endpoint_for(tenant_id), &payload, self.timeout)
            .await;

        match &outcome {
            DeliveryOutcome::Delivered { response_status } => {
                info!(tenant_id, record_id, response_status, "webhook responded")
            }
            DeliveryOutcome::Failed { error_message } => {
                warn!(tenant_id, record_id, error = %error_message, "webhook delivery failed")
            }
        }

        let written = self
            .outcome_writer
            .apply_outcome(tenant_id, record_id, record, &outcome)
            .await?
            .is_some();

        Ok(TriggerOutcome::Relayed { outcome, written })
    }
}
