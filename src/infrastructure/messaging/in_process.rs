use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::{
    application::{handlers::relay_trigger::RelayTrigger, services::event_bus::RecordEventBus},
    domain::events::RecordCreatedEvent,
};

/// Delivers creation events straight to the trigger, one task per event.
/// Used when no NATS server is configured.
pub struct InProcessBus {
    trigger: Arc<RelayTrigger>,
}

impl InProcessBus {
    pub fn new(trigger: Arc<RelayTrigger>) -> Arc<Self> {
        Arc::new(Self { trigger })
    }
}

#[async_trait]
impl RecordEventBus for InProcessBus {
    async fn publish_created(&self, event: RecordCreatedEvent) -> anyhow::Result<()> {
        let trigger = self.trigger.clone();
        tokio::spawn(async move {
            let tenant_id = event.tenant_id.clone();
            let record_id = event.record_id.clone();
            if let Err(err) = trigger.handle(event).await {
                error!(%tenant_id, %record_id, error = ?err, "failed to process activation");
            }
        });
        Ok(())
    }
}
