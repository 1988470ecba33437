use async_trait::async_trait;

use crate::domain::events::RecordCreatedEvent;

#[async_trait]
pub trait RecordEventBus: Send + Sync {
    async fn publish_created(&self, event: RecordCreatedEvent) -> anyhow::Result<()>;
}
