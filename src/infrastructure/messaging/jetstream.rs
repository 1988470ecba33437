use std::sync::Arc;
use std::time::Duration;

use async_nats::{
    HeaderMap,
    jetstream::{
        self,
        consumer::{AckPolicy, PullConsumer, pull},
    },
};
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::StreamExt;
use tracing::{error, warn};

use crate::{
    application::{handlers::relay_trigger::RelayTrigger, services::event_bus::RecordEventBus},
    domain::events::RecordCreatedEvent,
};

#[derive(Clone, Debug)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject_prefix: String,
    pub durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
}

impl JetstreamConfig {
    /// `{prefix}.{tenant_id}.records.{record_id}`
    pub fn subject_for(&self, tenant_id: &str, record_id: &str) -> String {
        format!("{}.{}.records.{}", self.subject_prefix, tenant_id, record_id)
    }
}

pub struct JetstreamBus {
    context: jetstream::Context,
    config: JetstreamConfig,
}

impl JetstreamBus {
    pub async fn new(config: &JetstreamConfig) -> anyhow::Result<(Arc<Self>, JetstreamWorker)> {
        let client = async_nats::connect(&config.url).await?;
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: vec![format!("{}.>", config.subject_prefix)],
                ..Default::default()
            })
            .await?;

        let consumer = stream
            .get_or_create_consumer(
                &config.durable,
                pull::Config {
                    durable_name: Some(config.durable.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(config.ack_wait_seconds),
                    // Redelivery would mean a second forward attempt.
                    max_deliver: 1,
                    ..Default::default()
                },
            )
            .await?;

        let bus = Arc::new(Self {
            context,
            config: config.clone(),
        });

        let worker = JetstreamWorker {
            consumer,
            pull_batch: config.pull_batch,
        };

        Ok((bus, worker))
    }
}

#[async_trait::async_trait]
impl RecordEventBus for JetstreamBus {
    async fn publish_created(&self, event: RecordCreatedEvent) -> anyhow::Result<()> {
        let subject = self.config.subject_for(&event.tenant_id, &event.record_id);
        let mut headers = HeaderMap::new();
        headers.insert("Nats-Msg-Id", event.dedup_key().as_str());
        let payload = serde_json::to_vec(&event)?;
        self.context
            .publish_with_headers(subject, headers, payload.into())
            .await?
            .await?;
        Ok(())
    }
}

const MAX_PULL_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before the next pull after `failed_pulls` consecutive failures:
/// doubles from 500ms, capped at [`MAX_PULL_BACKOFF`].
fn pull_backoff(failed_pulls: u32) -> Duration {
    let exponent = failed_pulls.saturating_sub(1).min(16);
    Duration::from_millis(500)
        .saturating_mul(1 << exponent)
        .min(MAX_PULL_BACKOFF)
}

pub struct JetstreamWorker {
    consumer: PullConsumer,
    pull_batch: usize,
}

impl JetstreamWorker {
    pub fn spawn(self, trigger: Arc<RelayTrigger>) -> JoinHandle<()> {
        tokio::spawn(self.run(trigger))
    }

    async fn run(self, trigger: Arc<RelayTrigger>) {
        let mut failed_pulls = 0u32;
        loop {
            let mut batch = match self
                .consumer
                .batch()
                .max_messages(self.pull_batch)
                .messages()
                .await
            {
                Ok(batch) => {
                    failed_pulls = 0;
                    batch
                }
                Err(err) => {
                    failed_pulls = failed_pulls.saturating_add(1);
                    let delay = pull_backoff(failed_pulls);
                    error!(
                        error = ?err,
                        failed_pulls,
                        retry_in_ms = delay.as_millis() as u64,
                        "jetstream pull failed"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            // One independent task per activation; the batch only bounds how
            // many are pulled at a time.
            let mut tasks = JoinSet::new();
            while let Some(message) = batch.next().await {
                match message {
                    Ok(msg) => {
                        tasks.spawn(Self::process_message(msg, trigger.clone()));
                    }
                    Err(err) => {
                        warn!(error = ?err, "jetstream batch error");
                    }
                }
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => error!(error = ?err, "failed to process activation"),
                    Err(err) => error!(error = ?err, "activation task panicked"),
                }
            }
        }
    }

    async fn process_message(
        message: jetstream::Message,
        trigger: Arc<RelayTrigger>,
    ) -> anyhow::Result<()> {
        let handled = match serde_json::from_slice::<RecordCreatedEvent>(&message.payload) {
            Ok(event) => trigger.handle(event).await.map(|_| ()),
            Err(err) => {
                warn!(
                    subject = %message.subject,
                    error = %err,
                    "malformed creation event, ignoring"
                );
                Ok(())
            }
        };

        // Always ack: delivery failures live on the record, never in redelivery.
        if let Err(err) = message.ack().await {
            return Err(anyhow::anyhow!("failed to ack message: {}", err));
        }
        handled
    }
}
