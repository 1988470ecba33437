use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    application::services::forwarder::Forwarder,
    domain::{events::OutboundPayload, models::DeliveryOutcome},
};

/// POSTs payloads as JSON to the configured webhook.
pub struct HttpWebhookForwarder {
    http: Client,
}

impl HttpWebhookForwarder {
    pub fn new() -> anyhow::Result<Arc<Self>> {
        let http = Client::builder()
            .user_agent("message-relay/webhook")
            .build()
            .context("failed to build webhook client")?;
        Ok(Arc::new(Self { http }))
    }

    fn describe(err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("webhook request timed out: {err}")
        } else if err.is_connect() {
            format!("could not connect to webhook endpoint: {err}")
        } else {
            err.to_string()
        }
    }
}

#[async_trait]
impl Forwarder for HttpWebhookForwarder {
    async fn forward(
        &self,
        endpoint: &str,
        payload: &OutboundPayload,
        timeout: Duration,
    ) -> DeliveryOutcome {
        let result = self
            .http
            .post(endpoint)
            .timeout(timeout)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => DeliveryOutcome::Delivered {
                response_status: response.status().as_u16(),
            },
            Err(err) => DeliveryOutcome::failed(Self::describe(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use crate::domain::models::MessageRecord;

    use super::*;

    fn payload() -> OutboundPayload {
        let mut record = MessageRecord::pending("acme", "+1555", "agent-1", "hi");
        record.record_id = "r-1".to_string();
        OutboundPayload::from_record("r-1", "acme", &record)
    }

    #[tokio::test]
    async fn posts_json_and_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let forwarder = HttpWebhookForwarder::new().unwrap();
        let outcome = forwarder
            .forward(&format!("{}/hook", server.uri()), &payload(), Duration::from_secs(5))
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { response_status: 200 });

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert_eq!(body["interactionId"], "r-1");
        assert_eq!(body["messageType"], "text");
    }

    #[tokio::test]
    async fn error_status_still_counts_as_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let forwarder = HttpWebhookForwarder::new().unwrap();
        let outcome = forwarder
            .forward(&server.uri(), &payload(), Duration::from_secs(5))
            .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { response_status: 503 });
    }

    #[tokio::test]
    async fn slow_endpoint_times_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .mount(&server)
            .await;

        let forwarder = HttpWebhookForwarder::new().unwrap();
        let outcome = forwarder
            .forward(&server.uri(), &payload(), Duration::from_millis(100))
            .await;

        match outcome {
            DeliveryOutcome::Failed { error_message } => {
                assert!(error_message.contains("timed out"), "{error_message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refused_connection_is_a_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = HttpWebhookForwarder::new().unwrap();
        let outcome = forwarder
            .forward(&format!("http://{addr}/hook"), &payload(), Duration::from_secs(2))
            .await;

        assert!(!outcome.is_delivered());
    }
}
