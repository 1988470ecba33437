use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{events::OutboundPayload, models::DeliveryOutcome};

/// Sends one payload to one endpoint, exactly once.
///
/// Implementations never retry and never fail: transport problems are
/// reported as [`DeliveryOutcome::Failed`].
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        endpoint: &str,
        payload: &OutboundPayload,
        timeout: Duration,
    ) -> DeliveryOutcome;
}

/// Webhook endpoints resolved once at startup, with optional per-tenant overrides.
#[derive(Debug, Clone)]
pub struct WebhookRoutes {
    default_endpoint: String,
    tenant_endpoints: HashMap<String, String>,
}

impl WebhookRoutes {
    pub fn new(default_endpoint: impl Into<String>) -> Self {
        Self {
            default_endpoint: default_endpoint.into(),
            tenant_endpoints: HashMap::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.tenant_endpoints.insert(tenant_id.into(), endpoint.into());
        self
    }

    pub fn endpoint_for(&self, tenant_id: &str) -> &str {
        self.tenant_endpoints
            .get(tenant_id)
            .map(String::as_str)
            .unwrap_or(&self.default_endpoint)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForwardTimeouts {
    pub text: Duration,
    pub large_payload: Duration,
}

impl Default for ForwardTimeouts {
    fn default() -> Self {
        Self {
            text: Duration::from_secs(30),
            large_payload: Duration::from_secs(540),
        }
    }
}
