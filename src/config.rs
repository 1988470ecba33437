use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::{
    application::services::forwarder::{ForwardTimeouts, WebhookRoutes},
    infrastructure::messaging::jetstream::JetstreamConfig,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("An error occured while getting {0} env param")]
    Missing(&'static str),
    #[error("An error occured while parsing {0} env param: {1}")]
    Invalid(&'static str, String),
}

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub webhooks: WebhookRoutes,
    pub timeouts: ForwardTimeouts,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub jetstream: Option<JetstreamConfig>,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut webhooks = WebhookRoutes::new(required("RELAY_WEBHOOK_URL")?);
        if let Some(overrides) = optional("RELAY_TENANT_WEBHOOKS") {
            for entry in overrides.split(',').filter(|entry| !entry.trim().is_empty()) {
                let (tenant, url) = entry.split_once('=').ok_or_else(|| {
                    ConfigError::Invalid("RELAY_TENANT_WEBHOOKS", format!("'{entry}' is not tenant=url"))
                })?;
                webhooks = webhooks.with_tenant(tenant.trim(), url.trim());
            }
        }

        let defaults = ForwardTimeouts::default();
        let timeouts = ForwardTimeouts {
            text: parse_or("RELAY_TEXT_TIMEOUT_SECS", optional("RELAY_TEXT_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.text),
            large_payload: parse_or(
                "RELAY_LARGE_PAYLOAD_TIMEOUT_SECS",
                optional("RELAY_LARGE_PAYLOAD_TIMEOUT_SECS"),
            )?
            .map(Duration::from_secs)
            .unwrap_or(defaults.large_payload),
        };

        let jetstream = match optional("NATS_URL") {
            Some(url) => Some(JetstreamConfig {
                url,
                stream: optional("NATS_STREAM").unwrap_or_else(|| "RELAY_RECORDS".to_string()),
                subject_prefix: optional("NATS_SUBJECT_PREFIX")
                    .unwrap_or_else(|| "relay.tenant".to_string()),
                durable: optional("NATS_DURABLE").unwrap_or_else(|| "relay-trigger".to_string()),
                pull_batch: parse_or("NATS_PULL_BATCH", optional("NATS_PULL_BATCH"))?.unwrap_or(32),
                ack_wait_seconds: parse_or("NATS_ACK_WAIT_SECS", optional("NATS_ACK_WAIT_SECS"))?
                    .unwrap_or(600),
            }),
            None => None,
        };

        let port = required("PORT")?
            .trim()
            .parse::<u16>()
            .map_err(|err| ConfigError::Invalid("PORT", err.to_string()))?;

        Ok(Config {
            port,
            scheme: required("SCHEME")?,
            host: required("HOST")?,
            webhooks,
            timeouts,
            jwt_secret: required("JWT_SECRET")?,
            database_url: optional("DATABASE_URL"),
            jetstream,
        })
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|err| ConfigError::Invalid(key, err.to_string()))
        })
        .transpose()
}
