use std::sync::Arc;

use anyhow::Context;
use message_relay::{
    application::{
        handlers::{outcome_writer::OutcomeWriter, relay_trigger::RelayTrigger},
        services::{
            event_bus::RecordEventBus,
            forwarder::Forwarder,
            jwt::{JwtService, JwtServiceConfig},
        },
        usecases::{
            create_record::CreateRecordUseCase, get_record::GetRecordUseCase,
            submit_large_message::SubmitLargeMessageUseCase,
        },
    },
    config::Config,
    domain::repositories::{ConversationSummaryRepository, MessageRecordRepository},
    infrastructure::{
        messaging::{in_process::InProcessBus, jetstream::JetstreamBus, webhook::HttpWebhookForwarder},
        repositories::{
            in_memory::{InMemoryConversationSummaryRepository, InMemoryMessageRecordRepository},
            postgres::{PostgresConversationSummaryRepository, PostgresMessageRecordRepository},
        },
    },
    presentation::http::endpoints::{
        health::HealthEndpoints, messages::MessagesEndpoints, root::ApiState,
        submissions::SubmissionsEndpoints,
    },
};
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::try_parse()?;

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);

    // Collaborators are built once here and handed to every component.
    let (records, summaries): (
        Arc<dyn MessageRecordRepository>,
        Arc<dyn ConversationSummaryRepository>,
    ) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect_lazy(url)
                .context("invalid DATABASE_URL")?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            info!("using postgres record store");
            let records: Arc<dyn MessageRecordRepository> =
                PostgresMessageRecordRepository::new(pool.clone());
            let summaries: Arc<dyn ConversationSummaryRepository> =
                PostgresConversationSummaryRepository::new(pool);
            (records, summaries)
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory");
            let records: Arc<dyn MessageRecordRepository> =
                Arc::new(InMemoryMessageRecordRepository::new());
            let summaries: Arc<dyn ConversationSummaryRepository> =
                Arc::new(InMemoryConversationSummaryRepository::new());
            (records, summaries)
        }
    };

    let forwarder: Arc<dyn Forwarder> = HttpWebhookForwarder::new()?;
    let outcome_writer = OutcomeWriter::new(records.clone(), summaries.clone());

    let trigger = Arc::new(RelayTrigger::new(
        forwarder.clone(),
        outcome_writer.clone(),
        config.webhooks.clone(),
        config.timeouts.text,
    ));

    let bus: Arc<dyn RecordEventBus> = match &config.jetstream {
        Some(jetstream) => {
            let (bus, worker) = JetstreamBus::new(jetstream)
                .await
                .context("failed to connect to jetstream")?;
            worker.spawn(trigger.clone());
            info!(stream = %jetstream.stream, "relay trigger consuming from jetstream");
            bus
        }
        None => {
            warn!("NATS_URL not set, activations are delivered in process");
            InProcessBus::new(trigger.clone())
        }
    };

    let jwt = JwtService::new(JwtServiceConfig {
        secret: config.jwt_secret.clone(),
        expiration: std::time::Duration::from_secs(3600),
    });

    let state = Arc::new(ApiState {
        create_record_usecase: Arc::new(CreateRecordUseCase::new(records.clone(), bus)),
        get_record_usecase: Arc::new(GetRecordUseCase::new(records.clone())),
        submit_large_message_usecase: Arc::new(SubmitLargeMessageUseCase::new(
            records,
            forwarder,
            outcome_writer,
            config.webhooks.clone(),
            config.timeouts.large_payload,
        )),
        jwt,
    });

    info!("Starting server at {}", server_url);

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            MessagesEndpoints::new(state.clone()),
            SubmissionsEndpoints::new(state),
        ),
        "Message Relay API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await
        .context("server stopped")
}
