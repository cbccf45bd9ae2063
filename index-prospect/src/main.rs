//! Prospect indexing service.
//!
//! Subscribes to `events.prospect.signedup` and writes every sign-up into the
//! `prospects` Elasticsearch index until the subscription ends or Ctrl+C.
//!
//! # Environment
//!
//! - `MESSAGE_QUEUE_URL` (default `nats://localhost:4222`)
//! - `ELASTICSEARCH_URL` (default `http://localhost:9200`)
//! - `METRICS_ADDR`: serve Prometheus metrics on this address when set
//! - `RUST_LOG`: log filter (default `info`)
//!
//! A `.env` file in the working directory is loaded first if present.

use anyhow::Context;
use product_launch_core::config::Config;
use product_launch_core::events::ProspectSignedUpEvent;
use product_launch_core::message::Message;
use product_launch_core::metrics::describe_metrics;
use product_launch_core::search_index::SearchIndex;
use product_launch_elasticsearch::ElasticsearchIndex;
use product_launch_nats::NatsEventBus;
use product_launch_projections::{IndexingConsumer, PROSPECTS_INDEX, ProspectIndexProjection};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,product_launch=debug,index_prospect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        message_queue_url = %config.message_queue_url,
        elasticsearch_url = %config.elasticsearch_url,
        "Starting index-prospect"
    );

    if let Some(addr) = config.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        describe_metrics();
        tracing::info!(%addr, "Prometheus metrics available at /metrics");
    }

    let index = Arc::new(
        ElasticsearchIndex::new(&config.elasticsearch_url)
            .context("failed to create Elasticsearch client")?,
    );
    index
        .create_index(PROSPECTS_INDEX)
        .await
        .with_context(|| format!("failed to create index '{PROSPECTS_INDEX}'"))?;

    let bus = Arc::new(
        NatsEventBus::builder()
            .url(&config.message_queue_url)
            .connection_name("index-prospect")
            .build(),
    );

    let (mut consumer, shutdown) = IndexingConsumer::new(ProspectIndexProjection::new(index), bus);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received, shutting down");
                shutdown.shutdown();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
    });

    let stats = consumer
        .run(ProspectSignedUpEvent::SUBJECT)
        .await
        .context("consumer failed to start")?;

    tracing::info!(
        received = stats.received,
        indexed = stats.indexed,
        "index-prospect stopped"
    );
    Ok(())
}
