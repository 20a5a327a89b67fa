use std::io::Read;
use std::sync::Arc;

use anyhow::Context;

use bounce_relay::config::{BlobSource, RelayConfig};
use bounce_relay::delivery::SmtpDelivery;
use bounce_relay::directory::LdapConnector;
use bounce_relay::email::MailParser;
use bounce_relay::notify::HttpTemplateNotifier;
use bounce_relay::pipeline::{DeliveryOrchestrator, InvocationHandler};
use bounce_relay::storage::{BlobStore, FsBlobStore, HttpBlobStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env().context("Failed to load configuration")?;

    // Event JSON from the first argument, or stdin
    let event = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event file {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.blobs {
        BlobSource::Filesystem(root) => Arc::new(FsBlobStore::new(root)),
        BlobSource::Http(base_url) => Arc::new(HttpBlobStore::new(base_url)),
    };

    let orchestrator = DeliveryOrchestrator::new(
        Arc::new(SmtpDelivery::new(&config.delivery)),
        Arc::new(HttpTemplateNotifier::new(&config.notifier)),
        config.bounce.clone(),
    )
    .with_timeouts(config.directory.query_timeout, config.delivery.timeout);

    let handler = InvocationHandler::new(
        blobs,
        Arc::new(MailParser),
        Arc::new(LdapConnector::new(config.directory.clone())),
        orchestrator,
    );

    let status = handler.handle(&event).await;
    println!("{}", serde_json::to_string(&status)?);

    if status.status_code >= 500 {
        std::process::exit(1);
    }
    Ok(())
}
