use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slack_dispatch::config::Config;
use slack_dispatch::server::{AppState, build_router};
use slack_dispatch::slack::SlackClient;
use slack_dispatch::webhooks::default_registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slack_dispatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let registry = default_registry().context("registering handlers")?;
    tracing::info!(handlers = registry.len(), "Registered handlers");

    let slack = SlackClient::with_api_base(config.bot_token, config.api_base);
    let app = build_router(AppState::new(config.signing_secret, registry, slack));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!("listening on {}", config.listen_addr);

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
