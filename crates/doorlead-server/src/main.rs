mod api;
mod middleware;
mod notify;
mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState, WebhookSecrets};
use crate::notify::Notifications;
use crate::rate_limit::{RateLimiter, SlidingWindowLimiter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = doorlead_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = doorlead_db::PoolConfig::from_app_config(&config);
    let pool = doorlead_db::connect_pool(&config.database_url, pool_config).await?;
    doorlead_db::run_migrations(&pool).await?;

    let markets = Arc::new(doorlead_core::load_markets(&config.locations_path)?);
    tracing::info!(
        locations = markets.location_count(),
        "market directory loaded"
    );

    let meta = Arc::new(doorlead_meta::MetaClient::from_config(&config)?);

    let resend = match config.resend_api_key.as_deref() {
        Some(key) => Some(doorlead_email::ResendClient::new(key)?),
        None => {
            tracing::warn!("RESEND_API_KEY not set; email notifications disabled");
            None
        }
    };
    let notifier = Arc::new(Notifications::new(
        resend,
        Arc::clone(&markets),
        config.master_email.clone(),
        config.from_email.clone(),
    ));

    let blob = match config.blob_rw_token.as_deref() {
        Some(token) => Some(Arc::new(doorlead_blob::BlobClient::new(token)?)),
        None => {
            tracing::warn!("BLOB_READ_WRITE_TOKEN not set; image uploads disabled");
            None
        }
    };

    let limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    let state = AppState {
        pool,
        limiter,
        meta,
        notifier,
        blob,
        markets,
        secrets: WebhookSecrets {
            leadbridge: config.leadbridge_secret.clone(),
            zapier: config.zapier_secret.clone(),
        },
    };

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
