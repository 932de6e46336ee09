use devtools_hub::infra::ensure_crypto_provider;
use devtools_hub::shared::timing::process_clock;
use devtools_hub::{router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devtools_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    ensure_crypto_provider();
    // Anchor for the millisecond timestamps reported by the proxy.
    process_clock();

    let config = Config::from_env();
    let addr = config.bind_addr();
    let app = router(AppState::default());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await
}
