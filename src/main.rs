use reel_info_api::{config::Config, server, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        upstream = %config.upstream_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        origins = ?config.allowed_origins,
        "configuration loaded"
    );

    let state = AppState::new(config)?;
    server::serve(state).await?;
    Ok(())
}
