use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit, http::HeaderName};
use clap::Parser;
use config::EnvConfig;
use state::{AppState, SharedState};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use tracing_subscriber::filter::EnvFilter;

mod api;
mod config;
mod error;
mod state;
mod validation;

const UPLOADS_PREFIX: &str = "/uploads";
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// yaml file containing the configuration for each environment
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,
    /// name of the environment to run, e.g. `dev` or `prod`
    #[arg(short, long, default_value = "dev")]
    pub env: String,
}

/// Assemble the full application: the api routes, static access to uploaded
/// images, and the request tracing layers.
pub fn app(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new()
        .merge(api::router())
        .nest_service(UPLOADS_PREFIX, ServeDir::new(state.upload_dir()))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("ECOLETAWEB_LOG"))
        .init();
    let args = Cli::parse();
    let env = EnvConfig::load(&args.config, &args.env)?;
    debug!("using environment '{}' with database '{}'", args.env, env.database);

    let listen = env.listen.clone();
    let shared_state = Arc::new(SharedState::new(env).await?);

    let listener = tokio::net::TcpListener::bind((listen.host.as_str(), listen.port))
        .await
        .with_context(|| format!("Unable to listen on {}:{}", listen.host, listen.port))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(shared_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            warn!("Unable to listen for the shutdown signal: {e}");
            std::future::pending::<()>().await
        }
    }
}

/// Build the application around a test database. The returned directory
/// holds uploaded files and is removed when dropped.
#[cfg(test)]
pub(crate) fn test_app(
    pool: sqlx::Pool<sqlx::Sqlite>,
) -> Result<(Router, AppState, tempfile::TempDir)> {
    let uploads = tempfile::tempdir()?;
    let state = Arc::new(SharedState::test(pool, uploads.path()));
    Ok((app(state.clone()), state, uploads))
}
