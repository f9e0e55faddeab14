// vispr: serves a workspace directory over the JSON API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vispr_common::loader::load_workspace;
use vispr_server::{
    api::ApiState,
    build_app,
    config::{CliArgs, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().apply_args(CliArgs::parse());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    let workspace_dir = config.workspace_dir.clone();
    let workspace = tokio::task::spawn_blocking(move || load_workspace(&workspace_dir))
        .await
        .context("workspace loader task failed")?
        .with_context(|| format!("failed to load workspace {}", config.workspace_dir.display()))?;

    info!(
        workspace = %config.workspace_dir.display(),
        projects = workspace.project_count(),
        debug = config.debug,
        "workspace loaded"
    );

    let app = build_app(ApiState::new(Arc::new(workspace), config.debug), &config);

    let listen_addr = config.listen_addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind listener on {listen_addr}"))?;

    info!(listen_addr = %listen_addr, "starting vispr server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("vispr server exited unexpectedly")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
