#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    error::{BindListenerSnafu, RosterResult, ServeSnafu},
    state::RosterState,
};
use snafu::ResultExt;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod routes;
mod state;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(?e, "Unable to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(?e, "Unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

async fn run(config: RuntimeConfiguration) -> RosterResult<()> {
    let server_ip = config.server_config().address;
    let state = RosterState::new(config);
    state.warm_up().await;

    let app = routes::router(state.clone());

    let listener = TcpListener::bind(server_ip)
        .await
        .context(BindListenerSnafu { addr: server_ip })?;

    info!(?server_ip, "Listening");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(ServeSnafu);

    state.sensible_shutdown().await;
    served
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    if let Err(e) = tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    ) {
        eprintln!("unable to set tracing subscriber: {e}");
    }

    info!("`tracing` online");
    if let Err(e) = dotenv_result {
        debug!(?e, "No .env file loaded");
    }

    let config = match RuntimeConfiguration::new() {
        Ok(config) => config,
        Err(e) => {
            error!(%e, "Unable to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!(?e, "{e}");
        std::process::exit(1);
    }
}
