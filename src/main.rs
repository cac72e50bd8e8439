mod auth;
mod config;
mod connector;
mod error;
mod handlers;
mod models;
mod routes;
mod sse;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use warp::Filter;

use config::ServerConfig;
use connector::create_connector;
use error::handle_rejection;
use routes::configure_routes;
use store::ChatStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let connector = match create_connector(&config.connector) {
        Ok(connector) => connector,
        Err(e) => {
            tracing::error!(error = %e, "could not create connector");
            std::process::exit(1);
        }
    };

    let store = Arc::new(ChatStore::new());
    let api = configure_routes(store, connector);
    let addr = ([0, 0, 0, 0], config.port);

    tracing::info!(port = config.port, "starting server");
    match config.static_dir {
        // Production mode: serve the SPA bundle next to the API, with a
        // catch-all fallback to index.html for client-side routing
        Some(dir) => {
            let spa = warp::fs::dir(dir.clone()).or(warp::fs::file(dir.join("index.html")));
            warp::serve(api.or(spa).recover(handle_rejection))
                .run(addr)
                .await;
        }
        None => {
            warp::serve(api.recover(handle_rejection)).run(addr).await;
        }
    }
}
