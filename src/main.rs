use std::sync::Arc;

use console::api::rancher::RancherClient;
use console::config::ConsoleConfig;
use console::gate::product::{ClusterRoutePrefix, ProductTracker};
use console::product::ProductRegistry;
use console::routes;
use console::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ConsoleConfig::from_env().expect("invalid console configuration");
    let client = RancherClient::new(&config.api_url, config.timeouts).expect("failed to build API client");
    let port = config.port;

    let state = AppState::new(
        config,
        Arc::new(client),
        ProductRegistry::builtin(),
        ProductTracker::new(Box::new(ClusterRoutePrefix)),
    );

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "console listening");
    axum::serve(listener, app).await.expect("server failed");
}
