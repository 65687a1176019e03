use std::sync::Arc;

use pifood_auth::config::AppConfig;
use pifood_auth::identity::{NetworkAuthenticator, PiNetwork, RemoteIdentity};
use pifood_auth::routes;
use pifood_auth::state::AppContext;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let remote = Arc::new(RemoteIdentity::new(&config.identity).expect("identity client init failed"));

    // Network login is optional: the fallback identity is simply unavailable without it.
    let network = match config.network.as_ref().map(PiNetwork::new) {
        Some(Ok(client)) => {
            tracing::info!(base_url = %client.base_url(), "network login configured");
            Some(Arc::new(client) as Arc<dyn NetworkAuthenticator>)
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "network login client init failed; fallback login disabled");
            None
        }
        None => None,
    };

    let ctx = AppContext::new(remote.clone(), remote, network, config.navigation.clone());

    if let Some(token) = config.refresh_token.as_deref() {
        match ctx.store.restore(token).await {
            Ok(session) => tracing::info!(user_id = %session.user_id(), "session restored from refresh token"),
            Err(e) => tracing::warn!(error = %e, "refresh token restore failed; starting signed out"),
        }
    }

    let app = routes::app(ctx);
    let addr = std::net::SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");

    tracing::info!(%addr, "pifood-auth listening");
    axum::serve(listener, app).await.expect("server failed");
}
