//! Serve command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use todosync_protocol::EndpointConfig;
use todosync_server::{http, AuthConfig, ServerConfig, TodoServer};
use tracing::{info, warn};

/// Picks the signing key: the configured secret, or a random one that lives
/// as long as the process.
pub fn auth_config(secret: Option<String>) -> AuthConfig {
    match secret {
        Some(secret) if !secret.is_empty() => AuthConfig::new(secret.into_bytes()),
        _ => {
            warn!(
                "no signing secret configured, using a random one; \
                 credentials will not survive a restart"
            );
            AuthConfig::generate()
        }
    }
}

/// Runs the server until Ctrl-C.
pub async fn run(
    endpoint: EndpointConfig,
    secret: Option<String>,
    data_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::new(endpoint, auth_config(secret));
    if let Some(path) = data_file {
        info!("persisting state to {}", path.display());
        config = config.with_data_file(path);
    }

    let listener = http::bind(&config.endpoint).await?;
    let server = Arc::new(TodoServer::new(config)?);
    http::serve_with_shutdown(server, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!("server stopped");
    Ok(())
}
