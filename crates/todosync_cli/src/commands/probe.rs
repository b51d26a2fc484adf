//! Probe command implementation.

use std::sync::Arc;
use std::time::Duration;
use todosync_client::{EndpointResolver, ReqwestClient};
use todosync_protocol::EndpointConfig;

/// Resolves the service endpoint and prints it.
pub async fn run(
    endpoint: EndpointConfig,
    timeout_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(ReqwestClient::new()?);
    let resolver = EndpointResolver::new(endpoint, client, Duration::from_millis(timeout_ms));
    println!("{}", resolver.resolve().await);
    Ok(())
}
