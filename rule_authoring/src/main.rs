//! Entry point for the Rule Authoring binary.
//!
//! Running this binary starts an HTTP server exposing the rule builder
//! API.  Configuration comes from the environment; see
//! [`rule_authoring::config`] for the variables.  Log output is
//! controlled by `RUST_LOG` and defaults to `info`.

use rule_authoring::config::ServerConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = ServerConfig::from_env();
    if let Err(err) = rule_authoring::api::serve(&config).await {
        error!(%err, "error running server");
        std::process::exit(1);
    }
}
