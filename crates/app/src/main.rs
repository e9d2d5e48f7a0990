//! Gatehouse - Main Entry Point
//!
//! Thin binary wiring the adapters into the session facade. Configuration
//! comes from the environment:
//!
//! - `GATEHOUSE_GRAPHQL_ENDPOINT` - backend GraphQL endpoint (required)
//! - `GATEHOUSE_CLIENT_ID` - OAuth client id (required)
//! - `GATEHOUSE_DATA_DIR` - override for the credential store location
//!
//! With no arguments the binary connects and reports session status;
//! `gatehouse sign-out` ends the persisted session.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_application::{Session, SessionConfig};
use gatehouse_infrastructure::{
    FileCredentialStore, GraphQlTokenExchange, ReqwestHttpClient, SystemClock,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get configuration from environment
    let endpoint = std::env::var("GATEHOUSE_GRAPHQL_ENDPOINT")
        .map_err(|_| "GATEHOUSE_GRAPHQL_ENDPOINT must be set")?;
    let client_id =
        std::env::var("GATEHOUSE_CLIENT_ID").map_err(|_| "GATEHOUSE_CLIENT_ID must be set")?;

    let persistence = match std::env::var("GATEHOUSE_DATA_DIR") {
        Ok(dir) => FileCredentialStore::new(dir),
        Err(_) => FileCredentialStore::in_default_location()?,
    };

    tracing::info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    let session = Session::connect(
        SessionConfig::new(client_id),
        Arc::new(persistence),
        Arc::new(GraphQlTokenExchange::new(endpoint)),
        Arc::new(ReqwestHttpClient::new()?),
        Arc::new(SystemClock::new()),
    )
    .await?;

    let command = std::env::args().nth(1);
    match command.as_deref() {
        Some("sign-out") => {
            session.sign_out().await?;
            println!("Signed out.");
        }
        Some(other) => {
            return Err(format!("unknown command: {other}").into());
        }
        None => match session.current_user() {
            Some(user) => {
                println!("Signed in as {} ({})", user.display_name, user.id);
            }
            None => {
                if session.federated_sign_in().is_some() {
                    println!("Not signed in; federated sign-in is available.");
                } else {
                    println!("Not signed in; no federated identity provider matches.");
                }
            }
        },
    }

    Ok(())
}
