// SPDX-License-Identifier: MIT

//! ChitChat API Server
//!
//! One-to-one messaging backend: phone-number discovery, deduplicated
//! chat threads, and live per-user thread views over Firestore.

use chitchat_server::{
    config::Config,
    db::{DirectoryStore, FirestoreChatDb, ThreadStore},
    services::{FirebaseIdentity, MembershipResolver, SessionManager},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting ChitChat API");

    // Initialize the Firestore-backed stores
    let db = FirestoreChatDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");
    let directory: Arc<dyn DirectoryStore> = Arc::new(db.clone());
    let threads: Arc<dyn ThreadStore> = Arc::new(db);

    // Identity gateway (Identity Toolkit REST API)
    let identity = Arc::new(FirebaseIdentity::new(&config.identity_api_key));
    tracing::info!("Identity gateway initialized");

    let resolver = MembershipResolver::new(Arc::clone(&directory), Arc::clone(&threads));
    let sessions = SessionManager::new(identity, Arc::clone(&directory), Arc::clone(&threads));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        directory,
        threads,
        resolver,
        sessions,
    });

    // Build router
    let app = chitchat_server::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chitchat_server=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
