// SPDX-License-Identifier: MIT

use chitchat_server::config::Config;
use chitchat_server::db::{DirectoryStore, MemoryChatDb, ThreadStore};
use chitchat_server::models::UserProfile;
use chitchat_server::routes::create_router;
use chitchat_server::services::{InMemoryIdentity, MembershipResolver, SessionManager};
use chitchat_server::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Create a test app backed by in-memory stores and gateway.
/// Returns the router, the shared state, and the store for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryChatDb) {
    let db = MemoryChatDb::new();
    let (state, _) = test_state_with_db(db.clone());
    (create_router(state.clone()), state, db)
}

/// Build `AppState` over a given memory store. Also returns the
/// identity gateway for direct credential seeding.
#[allow(dead_code)]
pub fn test_state_with_db(db: MemoryChatDb) -> (Arc<AppState>, Arc<InMemoryIdentity>) {
    let directory: Arc<dyn DirectoryStore> = Arc::new(db.clone());
    let threads: Arc<dyn ThreadStore> = Arc::new(db);
    let identity = Arc::new(InMemoryIdentity::new());

    let resolver = MembershipResolver::new(Arc::clone(&directory), Arc::clone(&threads));
    let sessions = SessionManager::new(
        identity.clone(),
        Arc::clone(&directory),
        Arc::clone(&threads),
    );

    (
        Arc::new(AppState {
            config: Config::test_default(),
            directory,
            threads,
            resolver,
            sessions,
        }),
        identity,
    )
}

#[allow(dead_code)]
pub fn profile(user_id: &str, phone: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        name: format!("User {user_id}"),
        phone_number: phone.to_string(),
        image_url: None,
    }
}

/// Wait until the live view satisfies `predicate`, or panic after two
/// seconds. Bounded stand-in for "eventually".
#[allow(dead_code)]
pub async fn wait_for_view<F>(
    view: &mut watch::Receiver<chitchat_server::services::LiveViewState>,
    predicate: F,
) where
    F: Fn(&chitchat_server::services::LiveViewState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if predicate(&view.borrow_and_update()) {
                return;
            }
            view.changed().await.expect("view cell dropped");
        }
    })
    .await
    .expect("live view never reached expected state");
}
