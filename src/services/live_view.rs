// SPDX-License-Identifier: MIT

//! Live view synchronizer.
//!
//! Maintains, per signed-in user, a continuously updated list of the
//! threads that user participates in. The list lives in a
//! `tokio::sync::watch` cell; a spawned task folds the thread store's
//! change feed into the cell until the subscription is dropped.

use crate::db::ThreadStore;
use crate::error::AppError;
use crate::models::ChatThread;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Reactive state exposed to the UI layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveViewState {
    /// Threads where the user is either participant, in store order.
    pub threads: Vec<ChatThread>,
    /// True while the initial query (or a resync) is in flight.
    pub loading: bool,
}

/// Disposable registration for one user's live view.
///
/// Dropping or [`unsubscribe`](Self::unsubscribe)-ing the handle aborts
/// the feed task; events still queued at that point are discarded and
/// the state cell is never mutated again.
pub struct SubscriptionHandle {
    user_id: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Cancel the underlying live-query registration.
    pub fn unsubscribe(self) {
        // Drop does the abort.
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Wires change-feed subscriptions to watch cells.
#[derive(Clone)]
pub struct LiveViewSynchronizer {
    threads: Arc<dyn ThreadStore>,
}

impl LiveViewSynchronizer {
    pub fn new(threads: Arc<dyn ThreadStore>) -> Self {
        Self { threads }
    }

    /// Start keeping `cell` current for `user_id`.
    ///
    /// The feed receiver is registered before the initial query runs, so
    /// an insert racing the query is never lost: it either appears in
    /// the query result or arrives as a queued event (or both, in which
    /// case the upsert by thread id deduplicates).
    ///
    /// A failed initial query leaves the previous `threads` value in
    /// place (stale-but-valid), clears `loading`, and keeps the feed
    /// task alive; the next event or resync heals the view.
    pub fn subscribe(
        &self,
        user_id: &str,
        cell: Arc<watch::Sender<LiveViewState>>,
    ) -> SubscriptionHandle {
        let rx = self.threads.changes();
        let store = Arc::clone(&self.threads);
        let user_id = user_id.to_string();

        cell.send_modify(|state| state.loading = true);

        let task_user = user_id.clone();
        let task = tokio::spawn(async move {
            run_feed(store, task_user, cell, rx).await;
        });

        SubscriptionHandle { user_id, task }
    }
}

/// Initial load plus the event loop. Runs until aborted or the store's
/// feed sender is dropped.
async fn run_feed(
    store: Arc<dyn ThreadStore>,
    user_id: String,
    cell: Arc<watch::Sender<LiveViewState>>,
    mut rx: broadcast::Receiver<ChatThread>,
) {
    load_snapshot(&store, &user_id, &cell).await;

    loop {
        match rx.recv().await {
            Ok(thread) => {
                if !thread.involves(&user_id) {
                    continue;
                }
                cell.send_modify(|state| apply_thread(&mut state.threads, thread));
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(%user_id, skipped, "Change feed lagged, resyncing");
                load_snapshot(&store, &user_id, &cell).await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Replace the view with a fresh query result.
async fn load_snapshot(
    store: &Arc<dyn ThreadStore>,
    user_id: &str,
    cell: &watch::Sender<LiveViewState>,
) {
    match store.threads_for_participant(user_id).await {
        Ok(threads) => {
            cell.send_replace(LiveViewState {
                threads,
                loading: false,
            });
        }
        Err(e) => {
            // Transient: keep the stale threads, stay subscribed.
            let err = AppError::Subscription(e.to_string());
            tracing::warn!(%user_id, error = %err, "Live view query failed");
            cell.send_modify(|state| state.loading = false);
        }
    }
}

/// Insert-or-replace by thread id. Existing threads keep their position
/// so the view stays stable until changed; new threads append in feed
/// order.
fn apply_thread(threads: &mut Vec<ChatThread>, thread: ChatThread) {
    if let Some(existing) = threads.iter_mut().find(|t| t.thread_id == thread.thread_id) {
        *existing = thread;
    } else {
        threads.push(thread);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatParticipant;

    fn thread(id: &str, a: &str, b: &str) -> ChatThread {
        let participant = |user_id: &str| ChatParticipant {
            user_id: user_id.to_string(),
            name: user_id.to_string(),
            image_url: None,
            phone_number: format!("555{user_id}"),
        };
        ChatThread {
            thread_id: id.to_string(),
            participant_a: participant(a),
            participant_b: participant(b),
        }
    }

    #[test]
    fn test_apply_thread_appends_new() {
        let mut threads = vec![thread("t1", "u1", "u2")];
        apply_thread(&mut threads, thread("t2", "u1", "u3"));
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[1].thread_id, "t2");
    }

    #[test]
    fn test_apply_thread_replaces_in_place() {
        let mut threads = vec![thread("t1", "u1", "u2"), thread("t2", "u1", "u3")];
        let mut updated = thread("t1", "u1", "u2");
        updated.participant_b.name = "renamed".to_string();

        apply_thread(&mut threads, updated);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].thread_id, "t1");
        assert_eq!(threads[0].participant_b.name, "renamed");
    }
}
