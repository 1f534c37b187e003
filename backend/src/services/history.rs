//! In-memory conversation history
//!
//! One ordered list of chat turns per LINE user id. Entries are created on
//! first append and live until deleted or the process exits.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared::ChatTurn;
use tokio::sync::RwLock;

/// All users' histories keyed by user id
pub type HistoryMap = BTreeMap<String, Vec<ChatTurn>>;

/// Shared handle to the history store
#[derive(Clone, Default)]
pub struct HistoryStore {
    inner: Arc<RwLock<HistoryMap>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a turn at the end of a user's history
    pub async fn append(&self, user_id: &str, turn: ChatTurn) {
        self.inner
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(turn);
    }

    /// A user's history in conversation order
    pub async fn get(&self, user_id: &str) -> Option<Vec<ChatTurn>> {
        self.inner
            .read()
            .await
            .get(user_id)
            .filter(|turns| !turns.is_empty())
            .cloned()
    }

    /// Remove a user's history, returning whether there was one
    pub async fn delete(&self, user_id: &str) -> bool {
        self.inner.write().await.remove(user_id).is_some()
    }

    /// Every user's history, or `None` when nothing is stored
    pub async fn get_all(&self) -> Option<HistoryMap> {
        let histories = self.inner.read().await;
        if histories.is_empty() {
            None
        } else {
            Some(histories.clone())
        }
    }

    /// Drop all histories
    pub async fn delete_all(&self) {
        self.inner.write().await.clear();
    }

    /// Number of users with stored history
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
