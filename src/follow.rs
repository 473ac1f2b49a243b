use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Followed artists for a single chat: artist id -> display name. The only
/// mutated domain state; durability is handled by the caller snapshotting the
/// whole per-chat map to disk.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(super) struct FollowStore {
    artists: HashMap<String, String>,
}

impl FollowStore {
    /// Idempotent; re-following overwrites the stored name so upstream
    /// renames stick.
    pub(super) fn follow(&mut self, id: &str, name: &str) {
        self.artists.insert(id.to_string(), name.to_string());
    }

    /// No-op on an id that was never followed.
    pub(super) fn unfollow(&mut self, id: &str) {
        self.artists.remove(id);
    }

    pub(super) fn is_following(&self, id: &str) -> bool {
        self.artists.contains_key(id)
    }

    pub(super) fn name_of(&self, id: &str) -> Option<&str> {
        self.artists.get(id).map(String::as_str)
    }

    pub(super) fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub(super) fn len(&self) -> usize {
        self.artists.len()
    }

    /// (id, name) pairs sorted by name, so the followed list renders in a
    /// stable order.
    pub(super) fn sorted_entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .artists
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}
