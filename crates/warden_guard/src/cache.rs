//! In-memory mirror of the last-known-good state of protected entities.

use std::collections::HashMap;
use warden_interface::{Snapshot, Snowflake};

/// Last-known-good snapshots, keyed by entity id.
///
/// Owned by exactly one engine and written only from that engine's event
/// loop. Holds one generation per entity: a `put` replaces the previous
/// snapshot outright. Nothing here survives a restart; [`StateCache::load`]
/// rebuilds it from a full enumeration.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use warden_guard::StateCache;
/// use warden_interface::{RoleSnapshot, Snowflake};
///
/// let role = RoleSnapshot {
///     id: Snowflake(7),
///     name: "Mods".into(),
///     color: 0,
///     permissions: 0,
///     position: 3,
///     hoist: false,
///     mentionable: false,
///     captured_at: Utc::now(),
/// };
///
/// let mut cache = StateCache::new();
/// cache.load(vec![role.clone()]);
/// assert_eq!(cache.get(Snowflake(7)), Some(&role));
/// ```
#[derive(Debug, Clone)]
pub struct StateCache<S: Snapshot> {
    entries: HashMap<Snowflake, S>,
}

impl<S: Snapshot> Default for StateCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Snapshot> StateCache<S> {
    /// Empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Replace the whole cache with a fresh enumeration.
    pub fn load(&mut self, snapshots: impl IntoIterator<Item = S>) {
        self.entries = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.id(), snapshot))
            .collect();
        tracing::debug!(entries = self.entries.len(), "State cache loaded");
    }

    /// Snapshot for `id`, if cached.
    pub fn get(&self, id: Snowflake) -> Option<&S> {
        self.entries.get(&id)
    }

    /// Store `snapshot` under its own id, replacing any previous generation.
    pub fn put(&mut self, snapshot: S) {
        self.entries.insert(snapshot.id(), snapshot);
    }

    /// Drop the snapshot for `id`, returning it.
    pub fn remove(&mut self, id: Snowflake) -> Option<S> {
        self.entries.remove(&id)
    }

    /// Store `snapshot` (carrying a new id) in place of `old_id`.
    ///
    /// Used after an entity has been recreated under a new identity.
    pub fn replace(&mut self, old_id: Snowflake, snapshot: S) {
        self.entries.remove(&old_id);
        self.put(snapshot);
    }

    /// Whether `id` is cached.
    pub fn contains(&self, id: Snowflake) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
