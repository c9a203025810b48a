//! Short-TTL in-memory read cache with typed keys.
//!
//! Staleness up to the TTL is an accepted tradeoff, not a guarantee: the
//! cache only saves redundant fetches within a session. Every mutating
//! handler calls the matching `invalidate_*` method explicitly — there are
//! no key-prefix conventions to remember.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

use aquila_core::profile::{Group, Profile};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
  Profile(Uuid),
  Groups,
}

#[derive(Clone)]
enum CacheValue {
  Profile(Profile),
  Groups(Vec<Group>),
}

struct Entry {
  value:      CacheValue,
  expires_at: Instant,
}

/// A typed read cache shared across handlers.
pub struct ReadCache {
  ttl:     Duration,
  entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl ReadCache {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, entries: Mutex::new(HashMap::new()) }
  }

  fn get(&self, key: &CacheKey) -> Option<CacheValue> {
    let mut entries = self.entries.lock().expect("cache lock poisoned");
    match entries.get(key) {
      Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  fn put(&self, key: CacheKey, value: CacheValue) {
    let mut entries = self.entries.lock().expect("cache lock poisoned");
    entries.insert(key, Entry { value, expires_at: Instant::now() + self.ttl });
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  pub fn get_profile(&self, id: Uuid) -> Option<Profile> {
    match self.get(&CacheKey::Profile(id)) {
      Some(CacheValue::Profile(p)) => Some(p),
      _ => None,
    }
  }

  pub fn put_profile(&self, profile: Profile) {
    self.put(CacheKey::Profile(profile.id), CacheValue::Profile(profile));
  }

  pub fn invalidate_profile(&self, id: Uuid) {
    self
      .entries
      .lock()
      .expect("cache lock poisoned")
      .remove(&CacheKey::Profile(id));
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  pub fn get_groups(&self) -> Option<Vec<Group>> {
    match self.get(&CacheKey::Groups) {
      Some(CacheValue::Groups(g)) => Some(g),
      _ => None,
    }
  }

  pub fn put_groups(&self, groups: Vec<Group>) {
    self.put(CacheKey::Groups, CacheValue::Groups(groups));
  }

  pub fn invalidate_groups(&self) {
    self
      .entries
      .lock()
      .expect("cache lock poisoned")
      .remove(&CacheKey::Groups);
  }

  /// Drop everything. Used after mutations whose cached footprint is not
  /// enumerable (e.g. deleting a group rewrites an unknown set of profiles).
  pub fn clear(&self) {
    self.entries.lock().expect("cache lock poisoned").clear();
  }
}
