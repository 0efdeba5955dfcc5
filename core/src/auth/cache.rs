// lustre/src/auth/cache.rs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::role::AdminRole;

#[derive(Debug, Clone, Copy)]
struct CachedRole {
  role: Option<AdminRole>,
  fetched_at: Instant,
}

/// Bounded TTL cache of directory lookups. `None` roles (customers) are cached
/// too. A stale entry is never served; eviction drops expired entries first,
/// then the oldest one.
#[derive(Debug)]
pub struct RoleCache {
  ttl: Duration,
  capacity: usize,
  entries: Mutex<HashMap<Uuid, CachedRole>>,
}

impl RoleCache {
  pub fn new(ttl: Duration, capacity: usize) -> Self {
    Self {
      ttl,
      capacity,
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Outer `None` is a miss; `Some(None)` is a cached "not an admin".
  pub fn get(&self, user_id: Uuid) -> Option<Option<AdminRole>> {
    let mut entries = self.entries.lock();
    match entries.get(&user_id) {
      Some(cached) if cached.fetched_at.elapsed() < self.ttl => Some(cached.role),
      Some(_) => {
        entries.remove(&user_id);
        None
      }
      None => None,
    }
  }

  pub fn put(&self, user_id: Uuid, role: Option<AdminRole>) {
    if self.capacity == 0 || self.ttl.is_zero() {
      return;
    }
    let mut entries = self.entries.lock();
    if entries.len() >= self.capacity && !entries.contains_key(&user_id) {
      let ttl = self.ttl;
      entries.retain(|_, cached| cached.fetched_at.elapsed() < ttl);
      if entries.len() >= self.capacity {
        let oldest = entries
          .iter()
          .min_by_key(|(_, cached)| cached.fetched_at)
          .map(|(id, _)| *id);
        if let Some(oldest) = oldest {
          entries.remove(&oldest);
        }
      }
    }
    entries.insert(
      user_id,
      CachedRole {
        role,
        fetched_at: Instant::now(),
      },
    );
  }

  pub fn invalidate(&self, user_id: Uuid) {
    self.entries.lock().remove(&user_id);
  }

  pub fn clear(&self) {
    self.entries.lock().clear();
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capacity_is_bounded() {
    let cache = RoleCache::new(Duration::from_secs(60), 2);
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    cache.put(a, Some(AdminRole::Staff));
    cache.put(b, None);
    cache.put(c, Some(AdminRole::MainAdmin));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(c), Some(Some(AdminRole::MainAdmin)));
  }

  #[test]
  fn expired_entries_are_misses() {
    let cache = RoleCache::new(Duration::from_millis(5), 8);
    let user = Uuid::new_v4();
    cache.put(user, Some(AdminRole::Staff));
    std::thread::sleep(Duration::from_millis(15));
    assert_eq!(cache.get(user), None);
    assert!(cache.is_empty());
  }

  #[test]
  fn invalidate_forgets_one_user() {
    let cache = RoleCache::new(Duration::from_secs(60), 8);
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    cache.put(a, Some(AdminRole::Staff));
    cache.put(b, Some(AdminRole::Staff));
    cache.invalidate(a);
    assert_eq!(cache.get(a), None);
    assert_eq!(cache.get(b), Some(Some(AdminRole::Staff)));
  }
}
