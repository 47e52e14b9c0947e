// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::AssetCache;
use lode_core::asset::{CacheHold, Payload};
use std::collections::HashMap;

/// A lease holder over an [`AssetCache`].
///
/// Every resource fetched through an `AutoCache` is held until it is handed
/// back with [`AutoCache::put_back`] or the whole lease is dropped with
/// [`AutoCache::clean`]. A component that fetches through a lease must return
/// through the same lease.
#[derive(Debug, Default)]
pub struct AutoCache {
    held: HashMap<String, CacheHold>,
}

impl AutoCache {
    /// Creates an empty lease.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the payload for `url`, holding the entry if this lease does not yet.
    pub fn get(&mut self, cache: &mut AssetCache, url: &str) -> Option<Payload> {
        if !self.held.contains_key(url) {
            let hold = cache.hold(url)?;
            self.held.insert(url.to_string(), hold);
        }
        cache.get_payload(url)
    }

    /// Whether this lease currently holds `url`.
    pub fn holds(&self, url: &str) -> bool {
        self.held.contains_key(url)
    }

    /// Number of urls held by this lease.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether the lease holds nothing.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Gives back the hold on `url`. Returns `false` if this lease did not hold it.
    pub fn put_back(&mut self, cache: &mut AssetCache, url: &str) -> bool {
        match self.held.remove(url) {
            Some(hold) => {
                cache.let_go(&hold);
                true
            }
            None => false,
        }
    }

    /// Gives back every hold of this lease.
    pub fn clean(&mut self, cache: &mut AssetCache) {
        for (_, hold) in self.held.drain() {
            cache.let_go(&hold);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_core::agent::Tickable;
    use std::sync::Arc;

    fn cache() -> AssetCache {
        let mut cache = AssetCache::new(0);
        cache.register_basic_type("text", 0).unwrap();
        cache.put("text", "a.txt", Arc::new("a".to_string())).unwrap();
        cache.put("text", "b.txt", Arc::new("b".to_string())).unwrap();
        cache
    }

    #[test]
    fn test_repeated_get_holds_once() {
        let mut cache = cache();
        let mut lease = AutoCache::new();

        assert!(lease.get(&mut cache, "a.txt").is_some());
        assert!(lease.get(&mut cache, "a.txt").is_some());

        assert_eq!(cache.get("a.txt").unwrap().ref_count(), 1);
        assert!(lease.get(&mut cache, "missing.txt").is_none());
        assert_eq!(lease.len(), 1);
    }

    #[test]
    fn test_put_back_and_clean_release_holds() {
        let mut cache = cache();
        let mut lease = AutoCache::new();
        lease.get(&mut cache, "a.txt");
        lease.get(&mut cache, "b.txt");

        assert!(lease.put_back(&mut cache, "a.txt"));
        assert!(!lease.put_back(&mut cache, "a.txt"));
        assert_eq!(cache.get("a.txt").unwrap().ref_count(), 0);

        lease.clean(&mut cache);
        assert!(lease.is_empty());
        assert_eq!(cache.get("b.txt").unwrap().ref_count(), 0);

        cache.tick(1, 0);
        assert_eq!(cache.sweep(), 2);
    }
}
