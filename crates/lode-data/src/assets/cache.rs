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

use super::store::TypedStore;
use lode_core::agent::{Disposable, Tickable};
use lode_core::asset::{
    BasicCacheEntry, CacheEntry, CacheEntryFactory, CacheError, CacheHold, ConfigError, EntryId,
    Payload,
};
use lode_core::utils::IdGenerator;
use std::collections::HashMap;

const ENTRY_ID_NAMESPACE: &str = "cache_entry";

/// Per-type storage of completed loads, keyed by url.
///
/// Entries are reference counted. An entry nobody holds ages from the moment
/// its count reached zero and is released by the periodic sweep once it has
/// been idle for longer than its type's lifetime. The sweep is driven by
/// [`Tickable::tick`]; the cache never reads a clock of its own.
pub struct AssetCache {
    sweep_interval_ms: u64,
    elapsed_ms: u64,
    now_ms: u64,
    stores: HashMap<String, TypedStore>,
    url_index: HashMap<String, String>,
    ids: IdGenerator,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("sweep_interval_ms", &self.sweep_interval_ms)
            .field("now_ms", &self.now_ms)
            .field("types", &self.stores.keys().collect::<Vec<_>>())
            .field("entries", &self.url_index.len())
            .finish()
    }
}

impl AssetCache {
    /// Creates an empty cache sweeping every `sweep_interval_ms`.
    ///
    /// An interval of zero disables the periodic sweep.
    pub fn new(sweep_interval_ms: u64) -> Self {
        Self {
            sweep_interval_ms,
            elapsed_ms: 0,
            now_ms: 0,
            stores: HashMap::new(),
            url_index: HashMap::new(),
            ids: IdGenerator::new(),
        }
    }

    /// The periodic sweep interval.
    pub fn sweep_interval_ms(&self) -> u64 {
        self.sweep_interval_ms
    }

    /// The clock value of the last tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Registers a store for `load_type` whose entries are built by `factory`.
    ///
    /// # Errors
    /// Fails if the type is already registered, or if `lifetime_ms` is shorter
    /// than the sweep interval.
    pub fn register_type(
        &mut self,
        load_type: &str,
        factory: CacheEntryFactory,
        lifetime_ms: u64,
    ) -> Result<(), ConfigError> {
        if self.stores.contains_key(load_type) {
            return Err(ConfigError::DuplicateCacheType(load_type.to_string()));
        }
        if self.sweep_interval_ms > lifetime_ms {
            return Err(ConfigError::LifetimeBelowSweepInterval {
                load_type: load_type.to_string(),
                lifetime_ms,
                sweep_interval_ms: self.sweep_interval_ms,
            });
        }
        self.stores
            .insert(load_type.to_string(), TypedStore::new(factory, lifetime_ms));
        log::debug!("Registered cache type '{load_type}' with lifetime {lifetime_ms}ms.");
        Ok(())
    }

    /// Registers a store for `load_type` holding [`BasicCacheEntry`]s.
    pub fn register_basic_type(
        &mut self,
        load_type: &str,
        lifetime_ms: u64,
    ) -> Result<(), ConfigError> {
        self.register_type(load_type, BasicCacheEntry::factory(), lifetime_ms)
    }

    /// Removes the store for `load_type`, disposing every entry in it.
    pub fn unregister_type(&mut self, load_type: &str) -> Result<(), ConfigError> {
        let mut store = self
            .stores
            .remove(load_type)
            .ok_or_else(|| ConfigError::UnknownCacheType(load_type.to_string()))?;
        for url in store.dispose_all() {
            self.url_index.remove(&url);
        }
        log::debug!("Unregistered cache type '{load_type}'.");
        Ok(())
    }

    /// Whether a store exists for `load_type`.
    pub fn has_type(&self, load_type: &str) -> bool {
        self.stores.contains_key(load_type)
    }

    /// The lifetime entries of `load_type` get, if registered.
    pub fn lifetime_of(&self, load_type: &str) -> Option<u64> {
        self.stores.get(load_type).map(TypedStore::lifetime_ms)
    }

    /// Stores `payload` for `url` under `load_type`.
    ///
    /// The new entry is unheld and starts aging immediately.
    ///
    /// # Errors
    /// Fails if no store exists for the type, or if `url` is already cached.
    /// Existing entries are never overwritten.
    pub fn put(
        &mut self,
        load_type: &str,
        url: &str,
        payload: Payload,
    ) -> Result<EntryId, CacheError> {
        if let Some(existing) = self.url_index.get(url) {
            return Err(CacheError::DuplicateEntry {
                load_type: existing.clone(),
                url: url.to_string(),
            });
        }
        let store = self
            .stores
            .get_mut(load_type)
            .ok_or_else(|| CacheError::UnknownType(load_type.to_string()))?;
        let id = EntryId(self.ids.next_default(ENTRY_ID_NAMESPACE));
        store.insert(id, url, payload, self.now_ms);
        self.url_index.insert(url.to_string(), load_type.to_string());
        log::trace!("Cached '{url}' as '{load_type}'.");
        Ok(id)
    }

    /// The entry stored for `url`.
    pub fn get(&self, url: &str) -> Option<&dyn CacheEntry> {
        let load_type = self.url_index.get(url)?;
        self.stores
            .get(load_type)?
            .get(url)
            .map(|stored| stored.entry.as_ref())
    }

    /// The payload stored for `url`.
    pub fn get_payload(&self, url: &str) -> Option<Payload> {
        self.get(url)?.payload()
    }

    /// The type `url` is cached under.
    pub fn type_of(&self, url: &str) -> Option<&str> {
        self.url_index.get(url).map(String::as_str)
    }

    /// Whether `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.url_index.contains_key(url)
    }

    /// Takes a strong reference on the entry for `url`.
    pub fn hold(&mut self, url: &str) -> Option<CacheHold> {
        let stored = self.stored_mut(url)?;
        stored.entry.add_ref();
        Some(CacheHold {
            url: url.to_string(),
            entry: stored.id,
        })
    }

    /// Drops a reference taken with [`AssetCache::hold`].
    ///
    /// Returns `false` and leaves the cache untouched if the held entry was
    /// released in the meantime, even if the url has been cached again.
    pub fn let_go(&mut self, hold: &CacheHold) -> bool {
        let now_ms = self.now_ms;
        match self.stored_mut(&hold.url) {
            Some(stored) if stored.id == hold.entry => {
                stored.entry.dec_ref(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Increments the ref count of the entry for `url`.
    pub fn add_ref(&mut self, url: &str) -> Result<(), CacheError> {
        let stored = self
            .stored_mut(url)
            .ok_or_else(|| CacheError::NotCached(url.to_string()))?;
        stored.entry.add_ref();
        Ok(())
    }

    /// Decrements the ref count of the entry for `url`, clamped at zero.
    pub fn dec_ref(&mut self, url: &str) -> Result<(), CacheError> {
        let now_ms = self.now_ms;
        let stored = self
            .stored_mut(url)
            .ok_or_else(|| CacheError::NotCached(url.to_string()))?;
        stored.entry.dec_ref(now_ms);
        Ok(())
    }

    /// Disposes the entry for `url` immediately, whatever its ref count.
    pub fn release(&mut self, url: &str) -> Result<(), CacheError> {
        let load_type = self
            .url_index
            .remove(url)
            .ok_or_else(|| CacheError::NotCached(url.to_string()))?;
        if let Some(store) = self.stores.get_mut(&load_type) {
            store.remove(url);
        }
        log::debug!("Released cache entry '{url}'.");
        Ok(())
    }

    /// Releases every entry that is unheld and past its lifetime.
    ///
    /// Returns the number of entries released.
    pub fn sweep(&mut self) -> usize {
        let now_ms = self.now_ms;
        let mut released = 0;
        for store in self.stores.values_mut() {
            for url in store.sweep(now_ms) {
                self.url_index.remove(&url);
                log::trace!("Swept expired cache entry '{url}'.");
                released += 1;
            }
        }
        if released > 0 {
            log::debug!("Cache sweep released {released} entries.");
        }
        released
    }

    /// Number of cached urls.
    pub fn len(&self) -> usize {
        self.url_index.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.url_index.is_empty()
    }

    fn stored_mut(&mut self, url: &str) -> Option<&mut super::store::StoredEntry> {
        let load_type = self.url_index.get(url)?;
        self.stores.get_mut(load_type)?.get_mut(url)
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Tickable for AssetCache {
    fn tick(&mut self, now_ms: u64, dt_ms: u64) {
        self.now_ms = now_ms;
        if self.sweep_interval_ms == 0 {
            return;
        }
        self.elapsed_ms += dt_ms;
        if self.elapsed_ms >= self.sweep_interval_ms {
            self.elapsed_ms = 0;
            self.sweep();
        }
    }
}

impl Disposable for AssetCache {
    fn dispose(&mut self) {
        for store in self.stores.values_mut() {
            store.dispose_all();
        }
        self.stores.clear();
        self.url_index.clear();
        self.elapsed_ms = 0;
        log::debug!("AssetCache disposed.");
    }
}
