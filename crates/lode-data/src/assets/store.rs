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

use lode_core::asset::{CacheEntry, CacheEntryFactory, EntryId};
use std::collections::HashMap;

pub(crate) struct StoredEntry {
    pub(crate) id: EntryId,
    pub(crate) entry: Box<dyn CacheEntry>,
}

/// All entries of one load type, plus the pool their boxes are recycled through.
pub(crate) struct TypedStore {
    lifetime_ms: u64,
    factory: CacheEntryFactory,
    entries: HashMap<String, StoredEntry>,
    free: Vec<Box<dyn CacheEntry>>,
}

impl TypedStore {
    pub(crate) fn new(factory: CacheEntryFactory, lifetime_ms: u64) -> Self {
        Self {
            lifetime_ms,
            factory,
            entries: HashMap::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub(crate) fn get(&self, url: &str) -> Option<&StoredEntry> {
        self.entries.get(url)
    }

    pub(crate) fn get_mut(&mut self, url: &str) -> Option<&mut StoredEntry> {
        self.entries.get_mut(url)
    }

    /// Fills a pooled (or fresh) entry and stores it. The caller checks for duplicates.
    pub(crate) fn insert(
        &mut self,
        id: EntryId,
        url: &str,
        payload: lode_core::asset::Payload,
        now_ms: u64,
    ) {
        let mut entry = self.free.pop().unwrap_or_else(|| (self.factory)());
        entry.set_lifetime(self.lifetime_ms);
        entry.set_payload(url, payload, now_ms);
        self.entries.insert(url.to_string(), StoredEntry { id, entry });
    }

    /// Disposes the entry for `url` regardless of its ref count.
    pub(crate) fn remove(&mut self, url: &str) -> bool {
        match self.entries.remove(url) {
            Some(mut stored) => {
                stored.entry.dispose();
                self.free.push(stored.entry);
                true
            }
            None => false,
        }
    }

    /// Releases every expired entry and returns their urls.
    pub(crate) fn sweep(&mut self, now_ms: u64) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter_mut()
            .filter_map(|(url, stored)| stored.entry.try_release(now_ms).then(|| url.clone()))
            .collect();
        for url in &expired {
            if let Some(stored) = self.entries.remove(url) {
                self.free.push(stored.entry);
            }
        }
        expired
    }

    /// Disposes every entry and returns their urls.
    pub(crate) fn dispose_all(&mut self) -> Vec<String> {
        let urls: Vec<String> = self.entries.keys().cloned().collect();
        for (_, mut stored) in self.entries.drain() {
            stored.entry.dispose();
        }
        self.free.clear();
        urls
    }
}
