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

use super::{EntryId, Payload};

/// The bookkeeping shared by every cache entry implementation.
///
/// `idle_since` is `Some` only while `ref_count == 0`.
#[derive(Default, Clone)]
pub struct EntryState {
    /// The url this entry stores.
    pub url: String,
    /// The stored payload, `None` once disposed.
    pub payload: Option<Payload>,
    /// Number of live holders.
    pub ref_count: u32,
    /// How long the entry survives with no holder, in milliseconds.
    pub lifetime_ms: u64,
    /// Timestamp at which the ref count last dropped to zero.
    pub idle_since: Option<u64>,
}

impl std::fmt::Debug for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryState")
            .field("url", &self.url)
            .field("has_payload", &self.payload.is_some())
            .field("ref_count", &self.ref_count)
            .field("lifetime_ms", &self.lifetime_ms)
            .field("idle_since", &self.idle_since)
            .finish()
    }
}

impl EntryState {
    /// Whether the entry may be swept at `now_ms`.
    ///
    /// An entry that became idle at `t` with lifetime `L` is still alive at
    /// `t + L` and becomes eligible at `t + L + 1`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        if self.ref_count > 0 {
            return false;
        }
        match self.idle_since {
            Some(since) => now_ms.saturating_sub(since) > self.lifetime_ms,
            None => false,
        }
    }
}

/// A ref-counted, TTL-eligible stored payload for one url.
///
/// Implementors only provide access to their [`EntryState`]; the counting and
/// expiry rules are shared. Override [`CacheEntry::payload`] to hand out a
/// derived view of the raw payload, and [`CacheEntry::on_release`] to free
/// anything the entry owns outside its state.
pub trait CacheEntry {
    /// Shared bookkeeping.
    fn state(&self) -> &EntryState;

    /// Shared bookkeeping, mutably.
    fn state_mut(&mut self) -> &mut EntryState;

    /// The payload consumers receive.
    fn payload(&self) -> Option<Payload> {
        self.state().payload.clone()
    }

    /// Stores `payload` for `url`. The entry starts unheld and idle at `now_ms`.
    fn set_payload(&mut self, url: &str, payload: Payload, now_ms: u64) {
        let state = self.state_mut();
        state.url = url.to_string();
        state.payload = Some(payload);
        state.ref_count = 0;
        state.idle_since = Some(now_ms);
    }

    /// Sets how long the entry survives once unheld.
    fn set_lifetime(&mut self, lifetime_ms: u64) {
        self.state_mut().lifetime_ms = lifetime_ms;
    }

    /// The url this entry stores.
    fn url(&self) -> &str {
        &self.state().url
    }

    /// Number of live holders.
    fn ref_count(&self) -> u32 {
        self.state().ref_count
    }

    /// Registers a holder. The entry stops aging.
    fn add_ref(&mut self) {
        let state = self.state_mut();
        state.ref_count += 1;
        state.idle_since = None;
    }

    /// Drops a holder. Clamped at zero; reaching zero starts the idle clock.
    fn dec_ref(&mut self, now_ms: u64) {
        let state = self.state_mut();
        if state.ref_count == 0 {
            return;
        }
        state.ref_count -= 1;
        if state.ref_count == 0 {
            state.idle_since = Some(now_ms);
        }
    }

    /// Disposes the entry if it is unheld and past its lifetime.
    fn try_release(&mut self, now_ms: u64) -> bool {
        if !self.state().is_expired(now_ms) {
            return false;
        }
        self.dispose();
        true
    }

    /// Hook run right before the payload is dropped.
    fn on_release(&mut self) {}

    /// Drops the payload and resets the entry so it can be pooled.
    fn dispose(&mut self) {
        self.on_release();
        let lifetime_ms = self.state().lifetime_ms;
        *self.state_mut() = EntryState {
            lifetime_ms,
            ..EntryState::default()
        };
    }
}

/// Constructs an empty entry for a registered cache type.
pub type CacheEntryFactory = Box<dyn Fn() -> Box<dyn CacheEntry>>;

/// An entry that stores its payload as-is.
#[derive(Debug, Default)]
pub struct BasicCacheEntry {
    state: EntryState,
}

impl BasicCacheEntry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory producing boxed basic entries.
    pub fn factory() -> CacheEntryFactory {
        Box::new(|| -> Box<dyn CacheEntry> { Box::new(BasicCacheEntry::new()) })
    }
}

impl CacheEntry for BasicCacheEntry {
    fn state(&self) -> &EntryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntryState {
        &mut self.state
    }
}

/// A strong reference a load unit keeps on a cache entry.
///
/// The hold names the exact entry it was taken on, so releasing it after the
/// url was evicted and cached again leaves the new entry untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHold {
    /// The url of the held entry.
    pub url: String,
    /// The identity of the held entry.
    pub entry: EntryId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn filled(lifetime_ms: u64, now_ms: u64) -> BasicCacheEntry {
        let mut entry = BasicCacheEntry::new();
        entry.set_lifetime(lifetime_ms);
        entry.set_payload("a.txt", Arc::new(String::from("a")), now_ms);
        entry
    }

    #[test]
    fn test_ref_count_never_goes_negative() {
        let mut entry = filled(100, 0);

        entry.dec_ref(5);
        entry.dec_ref(6);
        assert_eq!(entry.ref_count(), 0);

        entry.add_ref();
        entry.add_ref();
        entry.dec_ref(10);
        entry.dec_ref(11);
        entry.dec_ref(12);
        assert_eq!(entry.ref_count(), 0);
        assert_eq!(entry.state().idle_since, Some(11));
    }

    #[test]
    fn test_held_entry_is_never_released() {
        let mut entry = filled(10, 0);
        entry.add_ref();

        assert!(entry.state().idle_since.is_none());
        assert!(!entry.try_release(1_000_000));
        assert!(entry.payload().is_some());
    }

    #[test]
    fn test_ttl_boundary() {
        let lifetime = 60_000;
        let mut entry = filled(lifetime, 1_000);

        assert!(!entry.try_release(1_000 + lifetime));
        assert!(entry.try_release(1_000 + lifetime + 1));
        assert!(entry.payload().is_none());
    }

    #[test]
    fn test_dispose_keeps_lifetime_and_clears_state() {
        let mut entry = filled(42, 0);
        entry.add_ref();

        entry.dispose();

        assert_eq!(entry.state().lifetime_ms, 42);
        assert_eq!(entry.ref_count(), 0);
        assert!(entry.url().is_empty());
        assert!(entry.payload().is_none());
    }

    #[test]
    fn test_on_release_hook_runs_once_per_dispose() {
        #[derive(Default)]
        struct Counting {
            state: EntryState,
            released: u32,
        }
        impl CacheEntry for Counting {
            fn state(&self) -> &EntryState {
                &self.state
            }
            fn state_mut(&mut self) -> &mut EntryState {
                &mut self.state
            }
            fn on_release(&mut self) {
                self.released += 1;
            }
        }

        let mut entry = Counting::default();
        entry.set_payload("b.bin", Arc::new(vec![1u8, 2, 3]), 0);
        assert!(entry.try_release(1));
        assert_eq!(entry.released, 1);
    }
}
