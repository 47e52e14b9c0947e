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

use lode_core::agent::Tickable;
use lode_core::asset::{CacheEntry, EntryState, Payload};
use lode_data::AssetCache;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// An entry counting how many payloads it has let go of.
struct TrackedEntry {
    state: EntryState,
    releases: Rc<Cell<u32>>,
}

impl CacheEntry for TrackedEntry {
    fn state(&self) -> &EntryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntryState {
        &mut self.state
    }

    fn on_release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

fn tracked_cache(releases: &Rc<Cell<u32>>, lifetime_ms: u64) -> AssetCache {
    let mut cache = AssetCache::new(100);
    let counter = releases.clone();
    cache
        .register_type(
            "mesh",
            Box::new(move || -> Box<dyn CacheEntry> {
                Box::new(TrackedEntry {
                    state: EntryState::default(),
                    releases: counter.clone(),
                })
            }),
            lifetime_ms,
        )
        .unwrap();
    cache
}

fn payload(n: u32) -> Payload {
    Arc::new(n)
}

#[test]
fn test_release_hook_runs_for_sweep_release_and_dispose() {
    // Arrange
    let releases = Rc::new(Cell::new(0));
    let mut cache = tracked_cache(&releases, 200);
    cache.put("mesh", "a.mesh", payload(1)).unwrap();
    cache.put("mesh", "b.mesh", payload(2)).unwrap();
    cache.put("mesh", "c.mesh", payload(3)).unwrap();
    cache.add_ref("c.mesh").unwrap();

    // Act: explicit release, then let the sweep collect the idle entry.
    cache.release("a.mesh").unwrap();
    for frame in 1..=4u64 {
        cache.tick(frame * 100, 100);
    }

    // Assert
    assert_eq!(releases.get(), 2);
    assert!(!cache.contains("b.mesh"));
    assert!(cache.contains("c.mesh"), "held entries are never swept");

    lode_core::agent::Disposable::dispose(&mut cache);
    assert_eq!(releases.get(), 3);
}

#[test]
fn test_entries_are_recycled_after_release() {
    let releases = Rc::new(Cell::new(0));
    let mut cache = tracked_cache(&releases, 100);

    let first = cache.put("mesh", "a.mesh", payload(1)).unwrap();
    cache.release("a.mesh").unwrap();
    let second = cache.put("mesh", "a.mesh", payload(2)).unwrap();

    assert_ne!(first, second, "a re-cached url gets a fresh identity");
    let entry = cache.get("a.mesh").unwrap();
    assert_eq!(entry.url(), "a.mesh");
    assert_eq!(entry.ref_count(), 0);
    assert_eq!(
        *cache
            .get_payload("a.mesh")
            .unwrap()
            .downcast_ref::<u32>()
            .unwrap(),
        2
    );
}
