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

use lode_core::asset::{file_extension, CacheEntry, CacheEntryFactory, EntryState, Payload};
use std::cell::OnceCell;
use std::sync::Arc;

/// A cache entry for text resources.
///
/// Texts whose url ends in `.json` are parsed on first access and handed out
/// as a [`serde_json::Value`]; the parse result is kept until the entry is
/// released. Any other text, and json that fails to parse, is handed out as
/// the raw `String`.
#[derive(Debug, Default)]
pub struct TextCacheEntry {
    state: EntryState,
    parsed: OnceCell<Option<Payload>>,
}

impl TextCacheEntry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory producing boxed text entries.
    pub fn factory() -> CacheEntryFactory {
        Box::new(|| -> Box<dyn CacheEntry> { Box::new(TextCacheEntry::new()) })
    }

    fn parse(&self) -> Option<Payload> {
        if file_extension(&self.state.url) != Some("json") {
            return None;
        }
        let text = self.state.payload.as_ref()?.downcast_ref::<String>()?;
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => Some(Arc::new(value)),
            Err(e) => {
                log::warn!("'{}' is not valid json: {e}", self.state.url);
                None
            }
        }
    }
}

impl CacheEntry for TextCacheEntry {
    fn state(&self) -> &EntryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntryState {
        &mut self.state
    }

    fn payload(&self) -> Option<Payload> {
        self.state.payload.as_ref()?;
        self.parsed
            .get_or_init(|| self.parse())
            .clone()
            .or_else(|| self.state.payload.clone())
    }

    fn set_payload(&mut self, url: &str, payload: Payload, now_ms: u64) {
        self.parsed = OnceCell::new();
        self.state.url = url.to_string();
        self.state.payload = Some(payload);
        self.state.ref_count = 0;
        self.state.idle_since = Some(now_ms);
    }

    fn on_release(&mut self) {
        self.parsed = OnceCell::new();
    }
}
