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

//! Provides the foundational traits and primitive types for the asset pipeline.
//!
//! This module defines the "common language" for all asset-related operations.
//! It contains the contracts that other crates implement or use, but it has no
//! knowledge of how assets are scheduled or stored.
//!
//! The key components are:
//! - The [`Loader`] capability: a pluggable back-end that fetches one resource type.
//! - The [`CacheEntry`] capability: a ref-counted, TTL-eligible stored payload.
//! - Structured identifiers ([`TaskId`], [`UnitId`], [`EntryId`]).
//! - The error taxonomy shared by registration, requests and caching.

mod entry;
mod error;
mod ids;
mod loader;
mod status;

pub use entry::*;
pub use error::*;
pub use ids::*;
pub use loader::*;
pub use status::*;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A loaded resource, shared between the cache and every consumer.
///
/// Payloads are type-erased; consumers downcast to the concrete type their
/// loader back-end produces (e.g. `String` or `Vec<u8>`).
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Per-url outcome delivered to a task's completion callback.
///
/// `None` means the url loaded successfully, `Some(message)` carries the
/// back-end's error string.
pub type CompletionMap = HashMap<String, Option<String>>;

/// The load type used when a unit has no type and its extension is unmapped.
pub const NONE_TYPE: &str = "None";

/// Default task priority. Smaller values are more urgent.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Extracts the file extension of a url, without the leading dot.
///
/// Only the last path segment is considered and any `?query` suffix is
/// ignored. Returns `None` when the segment has no extension.
///
/// # Examples
///
/// ```
/// use lode_core::asset::file_extension;
///
/// assert_eq!(file_extension("data/level.json"), Some("json"));
/// assert_eq!(file_extension("img/hero.png?v=3"), Some("png"));
/// assert_eq!(file_extension("dir.v2/README"), None);
/// ```
pub fn file_extension(url: &str) -> Option<&str> {
    let path = url.split('?').next().unwrap_or(url);
    let segment = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match segment.rfind('.') {
        Some(dot) if dot + 1 < segment.len() => Some(&segment[dot + 1..]),
        _ => None,
    }
}

/// Rounds a progress ratio to two decimal places.
pub fn round_progress(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
