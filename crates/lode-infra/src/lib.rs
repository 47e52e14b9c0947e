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

//! Concrete implementations of the `lode-core` asset contracts.
//!
//! - [`io::FsLoader`]: a [`Loader`](lode_core::asset::Loader) reading files
//!   from a root directory on worker threads.
//! - [`cache::TextCacheEntry`]: a cache entry that exposes `.json` texts as
//!   parsed [`serde_json::Value`]s.

#![warn(missing_docs)]

pub mod cache;
pub mod io;

pub use cache::TextCacheEntry;
pub use io::{FsLoader, ReadMode};
