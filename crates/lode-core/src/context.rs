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

//! The shared runtime context of the pipeline.

use crate::memory::ObjectRecycler;
use crate::utils::IdGenerator;

/// The object pools and id sequences shared by the pipeline.
///
/// Constructed once by the host and owned by the scheduler; everything that
/// mints ids or recycles objects goes through it.
#[derive(Debug, Default)]
pub struct LoadContext {
    /// Registered object pools.
    pub recycler: ObjectRecycler,
    /// Id sequences.
    pub ids: IdGenerator,
}

impl LoadContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every pool and restarts every id sequence.
    pub fn reset(&mut self) {
        self.recycler.clear();
        self.ids.reset();
    }
}
