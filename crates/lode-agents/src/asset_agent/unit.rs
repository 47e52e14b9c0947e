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

//! A single url request inside a load task.

use lode_core::asset::{CacheHold, UnitId};

/// One (url, type) pair inside a [`LoadTask`](super::LoadTask).
///
/// While its task still has other units loading, a finished unit may hold a
/// strong reference on its cache entry so the entry cannot expire early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadUnit {
    id: UnitId,
    url: String,
    load_type: Option<String>,
    held: Option<CacheHold>,
}

impl LoadUnit {
    /// Creates a unit. An empty `load_type` counts as unspecified.
    pub fn new(id: UnitId, url: &str, load_type: Option<&str>) -> Self {
        Self {
            id,
            url: url.to_string(),
            load_type: load_type.filter(|t| !t.is_empty()).map(str::to_string),
            held: None,
        }
    }

    /// The unit's id.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// The url to load.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The explicit load type, if the caller gave one.
    pub fn load_type(&self) -> Option<&str> {
        self.load_type.as_deref()
    }

    /// The cache reference this unit holds, if any.
    pub fn held(&self) -> Option<&CacheHold> {
        self.held.as_ref()
    }

    pub(crate) fn set_hold(&mut self, hold: CacheHold) {
        self.held = Some(hold);
    }

    pub(crate) fn take_hold(&mut self) -> Option<CacheHold> {
        self.held.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_core::asset::TaskId;

    #[test]
    fn test_empty_type_is_unspecified() {
        let unit = LoadUnit::new(UnitId::new(TaskId(1), 0), "a.txt", Some(""));
        assert_eq!(unit.load_type(), None);
        assert_eq!(unit.id().task, TaskId(1));

        let typed = LoadUnit::new(UnitId::new(TaskId(1), 1), "b.bin", Some("arraybuffer"));
        assert_eq!(typed.load_type(), Some("arraybuffer"));
    }
}
