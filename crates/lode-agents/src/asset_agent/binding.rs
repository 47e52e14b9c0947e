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

use lode_core::asset::{TaskId, UnitId};
use std::collections::HashMap;

/// Which units, across all live tasks, wait on each url.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    by_url: HashMap<String, Vec<UnitId>>,
}

impl BindingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binds `unit` to `url`. Binding twice is a no-op.
    pub(crate) fn bind(&mut self, url: &str, unit: UnitId) {
        let units = self.by_url.entry(url.to_string()).or_default();
        if !units.contains(&unit) {
            units.push(unit);
        }
    }

    /// The units bound to `url`, in binding order.
    pub(crate) fn units(&self, url: &str) -> &[UnitId] {
        self.by_url.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drops the bindings of `url` that fail `keep`.
    pub(crate) fn retain(&mut self, url: &str, mut keep: impl FnMut(&UnitId) -> bool) {
        if let Some(units) = self.by_url.get_mut(url) {
            units.retain(|unit| keep(unit));
            if units.is_empty() {
                self.by_url.remove(url);
            }
        }
    }

    /// Forgets `url` and returns the units that were bound to it.
    pub(crate) fn take(&mut self, url: &str) -> Vec<UnitId> {
        self.by_url.remove(url).unwrap_or_default()
    }

    /// Drops every binding owned by `task`.
    pub(crate) fn unbind_task(&mut self, task: TaskId) {
        self.by_url.retain(|_, units| {
            units.retain(|unit| unit.task != task);
            !units.is_empty()
        });
    }

    #[cfg(test)]
    pub(crate) fn url_count(&self) -> usize {
        self.by_url.len()
    }

    pub(crate) fn clear(&mut self) {
        self.by_url.clear();
    }
}
