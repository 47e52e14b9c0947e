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

use lode_core::asset::TaskId;

/// Task ids in dispatch order.
///
/// Smaller priorities come first; equal priorities keep submission order.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    entries: Vec<(TaskId, i32)>,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts `id` right before the first queued task with a strictly greater priority.
    pub(crate) fn insert(&mut self, id: TaskId, priority: i32) {
        let at = self
            .entries
            .iter()
            .position(|&(_, queued)| queued > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (id, priority));
    }

    pub(crate) fn remove(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|&(queued, _)| queued != id);
        self.entries.len() != before
    }

    /// Snapshot of the queued ids, front first.
    pub(crate) fn ids(&self) -> Vec<TaskId> {
        self.entries.iter().map(|&(id, _)| id).collect()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: TaskId) -> bool {
        self.entries.iter().any(|&(queued, _)| queued == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
