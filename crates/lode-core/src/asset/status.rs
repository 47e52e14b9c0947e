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

use std::fmt;

/// Lifecycle state of a load task.
///
/// `Completed`, `Canceled` and `Disposed` are terminal. `Paused` is left only
/// through a resume, which re-derives the target state from the task's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    /// Units are waiting for dispatch.
    #[default]
    Ready,
    /// At least one unit has been handed to a back-end.
    Loading,
    /// Every unit finished and the completion callback fired.
    Completed,
    /// Suspended by the caller; results are still recorded.
    Paused,
    /// Returned to the recycler.
    Disposed,
    /// Abandoned by the caller; no callback will fire.
    Canceled,
}

impl TaskStatus {
    /// `Ready` or `Loading`: the task may be dispatched and its callbacks fire.
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Loading)
    }

    /// `Ready`, `Loading` or `Paused`: the task still receives results.
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            TaskStatus::Ready | TaskStatus::Loading | TaskStatus::Paused
        )
    }

    /// `Completed` or `Canceled`: the task is waiting for cleanup.
    pub fn is_retired(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Canceled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Ready => "ready",
            TaskStatus::Loading => "loading",
            TaskStatus::Completed => "completed",
            TaskStatus::Paused => "paused",
            TaskStatus::Disposed => "disposed",
            TaskStatus::Canceled => "canceled",
        };
        f.write_str(name)
    }
}
