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

//! The load task state machine.

use super::unit::LoadUnit;
use lode_core::asset::{round_progress, CompletionMap, RequestError, TaskId, TaskStatus, UnitId};
use lode_core::memory::Recyclable;
use lode_data::AssetCache;
use std::collections::BTreeSet;
use std::fmt;

/// Receives a task's aggregate progress, rounded to two decimals.
pub type ProgressCallback = Box<dyn FnMut(f32)>;

/// Receives the per-url outcome map once every unit of a task has finished.
pub type CompleteCallback = Box<dyn FnOnce(&CompletionMap)>;

/// The callbacks a caller attaches to a load request.
///
/// Callbacks run on the tick thread while the scheduler is borrowed, so they
/// cannot call back into it directly.
#[derive(Default)]
pub struct TaskCallbacks {
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
}

impl TaskCallbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the progress callback.
    pub fn on_progress(mut self, callback: impl FnMut(f32) + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Sets the completion callback.
    pub fn on_complete(mut self, callback: impl FnOnce(&CompletionMap) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    fn progress(&mut self, value: f32) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(value);
        }
    }

    fn complete(&mut self, info: &CompletionMap) {
        if let Some(callback) = self.on_complete.take() {
            callback(info);
        }
    }
}

impl fmt::Debug for TaskCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCallbacks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Arguments a pooled [`LoadTask`] is (re)initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInit {
    /// The task id.
    pub id: TaskId,
    /// The task priority; smaller is more urgent.
    pub priority: i32,
}

/// A batch of [`LoadUnit`]s sharing one priority and one pair of callbacks.
///
/// Every unit index is in exactly one of the ready, loading and complete sets.
/// The task status only changes through the methods below; a resumed task
/// re-derives its status from those sets.
#[derive(Debug)]
pub struct LoadTask {
    id: TaskId,
    priority: i32,
    status: TaskStatus,
    units: Vec<LoadUnit>,
    ready: BTreeSet<u32>,
    loading: BTreeSet<u32>,
    complete: BTreeSet<u32>,
    callbacks: TaskCallbacks,
    progress: f32,
    errors: CompletionMap,
}

impl LoadTask {
    /// Creates an empty `Ready` task.
    pub fn new(init: TaskInit) -> Self {
        Self {
            id: init.id,
            priority: init.priority,
            status: TaskStatus::Ready,
            units: Vec::new(),
            ready: BTreeSet::new(),
            loading: BTreeSet::new(),
            complete: BTreeSet::new(),
            callbacks: TaskCallbacks::default(),
            progress: 0.0,
            errors: CompletionMap::new(),
        }
    }

    /// The task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task priority; smaller is more urgent.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The current status.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// The last computed aggregate progress.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Per-url outcomes recorded so far.
    pub fn errors(&self) -> &CompletionMap {
        &self.errors
    }

    /// All units, in insertion order.
    pub fn units(&self) -> &[LoadUnit] {
        &self.units
    }

    /// The unit at `index`.
    pub fn unit(&self, index: u32) -> Option<&LoadUnit> {
        self.units.get(index as usize)
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the task has no unit.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units waiting for dispatch, by insertion order.
    pub fn ready_units(&self) -> impl Iterator<Item = &LoadUnit> + '_ {
        self.ready
            .iter()
            .filter_map(move |&index| self.units.get(index as usize))
    }

    /// Number of units waiting for dispatch.
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Number of units handed to a back-end.
    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }

    /// Number of finished units.
    pub fn complete_count(&self) -> usize {
        self.complete.len()
    }

    /// Replaces the callbacks.
    pub fn set_callbacks(&mut self, callbacks: TaskCallbacks) {
        self.callbacks = callbacks;
    }

    /// Adds a unit for `url`. Only allowed while the task is `Ready`.
    pub fn add_unit(&mut self, url: &str, load_type: Option<&str>) -> Result<UnitId, RequestError> {
        if self.status != TaskStatus::Ready {
            log::error!("Task {} cannot take unit '{url}' while {}.", self.id, self.status);
            return Err(RequestError::TaskNotReady(self.id));
        }
        let index = self.units.len() as u32;
        let id = UnitId::new(self.id, index);
        self.units.push(LoadUnit::new(id, url, load_type));
        self.ready.insert(index);
        Ok(id)
    }

    /// Moves a unit to the loading set. A `Ready` task becomes `Loading`.
    pub fn mark_loading(&mut self, index: u32) {
        if self.unit(index).is_none() {
            return;
        }
        self.ready.remove(&index);
        self.complete.remove(&index);
        self.loading.insert(index);
        if self.status == TaskStatus::Ready {
            self.status = TaskStatus::Loading;
        }
    }

    /// Moves a unit to the complete set.
    pub fn mark_complete(&mut self, index: u32) {
        if self.unit(index).is_none() {
            return;
        }
        self.ready.remove(&index);
        self.loading.remove(&index);
        self.complete.insert(index);
    }

    /// Records back-end progress for one unit and recomputes the aggregate.
    ///
    /// The aggregate is always tracked; the callback only fires while active.
    pub fn report_progress(&mut self, index: u32, progress: f32) {
        if self.unit(index).is_none() || self.units.is_empty() {
            return;
        }
        let count = self.units.len() as f32;
        self.progress = round_progress((self.complete.len() as f32 + progress) / count);
        if self.status.is_active() {
            self.callbacks.progress(self.progress);
        }
    }

    /// Records the outcome of one unit.
    ///
    /// While siblings are unfinished the unit holds its cache entry. When the
    /// last unit finishes on an active task, the completion callback fires,
    /// every hold is released and the task becomes `Completed`. A paused task
    /// defers all of that to [`LoadTask::resume`].
    pub fn report_unit_complete(
        &mut self,
        index: u32,
        error: Option<String>,
        cache: &mut AssetCache,
    ) {
        let Some(unit) = self.units.get(index as usize) else {
            log::warn!("Task {} has no unit {index}.", self.id);
            return;
        };
        let url = unit.url().to_string();
        let already_held = unit.held().is_some();

        self.mark_complete(index);
        self.errors.insert(url.clone(), error);

        if self.complete.len() != self.units.len() {
            if !already_held {
                if let Some(hold) = cache.hold(&url) {
                    self.units[index as usize].set_hold(hold);
                }
            }
            return;
        }

        if self.status.is_active() {
            self.finish(cache);
        }
    }

    /// Suspends an active task. Results keep being recorded.
    pub fn pause(&mut self) -> Result<(), RequestError> {
        if !self.status.is_active() {
            return Err(self.invalid("pause"));
        }
        self.status = TaskStatus::Paused;
        Ok(())
    }

    /// Leaves `Paused`, re-deriving the status from unit membership.
    ///
    /// - every unit ready: `Ready`
    /// - any unit loading: `Loading`, replaying the last progress
    /// - every unit complete: replays progress, fires completion, releases
    ///   holds and becomes `Completed`
    /// - otherwise (some ready, some complete, none loading): `Ready`
    pub fn resume(&mut self, cache: &mut AssetCache) -> Result<TaskStatus, RequestError> {
        if self.status != TaskStatus::Paused {
            return Err(self.invalid("resume"));
        }
        let count = self.units.len();
        self.status = if self.ready.len() == count {
            TaskStatus::Ready
        } else if !self.loading.is_empty() {
            self.callbacks.progress(self.progress);
            TaskStatus::Loading
        } else if self.complete.len() == count {
            self.callbacks.progress(self.progress);
            self.finish(cache);
            TaskStatus::Completed
        } else {
            TaskStatus::Ready
        };
        Ok(self.status)
    }

    /// Abandons the task. Its callbacks are dropped without firing.
    pub fn cancel(&mut self) -> Result<(), RequestError> {
        if matches!(self.status, TaskStatus::Completed | TaskStatus::Disposed) {
            return Err(self.invalid("cancel"));
        }
        self.status = TaskStatus::Canceled;
        self.callbacks = TaskCallbacks::default();
        Ok(())
    }

    /// Gives back every cache reference the units hold.
    pub fn release_holds(&mut self, cache: &mut AssetCache) {
        for unit in &mut self.units {
            if let Some(hold) = unit.take_hold() {
                cache.let_go(&hold);
            }
        }
    }

    fn finish(&mut self, cache: &mut AssetCache) {
        self.callbacks.complete(&self.errors);
        self.release_holds(cache);
        self.status = TaskStatus::Completed;
        log::trace!("Task {} completed with {} units.", self.id, self.units.len());
    }

    fn invalid(&self, action: &'static str) -> RequestError {
        RequestError::InvalidTransition {
            task: self.id,
            from: self.status,
            action,
        }
    }
}

impl Recyclable for LoadTask {
    type Args = TaskInit;

    fn create(init: TaskInit) -> Self {
        Self::new(init)
    }

    fn reuse(&mut self, init: TaskInit) {
        self.id = init.id;
        self.priority = init.priority;
        self.status = TaskStatus::Ready;
    }

    fn unuse(&mut self) {
        self.units.clear();
        self.ready.clear();
        self.loading.clear();
        self.complete.clear();
        self.callbacks = TaskCallbacks::default();
        self.progress = 0.0;
        self.errors.clear();
        self.priority = lode_core::asset::DEFAULT_PRIORITY;
        self.status = TaskStatus::Disposed;
    }
}
