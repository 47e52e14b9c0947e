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

//! Defines the hierarchy of error types for the asset pipeline.
//!
//! None of these errors unwind: every fallible operation returns them as values
//! and leaves state untouched. Back-end load failures are not represented here;
//! they travel as strings inside a task's [`CompletionMap`](super::CompletionMap).

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// A registration call was rejected. The registration is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A cache store already exists for this type.
    #[error("cache type '{0}' is already registered")]
    DuplicateCacheType(String),
    /// The lifetime is shorter than the sweep interval and could never be observed as expired.
    #[error("lifetime {lifetime_ms}ms of cache type '{load_type}' is below the sweep interval {sweep_interval_ms}ms")]
    LifetimeBelowSweepInterval {
        /// The type being registered.
        load_type: String,
        /// The requested lifetime.
        lifetime_ms: u64,
        /// The cache's sweep interval.
        sweep_interval_ms: u64,
    },
    /// No cache store exists for this type.
    #[error("cache type '{0}' is not registered")]
    UnknownCacheType(String),
    /// No loader back-end exists for this type.
    #[error("no loader registered for type '{0}'")]
    UnknownLoaderType(String),
}

/// A load or task-control request was rejected without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The url was empty.
    #[error("cannot load an empty url")]
    EmptyUrl,
    /// A group request contained no urls.
    #[error("load group contains no urls")]
    EmptyGroup,
    /// No live task has this id.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    /// The task's current status does not allow the action.
    #[error("cannot {action} task {task} while it is {from}")]
    InvalidTransition {
        /// The task the action targeted.
        task: TaskId,
        /// The status the task was in.
        from: TaskStatus,
        /// The rejected action.
        action: &'static str,
    },
    /// Units can only be added while a task is `Ready`.
    #[error("task {0} no longer accepts units")]
    TaskNotReady(TaskId),
    /// Every task id in range belongs to a live task.
    #[error("no free task id")]
    IdsExhausted,
}

/// A cache write or lookup failed. Cache writes are best-effort: callers log
/// the error and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No store is registered for the type.
    #[error("no cache store for type '{0}'")]
    UnknownType(String),
    /// An entry already exists for the url; entries are never overwritten.
    #[error("url '{url}' is already cached under type '{load_type}'")]
    DuplicateEntry {
        /// The type the url is already cached under.
        load_type: String,
        /// The url that is already cached.
        url: String,
    },
    /// Nothing is cached for the url.
    #[error("url '{0}' is not cached")]
    NotCached(String),
}
