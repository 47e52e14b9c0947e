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

//! Acts as the scheduler of the asset pipeline.
//!
//! A request becomes a [`LoadTask`] made of [`LoadUnit`]s, one per url. Tasks
//! wait in a priority queue (smaller numbers first, FIFO among equals). Each
//! tick the [`AssetAgent`] pulls ready units in queue order while fewer urls
//! than the concurrency cap are in flight, and hands every distinct url to its
//! loader back-end exactly once. A binding table remembers which units across
//! all tasks wait on each url, so one back-end result reaches every one of them.
//!
//! Everything here runs on the host's tick thread. Back-ends may finish on
//! other threads; they report through a channel that the agent drains while
//! ticking.

pub mod agent;
mod binding;
pub mod config;
mod loader;
mod queue;
pub mod task;
pub mod unit;

pub use self::agent::AssetAgent;
pub use self::config::AssetAgentConfig;
pub use self::task::{LoadTask, TaskCallbacks, TaskInit};
pub use self::unit::LoadUnit;
