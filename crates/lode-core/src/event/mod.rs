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

//! Provides the channel loader back-ends use to report back to the scheduler.
//!
//! The [`EventBus`] is a generic multi-producer, single-consumer queue. The
//! scheduler owns one bus of [`LoadEvent`](crate::asset::LoadEvent)s and hands
//! out senders wrapped in a [`LoadReporter`](crate::asset::LoadReporter), so a
//! back-end may report from any thread while all state stays on the tick thread.

mod bus;

pub use self::bus::EventBus;
