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

//! Capability traits for subsystems driven by the host's frame loop.

/// A subsystem that advances once per host frame.
///
/// The host guarantees that every call happens on the same thread and that
/// `now_ms` never decreases between calls.
pub trait Tickable {
    /// Advances the subsystem.
    ///
    /// # Arguments
    /// * `now_ms` - The host clock in milliseconds.
    /// * `dt_ms` - Milliseconds elapsed since the previous tick.
    fn tick(&mut self, now_ms: u64, dt_ms: u64);
}

/// A subsystem owning resources that must be released explicitly.
///
/// After `dispose` the value is empty but still usable; re-registration starts
/// from a clean state.
pub trait Disposable {
    /// Releases everything the subsystem owns.
    fn dispose(&mut self);
}
