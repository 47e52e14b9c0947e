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

use std::collections::HashMap;

/// Lower bound used by [`IdGenerator::next_default`].
pub const DEFAULT_FIRST_ID: u32 = 0;
/// Upper bound used by [`IdGenerator::next_default`].
pub const DEFAULT_LAST_ID: u32 = 0xFF_FFFF;

/// Per-namespace integer sequences that wrap around.
///
/// Each namespace yields `first, first + 1, ..., last, first, ...`. Wrapping
/// means an id can repeat within a long session; callers that need uniqueness
/// among live objects must check for collisions themselves.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    current: HashMap<String, u32>,
}

impl IdGenerator {
    /// Creates a generator with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id of `namespace` within `first..=last`.
    ///
    /// A namespace starts at `first` on its first use. If the previous id lies
    /// outside the range (the caller changed bounds) the sequence restarts at
    /// `first`.
    pub fn next(&mut self, namespace: &str, first: u32, last: u32) -> u32 {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        let id = match self.current.get(namespace) {
            Some(&prev) if prev >= first && prev < last => prev + 1,
            _ => first,
        };
        self.current.insert(namespace.to_string(), id);
        id
    }

    /// Returns the next id of `namespace` within the default range.
    pub fn next_default(&mut self, namespace: &str) -> u32 {
        self.next(namespace, DEFAULT_FIRST_ID, DEFAULT_LAST_ID)
    }

    /// Forgets every namespace.
    pub fn reset(&mut self) {
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_wraps_inclusive() {
        let mut ids = IdGenerator::new();
        let seq: Vec<u32> = (0..7).map(|_| ids.next("task", 1, 3)).collect();
        assert_eq!(seq, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_default("task"), 0);
        assert_eq!(ids.next_default("task"), 1);
        assert_eq!(ids.next_default("entry"), 0);
        assert_eq!(ids.next_default("task"), 2);
    }

    #[test]
    fn test_single_value_range() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next("one", 5, 5), 5);
        assert_eq!(ids.next("one", 5, 5), 5);
    }

    #[test]
    fn test_default_range_wraps_at_upper_bound() {
        let mut ids = IdGenerator::new();
        ids.next("n", DEFAULT_LAST_ID - 1, DEFAULT_LAST_ID);
        assert_eq!(ids.next_default("n"), DEFAULT_LAST_ID);
        assert_eq!(ids.next_default("n"), DEFAULT_FIRST_ID);
    }

    #[test]
    fn test_reset() {
        let mut ids = IdGenerator::new();
        ids.next_default("a");
        ids.next_default("a");
        ids.reset();
        assert_eq!(ids.next_default("a"), 0);
    }
}
