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

//! Configuration of the asset scheduler.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunables of the [`AssetAgent`](super::AssetAgent).
///
/// Can be built in code or read from RON:
///
/// ```
/// use lode_agents::AssetAgentConfig;
///
/// let config = AssetAgentConfig::from_ron_str("(max_concurrent_loads: 4)").unwrap();
/// assert_eq!(config.max_concurrent_loads(), 4);
/// assert_eq!(config.cache_sweep_interval_ms, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetAgentConfig {
    /// Upper bound on distinct urls in flight. Zero is treated as one.
    pub max_concurrent_loads: usize,
    /// How often the cache sweeps expired entries. Zero disables the sweep.
    pub cache_sweep_interval_ms: u64,
    /// Lifetime given to cache types registered without one.
    pub default_lifetime_ms: u64,
}

impl Default for AssetAgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: 10,
            cache_sweep_interval_ms: 10_000,
            default_lifetime_ms: 600_000,
        }
    }
}

impl AssetAgentConfig {
    /// Parses a config from RON. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).context("Failed to parse asset agent config")
    }

    /// Sets the concurrency cap.
    pub fn with_max_concurrent_loads(mut self, max: usize) -> Self {
        self.max_concurrent_loads = max;
        self
    }

    /// Sets the cache sweep interval.
    pub fn with_sweep_interval_ms(mut self, interval_ms: u64) -> Self {
        self.cache_sweep_interval_ms = interval_ms;
        self
    }

    /// Sets the default cache lifetime.
    pub fn with_default_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.default_lifetime_ms = lifetime_ms;
        self
    }

    /// The effective concurrency cap, at least one.
    pub fn max_concurrent_loads(&self) -> usize {
        self.max_concurrent_loads.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssetAgentConfig::default();
        assert_eq!(config.max_concurrent_loads(), 10);
        assert_eq!(config.cache_sweep_interval_ms, 10_000);
        assert_eq!(config.default_lifetime_ms, 600_000);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let config = AssetAgentConfig::default().with_max_concurrent_loads(0);
        assert_eq!(config.max_concurrent_loads(), 1);
    }

    #[test]
    fn test_from_ron() {
        let config = AssetAgentConfig::from_ron_str(
            "(max_concurrent_loads: 2, cache_sweep_interval_ms: 0, default_lifetime_ms: 5000)",
        )
        .unwrap();
        assert_eq!(
            config,
            AssetAgentConfig::default()
                .with_max_concurrent_loads(2)
                .with_sweep_interval_ms(0)
                .with_default_lifetime_ms(5_000)
        );
        assert!(AssetAgentConfig::from_ron_str("(max_concurrent_loads: \"x\")").is_err());
    }
}
