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

//! The public-facing SDK of the lode asset pipeline.
//!
//! [`LoadManager`] wires an [`AssetAgent`] to filesystem back-ends, the usual
//! extension table and one cache store per load type. Hosts that need a
//! different setup can build an [`AssetAgent`] themselves.

use anyhow::{Context, Result};
use lode_agents::{AssetAgent, AssetAgentConfig, TaskCallbacks};
use lode_core::agent::{Disposable, Tickable};
use lode_core::asset::{Payload, RequestError, TaskId, TaskStatus, NONE_TYPE};
use lode_infra::{FsLoader, ReadMode, TextCacheEntry};
use lode_telemetry::MetricsRegistry;
use std::path::Path;
use std::sync::Arc;

pub use lode_agents;
pub use lode_core;
pub use lode_telemetry;

/// Commonly used types.
pub mod prelude {
    pub use lode_agents::{AssetAgentConfig, TaskCallbacks};
    pub use lode_core::agent::{Disposable, Tickable};
    pub use lode_core::asset::{CompletionMap, Payload, TaskId, TaskStatus, DEFAULT_PRIORITY};
    pub use crate::LoadManager;
}

/// Load type for raw binary files.
pub const ARRAY_BUFFER_TYPE: &str = "arraybuffer";
/// Load type for images, delivered as encoded bytes.
pub const IMAGE_TYPE: &str = "image";
/// Load type for text files.
pub const TEXT_TYPE: &str = "text";
/// Load type for audio clips, delivered as encoded bytes.
pub const AUDIO_TYPE: &str = "audio";

const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("binary", ARRAY_BUFFER_TYPE),
    ("png", IMAGE_TYPE),
    ("jpg", IMAGE_TYPE),
    ("txt", TEXT_TYPE),
    ("xml", TEXT_TYPE),
    ("json", TEXT_TYPE),
    ("mp3", AUDIO_TYPE),
    ("ogg", AUDIO_TYPE),
    ("wav", AUDIO_TYPE),
    ("m4a", AUDIO_TYPE),
];

const BINARY_TYPES: &[&str] = &[ARRAY_BUFFER_TYPE, IMAGE_TYPE, AUDIO_TYPE, NONE_TYPE];

/// An [`AssetAgent`] preconfigured to load from a directory.
pub struct LoadManager {
    agent: AssetAgent,
    metrics: Arc<MetricsRegistry>,
}

impl LoadManager {
    /// Creates a manager whose back-ends read files under `root` on worker threads.
    pub fn new(root: impl AsRef<Path>, config: AssetAgentConfig) -> Result<Self> {
        Self::build(root.as_ref(), config, true)
    }

    /// Creates a manager whose back-ends read files inline, completing every
    /// load within the tick that dispatches it.
    pub fn synchronous(root: impl AsRef<Path>, config: AssetAgentConfig) -> Result<Self> {
        Self::build(root.as_ref(), config, false)
    }

    fn build(root: &Path, config: AssetAgentConfig, threaded: bool) -> Result<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let mut agent = AssetAgent::new(config, metrics.clone());

        for &(ext, load_type) in DEFAULT_EXTENSIONS {
            agent.register_extension(ext, load_type);
        }

        let loader = |mode| {
            let loader = FsLoader::new(root, mode);
            if threaded {
                loader
            } else {
                loader.synchronous()
            }
        };
        agent.register_loader(TEXT_TYPE, loader(ReadMode::Text));
        for &load_type in BINARY_TYPES {
            agent.register_loader(load_type, loader(ReadMode::Binary));
        }

        agent
            .register_cache_type_with(TEXT_TYPE, TextCacheEntry::factory(), None)
            .with_context(|| format!("Failed to register cache type '{TEXT_TYPE}'"))?;
        for &load_type in BINARY_TYPES {
            agent
                .register_cache_type(load_type, None)
                .with_context(|| format!("Failed to register cache type '{load_type}'"))?;
        }

        log::info!("LoadManager ready, reading from '{}'.", root.display());
        Ok(Self { agent, metrics })
    }

    /// Requests one url. See [`AssetAgent::load`].
    pub fn load(
        &mut self,
        url: &str,
        load_type: Option<&str>,
        callbacks: TaskCallbacks,
        priority: i32,
    ) -> Result<Option<TaskId>, RequestError> {
        self.agent.load(url, load_type, callbacks, priority)
    }

    /// Requests several urls as one task. See [`AssetAgent::load_group`].
    pub fn load_group(
        &mut self,
        group: &[(&str, Option<&str>)],
        callbacks: TaskCallbacks,
        priority: i32,
    ) -> Result<Option<TaskId>, RequestError> {
        self.agent.load_group(group, callbacks, priority)
    }

    /// Suspends a task.
    pub fn pause(&mut self, id: TaskId) -> Result<(), RequestError> {
        self.agent.pause_task(id)
    }

    /// Resumes a paused task.
    pub fn resume(&mut self, id: TaskId) -> Result<TaskStatus, RequestError> {
        self.agent.resume_task(id)
    }

    /// Cancels a task.
    pub fn cancel(&mut self, id: TaskId) -> Result<(), RequestError> {
        self.agent.cancel_task(id)
    }

    /// The cached payload for `url`.
    pub fn get(&self, url: &str) -> Option<Payload> {
        self.agent.cached_resource(url)
    }

    /// Whether no task is live and nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.agent.task_count() == 0 && self.agent.in_flight_count() == 0
    }

    /// The underlying scheduler.
    pub fn agent(&self) -> &AssetAgent {
        &self.agent
    }

    /// The underlying scheduler, mutably.
    pub fn agent_mut(&mut self) -> &mut AssetAgent {
        &mut self.agent
    }

    /// The registry the scheduler reports metrics to.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }
}

impl Tickable for LoadManager {
    fn tick(&mut self, now_ms: u64, dt_ms: u64) {
        self.agent.tick(now_ms, dt_ms);
    }
}

impl Disposable for LoadManager {
    fn dispose(&mut self) {
        self.agent.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_setup() {
        let dir = tempfile::tempdir().unwrap();
        let manager = LoadManager::synchronous(dir.path(), AssetAgentConfig::default()).unwrap();
        let agent = manager.agent();

        for load_type in [TEXT_TYPE, ARRAY_BUFFER_TYPE, IMAGE_TYPE, AUDIO_TYPE, NONE_TYPE] {
            assert!(agent.has_loader(load_type), "missing loader for {load_type}");
            assert!(agent.cache().has_type(load_type), "missing cache for {load_type}");
            assert_eq!(agent.cache().lifetime_of(load_type), Some(600_000));
        }
        assert!(manager.is_idle());
    }

    #[test]
    fn test_sweep_interval_above_lifetime_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetAgentConfig::default().with_sweep_interval_ms(700_000);

        let error = LoadManager::new(dir.path(), config).err().unwrap();
        assert!(format!("{error:#}").contains("text"));
    }
}
