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

//! The loader back-end registry and the metric handles the scheduler reports through.

use lode_core::asset::{file_extension, ConfigError, LoadReporter, LoadRequest, Loader, NONE_TYPE};
use lode_telemetry::{CounterHandle, GaugeHandle, MetricsRegistry};
use std::collections::HashMap;

const METRICS_NAMESPACE: &str = "assets";

/// Metric handles of the scheduler. A handle that failed to register is `None`.
pub(crate) struct LoaderMetrics {
    pub(crate) loads_dispatched: Option<CounterHandle>,
    pub(crate) loads_deduplicated: Option<CounterHandle>,
    pub(crate) loads_failed: Option<CounterHandle>,
    pub(crate) cache_hits: Option<CounterHandle>,
    pub(crate) in_flight: Option<GaugeHandle>,
    pub(crate) queued_tasks: Option<GaugeHandle>,
}

impl LoaderMetrics {
    pub(crate) fn new(registry: &MetricsRegistry) -> Self {
        let counter = |name: &str, description: &str| {
            registry
                .register_counter(METRICS_NAMESPACE, name, description)
                .map_err(|e| log::error!("Failed to register metric '{name}': {e}"))
                .ok()
        };
        let gauge = |name: &str, description: &str, unit: &str| {
            registry
                .register_gauge(METRICS_NAMESPACE, name, description, unit)
                .map_err(|e| log::error!("Failed to register metric '{name}': {e}"))
                .ok()
        };
        Self {
            loads_dispatched: counter("loads_dispatched", "Urls handed to a loader back-end"),
            loads_deduplicated: counter(
                "loads_deduplicated",
                "Units attached to a url that was already in flight",
            ),
            loads_failed: counter("loads_failed", "Urls whose back-end reported an error"),
            cache_hits: counter("cache_hits", "Units satisfied from the cache at request time"),
            in_flight: gauge("in_flight", "Urls awaiting a back-end result", "urls"),
            queued_tasks: gauge("queued_tasks", "Tasks waiting in the priority queue", "tasks"),
        }
    }

    pub(crate) fn bump(handle: &Option<CounterHandle>, amount: u64) {
        if let Some(handle) = handle {
            if let Err(e) = handle.increment_by(amount) {
                log::warn!("Failed to update metric {}: {e}", handle.id());
            }
        }
    }

    pub(crate) fn set(handle: &Option<GaugeHandle>, value: usize) {
        if let Some(handle) = handle {
            if let Err(e) = handle.set(value as f64) {
                log::warn!("Failed to update metric {}: {e}", handle.id());
            }
        }
    }
}

/// Loader back-ends by load type, plus the extension table used to infer a
/// type when a unit has none.
#[derive(Default)]
pub(crate) struct LoaderRegistry {
    loaders: HashMap<String, Box<dyn Loader>>,
    extensions: HashMap<String, String>,
}

impl LoaderRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `loader` for `load_type`, replacing any previous one.
    pub(crate) fn register(&mut self, load_type: &str, loader: Box<dyn Loader>) {
        if self
            .loaders
            .insert(load_type.to_string(), loader)
            .is_some()
        {
            log::warn!("Replaced the loader registered for type '{load_type}'.");
        }
    }

    pub(crate) fn unregister(&mut self, load_type: &str) -> bool {
        self.loaders.remove(load_type).is_some()
    }

    pub(crate) fn has_loader(&self, load_type: &str) -> bool {
        self.loaders.contains_key(load_type)
    }

    pub(crate) fn register_extension(&mut self, ext: &str, load_type: &str) {
        self.extensions
            .insert(ext.to_string(), load_type.to_string());
    }

    pub(crate) fn unregister_extension(&mut self, ext: &str) -> bool {
        self.extensions.remove(ext).is_some()
    }

    /// The type mapped to the extension of `url`.
    pub(crate) fn type_for_extension(&self, url: &str) -> Option<&str> {
        let ext = file_extension(url)?;
        self.extensions.get(ext).map(String::as_str)
    }

    /// The explicit type, else the extension mapping, else [`NONE_TYPE`].
    pub(crate) fn resolve_type(&self, explicit: Option<&str>, url: &str) -> String {
        explicit
            .or_else(|| self.type_for_extension(url))
            .unwrap_or(NONE_TYPE)
            .to_string()
    }

    /// Hands `request` to the back-end of its type.
    pub(crate) fn dispatch(
        &self,
        request: LoadRequest,
        reporter: LoadReporter,
    ) -> Result<(), ConfigError> {
        let loader = self
            .loaders
            .get(&request.load_type)
            .ok_or_else(|| ConfigError::UnknownLoaderType(request.load_type.clone()))?;
        log::trace!("Dispatching '{}' as '{}'.", request.url, request.load_type);
        loader.load(request, reporter);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.loaders.clear();
        self.extensions.clear();
    }
}
