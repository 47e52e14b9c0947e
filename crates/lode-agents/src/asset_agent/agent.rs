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

//! The AssetAgent schedules load tasks and fans back-end results out to them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lode_core::agent::{Disposable, Tickable};
use lode_core::asset::{
    CacheEntryFactory, ConfigError, LoadEvent, LoadReporter, LoadRequest, Loader, Payload,
    RequestError, TaskId, TaskStatus, UnitId, NONE_TYPE,
};
use lode_core::event::EventBus;
use lode_core::memory::Recyclable;
use lode_core::utils::DEFAULT_LAST_ID;
use lode_core::LoadContext;
use lode_data::AssetCache;
use lode_telemetry::MetricsRegistry;

use super::binding::BindingTable;
use super::config::AssetAgentConfig;
use super::loader::{LoaderMetrics, LoaderRegistry};
use super::queue::TaskQueue;
use super::task::{LoadTask, TaskCallbacks, TaskInit};

const TASK_POOL: &str = "load_task";
const TASK_ID_NAMESPACE: &str = "asset_loader";

/// The asset scheduler.
///
/// Owns every live [`LoadTask`], the priority queue, the url binding table,
/// the set of urls in flight and the [`AssetCache`]. The host drives it by
/// calling [`Tickable::tick`] once per frame.
pub struct AssetAgent {
    config: AssetAgentConfig,
    context: LoadContext,
    loaders: LoaderRegistry,
    cache: AssetCache,
    tasks: HashMap<TaskId, LoadTask>,
    queue: TaskQueue,
    bindings: BindingTable,
    in_flight: HashSet<String>,
    events: EventBus<LoadEvent>,
    metrics: LoaderMetrics,
}

impl AssetAgent {
    /// Creates an agent with no loaders, extensions or cache types.
    pub fn new(config: AssetAgentConfig, metrics_registry: Arc<MetricsRegistry>) -> Self {
        let mut context = LoadContext::new();
        if let Err(e) = context.recycler.register::<LoadTask>(TASK_POOL) {
            log::error!("Failed to register the load task pool: {e}");
        }
        Self {
            cache: AssetCache::new(config.cache_sweep_interval_ms),
            config,
            context,
            loaders: LoaderRegistry::new(),
            tasks: HashMap::new(),
            queue: TaskQueue::new(),
            bindings: BindingTable::new(),
            in_flight: HashSet::new(),
            events: EventBus::new(),
            metrics: LoaderMetrics::new(&metrics_registry),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &AssetAgentConfig {
        &self.config
    }

    /// A reporter feeding this agent's event channel. Back-ends get one with
    /// every request; hosts may also use it directly.
    pub fn reporter(&self) -> LoadReporter {
        LoadReporter::new(self.events.sender())
    }

    /// Registers the back-end for `load_type`, replacing any previous one.
    pub fn register_loader(&mut self, load_type: &str, loader: impl Loader + 'static) {
        self.loaders.register(load_type, Box::new(loader));
    }

    /// Removes the back-end for `load_type`. Loads already in flight still complete.
    pub fn unregister_loader(&mut self, load_type: &str) -> Result<(), ConfigError> {
        if self.loaders.unregister(load_type) {
            Ok(())
        } else {
            Err(ConfigError::UnknownLoaderType(load_type.to_string()))
        }
    }

    /// Whether a back-end is registered for `load_type`.
    pub fn has_loader(&self, load_type: &str) -> bool {
        self.loaders.has_loader(load_type)
    }

    /// Maps the file extension `ext` (without dot) to `load_type`.
    pub fn register_extension(&mut self, ext: &str, load_type: &str) {
        self.loaders.register_extension(ext, load_type);
    }

    /// Removes the mapping of `ext`. Returns whether one existed.
    pub fn unregister_extension(&mut self, ext: &str) -> bool {
        self.loaders.unregister_extension(ext)
    }

    /// Registers a cache type storing payloads as-is.
    ///
    /// `lifetime_ms` defaults to the configured lifetime.
    pub fn register_cache_type(
        &mut self,
        load_type: &str,
        lifetime_ms: Option<u64>,
    ) -> Result<(), ConfigError> {
        let lifetime_ms = lifetime_ms.unwrap_or(self.config.default_lifetime_ms);
        self.cache
            .register_basic_type(load_type, lifetime_ms)
            .inspect_err(|e| log::error!("Cache type registration failed: {e}"))
    }

    /// Registers a cache type whose entries are built by `factory`.
    pub fn register_cache_type_with(
        &mut self,
        load_type: &str,
        factory: CacheEntryFactory,
        lifetime_ms: Option<u64>,
    ) -> Result<(), ConfigError> {
        let lifetime_ms = lifetime_ms.unwrap_or(self.config.default_lifetime_ms);
        self.cache
            .register_type(load_type, factory, lifetime_ms)
            .inspect_err(|e| log::error!("Cache type registration failed: {e}"))
    }

    /// Removes a cache type and every entry stored under it.
    pub fn unregister_cache_type(&mut self, load_type: &str) -> Result<(), ConfigError> {
        self.cache.unregister_type(load_type)
    }

    /// Requests one url.
    ///
    /// `load_type` of `None` infers the type from the url's extension. Returns
    /// `Ok(None)` when the url was already cached: the completion callback has
    /// then already run and no task was created.
    pub fn load(
        &mut self,
        url: &str,
        load_type: Option<&str>,
        callbacks: TaskCallbacks,
        priority: i32,
    ) -> Result<Option<TaskId>, RequestError> {
        if url.is_empty() {
            return Err(RequestError::EmptyUrl);
        }
        self.load_group(&[(url, load_type)], callbacks, priority)
    }

    /// Requests several urls as one task with one completion callback.
    ///
    /// Repeated urls are loaded once. Cached urls complete immediately; the
    /// task only enters the queue if at least one url still needs loading.
    pub fn load_group(
        &mut self,
        group: &[(&str, Option<&str>)],
        callbacks: TaskCallbacks,
        priority: i32,
    ) -> Result<Option<TaskId>, RequestError> {
        if group.is_empty() {
            log::error!("Rejected a load group with no urls.");
            return Err(RequestError::EmptyGroup);
        }
        if group.iter().any(|(url, _)| url.is_empty()) {
            log::error!("Rejected a load group containing an empty url.");
            return Err(RequestError::EmptyUrl);
        }

        let id = self.next_task_id()?;
        let mut task = self.acquire_task(TaskInit { id, priority });
        task.set_callbacks(callbacks);

        let mut seen = HashSet::new();
        for &(url, load_type) in group {
            if seen.insert(url) {
                task.add_unit(url, load_type)?;
            }
        }

        let cached: Vec<u32> = task
            .units()
            .iter()
            .filter(|unit| self.cache.contains(unit.url()))
            .map(|unit| unit.id().index)
            .collect();
        for unit in task.units() {
            if !self.cache.contains(unit.url()) {
                self.bindings.bind(unit.url(), unit.id());
            }
        }

        if !cached.is_empty() {
            LoaderMetrics::bump(&self.metrics.cache_hits, cached.len() as u64);
        }
        for index in cached {
            task.report_unit_complete(index, None, &mut self.cache);
        }

        if task.status() == TaskStatus::Completed {
            log::debug!("Task {id} satisfied from cache.");
            self.recycle_task(task);
            return Ok(None);
        }

        self.queue.insert(id, priority);
        self.tasks.insert(id, task);
        LoaderMetrics::set(&self.metrics.queued_tasks, self.queue.len());
        log::trace!("Queued task {id} with priority {priority}.");
        Ok(Some(id))
    }

    /// Suspends a `Ready` or `Loading` task.
    pub fn pause_task(&mut self, id: TaskId) -> Result<(), RequestError> {
        self.task_mut(id)?
            .pause()
            .inspect_err(|e| log::error!("pause_task: {e}"))
    }

    /// Resumes a paused task and returns the status it resumed into.
    pub fn resume_task(&mut self, id: TaskId) -> Result<TaskStatus, RequestError> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or(RequestError::TaskNotFound(id))?;
        task.resume(&mut self.cache)
            .inspect_err(|e| log::error!("resume_task: {e}"))
    }

    /// Cancels a task. Loads it shares with other tasks keep running for them.
    pub fn cancel_task(&mut self, id: TaskId) -> Result<(), RequestError> {
        self.task_mut(id)?
            .cancel()
            .inspect_err(|e| log::error!("cancel_task: {e}"))
    }

    /// The status of a live task.
    pub fn task_status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(LoadTask::status)
    }

    /// A live task.
    pub fn task(&self, id: TaskId) -> Option<&LoadTask> {
        self.tasks.get(&id)
    }

    /// The cached payload for `url`.
    pub fn cached_resource(&self, url: &str) -> Option<Payload> {
        self.cache.get_payload(url)
    }

    /// The cache.
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// The cache, mutably.
    pub fn cache_mut(&mut self) -> &mut AssetCache {
        &mut self.cache
    }

    /// Number of distinct urls currently handed to back-ends.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether `url` is currently handed to a back-end.
    pub fn is_in_flight(&self, url: &str) -> bool {
        self.in_flight.contains(url)
    }

    /// Number of tasks waiting in the queue.
    pub fn queued_task_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of live tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Delivers back-end progress for `url` to every task waiting on it.
    pub fn report_progress(&mut self, url: &str, progress: f32) {
        self.prune_bindings(url);
        for unit in self.bindings.units(url).to_vec() {
            if let Some(task) = self.tasks.get_mut(&unit.task) {
                task.report_progress(unit.index, progress);
            }
        }
    }

    /// Delivers the back-end result for `url` to every task waiting on it.
    ///
    /// A successful payload is cached once, under the first explicit type
    /// among the waiting units, else the type mapped to the url's extension.
    /// A failed cache write is logged; the tasks still see success.
    pub fn report_complete(&mut self, url: &str, result: Result<Payload, String>) {
        self.in_flight.remove(url);
        self.prune_bindings(url);
        let units = self.bindings.take(url);

        let error = match result {
            Ok(payload) => {
                self.store_result(url, &units, payload);
                None
            }
            Err(error) => {
                log::warn!("Loading '{url}' failed: {error}");
                LoaderMetrics::bump(&self.metrics.loads_failed, 1);
                Some(error)
            }
        };

        for unit in units {
            if let Some(task) = self.tasks.get_mut(&unit.task) {
                task.report_unit_complete(unit.index, error.clone(), &mut self.cache);
            }
        }
        LoaderMetrics::set(&self.metrics.in_flight, self.in_flight.len());
    }

    fn store_result(&mut self, url: &str, units: &[UnitId], payload: Payload) {
        if self.cache.contains(url) {
            log::trace!("'{url}' is already cached.");
            return;
        }
        let explicit = units.iter().find_map(|unit| {
            self.tasks
                .get(&unit.task)
                .and_then(|task| task.unit(unit.index))
                .and_then(|u| u.load_type())
        });
        let load_type = match explicit.or_else(|| self.loaders.type_for_extension(url)) {
            Some(load_type) => load_type.to_string(),
            None if !units.is_empty() => NONE_TYPE.to_string(),
            None => {
                log::debug!("Dropping result for '{url}': no waiting task and no type mapping.");
                return;
            }
        };
        if let Err(e) = self.cache.put(&load_type, url, payload) {
            log::error!("Failed to cache '{url}': {e}");
        }
    }

    /// Drains pending back-end events.
    fn process_events(&mut self) {
        for event in self.events.drain() {
            match event {
                LoadEvent::Progress { url, progress } => self.report_progress(&url, progress),
                LoadEvent::Complete { url, result } => self.report_complete(&url, result),
            }
        }
    }

    /// Hands ready units to back-ends in queue order while below the cap.
    fn dispatch(&mut self) {
        let cap = self.config.max_concurrent_loads();
        if self.in_flight.len() >= cap || self.queue.is_empty() {
            return;
        }

        let mut requests = Vec::new();
        let mut drained = Vec::new();

        for id in self.queue.ids() {
            if self.in_flight.len() >= cap {
                break;
            }
            let ready: Vec<(UnitId, String, Option<String>)> = match self.tasks.get(&id) {
                None => {
                    drained.push(id);
                    continue;
                }
                Some(task) if !task.status().is_active() => continue,
                Some(task) => task
                    .ready_units()
                    .map(|u| (u.id(), u.url().to_string(), u.load_type().map(str::to_string)))
                    .collect(),
            };

            for (unit, url, load_type) in ready {
                if self.in_flight.len() >= cap {
                    break;
                }
                if self.in_flight.contains(&url) {
                    self.bindings.bind(&url, unit);
                    if let Some(task) = self.tasks.get_mut(&unit.task) {
                        task.mark_loading(unit.index);
                    }
                    LoaderMetrics::bump(&self.metrics.loads_deduplicated, 1);
                    log::debug!("'{url}' already in flight; task {} joins it.", unit.task);
                    continue;
                }

                self.bindings.bind(&url, unit);
                let mut joined = 0;
                for &bound in self.bindings.units(&url) {
                    if let Some(task) = self.tasks.get_mut(&bound.task) {
                        if task.status().is_valid() {
                            task.mark_loading(bound.index);
                            if bound != unit {
                                joined += 1;
                            }
                        }
                    }
                }
                if joined > 0 {
                    LoaderMetrics::bump(&self.metrics.loads_deduplicated, joined);
                }
                let load_type = self.loaders.resolve_type(load_type.as_deref(), &url);
                self.in_flight.insert(url.clone());
                requests.push(LoadRequest { url, load_type });
            }

            if self
                .tasks
                .get(&id)
                .is_some_and(|task| task.ready_count() == 0)
            {
                drained.push(id);
            }
        }

        for id in drained {
            self.queue.remove(id);
        }

        for request in requests {
            let url = request.url.clone();
            LoaderMetrics::bump(&self.metrics.loads_dispatched, 1);
            if let Err(e) = self.loaders.dispatch(request, self.reporter()) {
                log::error!("Cannot load '{url}': {e}");
                self.reporter().fail(&url, e.to_string());
            }
        }
    }

    /// Retires completed and canceled tasks.
    fn cleanup(&mut self) {
        let retired: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.status().is_retired())
            .map(|(&id, _)| id)
            .collect();
        for id in retired {
            if let Some(task) = self.tasks.remove(&id) {
                self.queue.remove(id);
                self.bindings.unbind_task(id);
                self.recycle_task(task);
            }
        }
    }

    fn prune_bindings(&mut self, url: &str) {
        let tasks = &self.tasks;
        self.bindings.retain(url, |unit| {
            tasks
                .get(&unit.task)
                .is_some_and(|task| task.status().is_valid())
        });
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut LoadTask, RequestError> {
        self.tasks.get_mut(&id).ok_or_else(|| {
            log::error!("Task {id} not found.");
            RequestError::TaskNotFound(id)
        })
    }

    /// Mints a task id not owned by any live task.
    ///
    /// Among `live + 1` consecutive ids at least one is free, so the search is bounded.
    fn next_task_id(&mut self) -> Result<TaskId, RequestError> {
        for _ in 0..=self.tasks.len() {
            let id = TaskId(self.context.ids.next(TASK_ID_NAMESPACE, 1, DEFAULT_LAST_ID));
            if !self.tasks.contains_key(&id) {
                return Ok(id);
            }
            log::warn!("Task id {id} wrapped onto a live task; skipping it.");
        }
        Err(RequestError::IdsExhausted)
    }

    fn acquire_task(&mut self, init: TaskInit) -> LoadTask {
        self.context
            .recycler
            .acquire::<LoadTask>(TASK_POOL, init)
            .unwrap_or_else(|e| {
                log::warn!("Load task pool unavailable ({e}); allocating.");
                LoadTask::create(init)
            })
    }

    fn recycle_task(&mut self, mut task: LoadTask) {
        task.release_holds(&mut self.cache);
        if let Err(e) = self.context.recycler.release(TASK_POOL, task) {
            log::warn!("Dropping load task instead of recycling it: {e}");
        }
    }
}

impl Tickable for AssetAgent {
    fn tick(&mut self, now_ms: u64, dt_ms: u64) {
        self.cache.tick(now_ms, dt_ms);
        self.process_events();
        self.dispatch();
        self.process_events();
        self.cleanup();
        LoaderMetrics::set(&self.metrics.in_flight, self.in_flight.len());
        LoaderMetrics::set(&self.metrics.queued_tasks, self.queue.len());
    }
}

impl Disposable for AssetAgent {
    fn dispose(&mut self) {
        self.loaders.clear();
        let tasks: Vec<LoadTask> = self.tasks.drain().map(|(_, task)| task).collect();
        for task in tasks {
            self.recycle_task(task);
        }
        self.bindings.clear();
        self.queue.clear();
        self.in_flight.clear();
        self.events.drain();
        self.cache.dispose();
        LoaderMetrics::set(&self.metrics.in_flight, 0);
        LoaderMetrics::set(&self.metrics.queued_tasks, 0);
        log::debug!("AssetAgent disposed.");
    }
}
