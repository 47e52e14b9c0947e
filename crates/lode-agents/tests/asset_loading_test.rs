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

use anyhow::Result;
use lode_agents::{AssetAgent, AssetAgentConfig, TaskCallbacks};
use lode_core::agent::{Disposable, Tickable};
use lode_core::asset::{CompletionMap, LoadReporter, LoadRequest, Loader, TaskStatus};
use lode_core::telemetry::MetricId;
use lode_telemetry::MetricsRegistry;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

// --- Test Setup: a back-end that records requests and lets the test answer them ---
type Pending = Rc<RefCell<Vec<(LoadRequest, LoadReporter)>>>;

struct RecordingLoader {
    pending: Pending,
}

impl Loader for RecordingLoader {
    fn load(&self, request: LoadRequest, reporter: LoadReporter) {
        self.pending.borrow_mut().push((request, reporter));
    }
}

struct Harness {
    agent: AssetAgent,
    pending: Pending,
    metrics: Arc<MetricsRegistry>,
    now_ms: u64,
}

impl Harness {
    fn new(config: AssetAgentConfig) -> Result<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let mut agent = AssetAgent::new(config, metrics.clone());
        let pending = Pending::default();
        agent.register_loader(
            "text",
            RecordingLoader {
                pending: pending.clone(),
            },
        );
        agent.register_extension("txt", "text");
        agent.register_cache_type("text", None)?;
        Ok(Self {
            agent,
            pending,
            metrics,
            now_ms: 0,
        })
    }

    fn tick(&mut self, dt_ms: u64) {
        self.now_ms += dt_ms;
        self.agent.tick(self.now_ms, dt_ms);
    }

    fn requested_urls(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .map(|(request, _)| request.url.clone())
            .collect()
    }

    /// Answers the pending request for `url` with its own name as payload.
    fn answer(&self, url: &str) {
        let pending = self.pending.borrow();
        let (request, reporter) = pending
            .iter()
            .find(|(request, _)| request.url == url)
            .expect("no pending request for url");
        reporter.complete(&request.url, request.url.clone());
    }

    fn counter(&self, name: &str) -> u64 {
        self.metrics
            .get_metric(&MetricId::new("assets", name))
            .ok()
            .and_then(|metric| metric.value.as_counter())
            .unwrap_or(0)
    }
}

fn recording() -> (Rc<RefCell<Vec<CompletionMap>>>, TaskCallbacks) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let callbacks =
        TaskCallbacks::new().on_complete(move |info| sink.borrow_mut().push(info.clone()));
    (seen, callbacks)
}
// ---

#[test]
fn test_same_url_is_fetched_once_for_two_tasks() -> Result<()> {
    // --- 1. Setup ---
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (first, first_cb) = recording();
    let (second, second_cb) = recording();

    // --- 2. Request the same url twice ---
    let a = h.agent.load("a.txt", Some("text"), first_cb, 1)?;
    let b = h.agent.load("a.txt", Some("text"), second_cb, 1)?;
    assert!(a.is_some() && b.is_some());
    assert_ne!(a, b);
    h.tick(16);

    // --- 3. Assert: one back-end call, both tasks loading ---
    assert_eq!(h.requested_urls(), vec!["a.txt"]);
    assert_eq!(h.agent.in_flight_count(), 1);
    assert_eq!(h.counter("loads_deduplicated"), 1);

    // --- 4. Complete and assert both callbacks fired with the same outcome ---
    h.answer("a.txt");
    h.tick(16);

    assert_eq!(first.borrow().len(), 1);
    assert_eq!(second.borrow().len(), 1);
    assert_eq!(first.borrow()[0].get("a.txt"), Some(&None));
    assert_eq!(second.borrow()[0].get("a.txt"), Some(&None));
    assert_eq!(h.agent.in_flight_count(), 0);
    assert_eq!(h.agent.task_count(), 0);

    let cached = h.agent.cached_resource("a.txt").expect("result is cached");
    assert_eq!(cached.downcast_ref::<String>().map(String::as_str), Some("a.txt"));
    assert_eq!(h.agent.cache().get("a.txt").map(|e| e.ref_count()), Some(0));
    Ok(())
}

#[test]
fn test_later_task_joins_a_fetch_already_in_flight() -> Result<()> {
    // --- 1. Setup: the first task's fetch is already out ---
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (first, first_cb) = recording();
    let (second, second_cb) = recording();
    let a = h.agent.load("a.txt", None, first_cb, 1)?.expect("task queued");
    h.tick(16);
    assert_eq!(h.requested_urls(), vec!["a.txt"]);

    // --- 2. A higher-priority task asks for the same url ---
    let b = h.agent.load("a.txt", None, second_cb, 0)?.expect("task queued");
    h.tick(16);

    // --- 3. Assert: it joins instead of fetching again ---
    assert_eq!(h.requested_urls(), vec!["a.txt"]);
    assert_eq!(h.agent.in_flight_count(), 1);
    assert_eq!(h.counter("loads_deduplicated"), 1);
    assert_eq!(h.agent.task_status(a), Some(TaskStatus::Loading));
    assert_eq!(h.agent.task_status(b), Some(TaskStatus::Loading));

    // --- 4. One answer completes both tasks once ---
    h.answer("a.txt");
    h.tick(16);

    assert_eq!(first.borrow().len(), 1);
    assert_eq!(second.borrow().len(), 1);
    assert_eq!(first.borrow()[0].get("a.txt"), Some(&None));
    assert_eq!(second.borrow()[0].get("a.txt"), Some(&None));
    assert_eq!(h.requested_urls(), vec!["a.txt"]);
    assert_eq!(h.agent.task_count(), 0);
    Ok(())
}

#[test]
fn test_dispatch_follows_priority_then_arrival() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;

    h.agent.load("p2.txt", None, TaskCallbacks::new(), 2)?;
    h.agent.load("p0.txt", None, TaskCallbacks::new(), 0)?;
    h.agent.load("p1-first.txt", None, TaskCallbacks::new(), 1)?;
    h.agent.load("p1-second.txt", None, TaskCallbacks::new(), 1)?;
    h.tick(16);

    assert_eq!(
        h.requested_urls(),
        vec!["p0.txt", "p1-first.txt", "p1-second.txt", "p2.txt"]
    );
    assert_eq!(h.agent.queued_task_count(), 0);
    Ok(())
}

#[test]
fn test_concurrency_cap_defers_extra_urls() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default().with_max_concurrent_loads(2))?;

    for url in ["1.txt", "2.txt", "3.txt"] {
        h.agent.load(url, None, TaskCallbacks::new(), 1)?;
    }
    h.tick(16);

    assert_eq!(h.requested_urls(), vec!["1.txt", "2.txt"]);
    assert_eq!(h.agent.in_flight_count(), 2);
    assert_eq!(h.agent.queued_task_count(), 1);

    // A finished url frees a slot for the waiting task.
    h.answer("1.txt");
    h.tick(16);

    assert_eq!(h.requested_urls(), vec!["1.txt", "2.txt", "3.txt"]);
    assert_eq!(h.agent.in_flight_count(), 2);
    assert_eq!(h.agent.queued_task_count(), 0);
    Ok(())
}

#[test]
fn test_group_with_cached_url_only_fetches_the_rest() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    h.agent
        .cache_mut()
        .put("text", "x.txt", Arc::new(String::from("cached")))?;
    let (seen, callbacks) = recording();

    let id = h
        .agent
        .load_group(&[("x.txt", None), ("y.txt", None), ("x.txt", None)], callbacks, 1)?
        .expect("y.txt still needs loading");

    // The cached unit is complete and keeps its entry alive.
    let task = h.agent.task(id).expect("task is live");
    assert_eq!(task.len(), 2, "repeated urls collapse into one unit");
    assert_eq!(task.complete_count(), 1);
    assert_eq!(h.agent.cache().get("x.txt").map(|e| e.ref_count()), Some(1));
    assert_eq!(h.counter("cache_hits"), 1);

    h.tick(16);
    assert_eq!(h.requested_urls(), vec!["y.txt"]);
    h.answer("y.txt");
    h.tick(16);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 2);
    assert_eq!(seen[0].get("x.txt"), Some(&None));
    assert_eq!(seen[0].get("y.txt"), Some(&None));
    assert_eq!(h.agent.cache().get("x.txt").map(|e| e.ref_count()), Some(0));
    Ok(())
}

#[test]
fn test_fully_cached_request_completes_synchronously() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    h.agent
        .cache_mut()
        .put("text", "x.txt", Arc::new(String::from("cached")))?;
    let (seen, callbacks) = recording();

    let id = h.agent.load("x.txt", None, callbacks, 1)?;

    assert_eq!(id, None);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(h.agent.task_count(), 0);
    h.tick(16);
    assert!(h.requested_urls().is_empty());
    Ok(())
}

#[test]
fn test_canceled_task_does_not_block_shared_url() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (canceled, canceled_cb) = recording();
    let (kept, kept_cb) = recording();

    let a = h.agent.load("s.txt", None, canceled_cb, 1)?.expect("queued");
    let b = h.agent.load("s.txt", None, kept_cb, 1)?.expect("queued");
    h.tick(16);

    h.agent.cancel_task(a)?;
    assert_eq!(h.agent.task_status(a), Some(TaskStatus::Canceled));
    assert!(h.agent.is_in_flight("s.txt"), "the shared load keeps running");

    h.answer("s.txt");
    h.tick(16);

    assert!(canceled.borrow().is_empty());
    assert_eq!(kept.borrow().len(), 1);
    assert_eq!(h.agent.task_status(a), None);
    assert_eq!(h.agent.task_status(b), None);
    Ok(())
}

#[test]
fn test_unknown_loader_type_fails_the_unit() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (seen, callbacks) = recording();

    h.agent.load("hero.mesh", Some("mesh"), callbacks, 1)?;
    h.tick(16);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    let error = seen[0]
        .get("hero.mesh")
        .cloned()
        .flatten()
        .expect("unit carries an error");
    assert!(error.contains("mesh"), "unexpected error: {error}");
    assert!(h.agent.cached_resource("hero.mesh").is_none());
    assert_eq!(h.agent.in_flight_count(), 0);
    assert_eq!(h.counter("loads_failed"), 1);
    Ok(())
}

#[test]
fn test_backend_error_is_reported_per_url() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (seen, callbacks) = recording();

    h.agent
        .load_group(&[("ok.txt", None), ("bad.txt", None)], callbacks, 1)?;
    h.tick(16);
    h.answer("ok.txt");
    {
        let pending = h.pending.borrow();
        let (_, reporter) = pending
            .iter()
            .find(|(request, _)| request.url == "bad.txt")
            .expect("bad.txt requested");
        reporter.fail("bad.txt", "404");
    }
    h.tick(16);

    let seen = seen.borrow();
    assert_eq!(seen[0].get("ok.txt"), Some(&None));
    assert_eq!(seen[0].get("bad.txt"), Some(&Some("404".to_string())));
    assert!(h.agent.cached_resource("ok.txt").is_some());
    assert!(h.agent.cached_resource("bad.txt").is_none());
    Ok(())
}

#[test]
fn test_pause_defers_completion_until_resume() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (seen, callbacks) = recording();

    let id = h.agent.load("a.txt", None, callbacks, 1)?.expect("queued");
    h.tick(16);
    h.agent.pause_task(id)?;
    h.answer("a.txt");
    h.tick(16);

    assert!(seen.borrow().is_empty());
    assert_eq!(h.agent.task_status(id), Some(TaskStatus::Paused));
    assert!(h.agent.cached_resource("a.txt").is_some());

    assert_eq!(h.agent.resume_task(id)?, TaskStatus::Completed);
    assert_eq!(seen.borrow().len(), 1);

    h.tick(16);
    assert_eq!(h.agent.task_status(id), None);
    assert!(h.agent.resume_task(id).is_err());
    Ok(())
}

#[test]
fn test_paused_ready_task_is_not_dispatched() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;

    let id = h.agent.load("a.txt", None, TaskCallbacks::new(), 1)?.expect("queued");
    h.agent.pause_task(id)?;
    h.tick(16);
    assert!(h.requested_urls().is_empty());

    assert_eq!(h.agent.resume_task(id)?, TaskStatus::Ready);
    h.tick(16);
    assert_eq!(h.requested_urls(), vec!["a.txt"]);
    Ok(())
}

#[test]
fn test_progress_reaches_active_tasks() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let progress = Rc::new(RefCell::new(Vec::new()));
    let sink = progress.clone();
    let callbacks = TaskCallbacks::new().on_progress(move |p| sink.borrow_mut().push(p));

    h.agent
        .load_group(&[("a.txt", None), ("b.txt", None)], callbacks, 1)?;
    h.tick(16);
    {
        let pending = h.pending.borrow();
        pending[0].1.progress("a.txt", 0.5);
    }
    h.tick(16);
    h.answer("a.txt");
    h.tick(16);
    {
        let pending = h.pending.borrow();
        pending[1].1.progress("b.txt", 0.5);
    }
    h.tick(16);

    assert_eq!(*progress.borrow(), vec![0.25, 0.75]);
    Ok(())
}

#[test]
fn test_cache_sweep_runs_on_tick() -> Result<()> {
    let config = AssetAgentConfig::default()
        .with_sweep_interval_ms(1_000)
        .with_default_lifetime_ms(1_000);
    let mut h = Harness::new(config)?;

    h.agent.load("a.txt", None, TaskCallbacks::new(), 1)?;
    h.tick(0);
    h.answer("a.txt");
    h.tick(0);
    assert!(h.agent.cached_resource("a.txt").is_some());

    // Idle for exactly the lifetime: still alive.
    h.tick(1_000);
    assert!(h.agent.cached_resource("a.txt").is_some());

    h.tick(1_000);
    assert!(h.agent.cached_resource("a.txt").is_none());
    Ok(())
}

#[test]
fn test_invalid_requests_are_rejected() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;

    assert!(h.agent.load("", None, TaskCallbacks::new(), 1).is_err());
    assert!(h.agent.load_group(&[], TaskCallbacks::new(), 1).is_err());
    assert!(h.agent.cancel_task(lode_core::asset::TaskId(4242)).is_err());
    assert_eq!(h.agent.task_count(), 0);
    Ok(())
}

#[test]
fn test_dispose_drops_everything() -> Result<()> {
    let mut h = Harness::new(AssetAgentConfig::default())?;
    let (seen, callbacks) = recording();

    h.agent.load("a.txt", None, callbacks, 1)?;
    h.tick(16);
    h.agent.dispose();
    h.answer("a.txt");
    h.tick(16);

    assert!(seen.borrow().is_empty());
    assert_eq!(h.agent.task_count(), 0);
    assert_eq!(h.agent.in_flight_count(), 0);
    assert!(h.agent.cache().is_empty());
    Ok(())
}
