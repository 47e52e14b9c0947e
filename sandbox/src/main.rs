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

// Loads a set of files through LoadManager and reports what happened.
// Run with: cargo run -p sandbox -- <root> <url>...

use anyhow::{Context, Result};
use clap::Parser;
use lode_sdk::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

const FRAME_MS: u64 = 16;

#[derive(Debug, Parser)]
#[command(version, about = "Loads files through the lode asset pipeline")]
struct Args {
    /// Directory urls are resolved against.
    root: PathBuf,

    /// Urls to load, relative to the root.
    #[arg(required = true)]
    urls: Vec<String>,

    /// RON file with an AssetAgentConfig.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load every url as its own task instead of one group.
    #[arg(long)]
    separate: bool,

    /// Give up after this many milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

fn load_config(path: Option<&PathBuf>) -> Result<AssetAgentConfig> {
    let Some(path) = path else {
        return Ok(AssetAgentConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    AssetAgentConfig::from_ron_str(&text)
}

/// Milliseconds elapsed between two clock reads.
fn frame_delta(previous_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(previous_ms)
}

fn main() -> Result<()> {
    lode_telemetry::logging::init_logging()?;
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    let mut manager = LoadManager::new(&args.root, config)?;

    let pending = Rc::new(RefCell::new(0usize));
    let outcomes = Rc::new(RefCell::new(CompletionMap::new()));
    let callbacks = |label: String| {
        *pending.borrow_mut() += 1;
        let (pending, outcomes) = (pending.clone(), outcomes.clone());
        TaskCallbacks::new()
            .on_progress(move |p| log::debug!("{label}: {:.0}%", p * 100.0))
            .on_complete(move |info| {
                *pending.borrow_mut() -= 1;
                outcomes.borrow_mut().extend(info.clone());
            })
    };

    if args.separate {
        for url in &args.urls {
            manager.load(url, None, callbacks(url.clone()), DEFAULT_PRIORITY)?;
        }
    } else {
        let group: Vec<(&str, Option<&str>)> =
            args.urls.iter().map(|url| (url.as_str(), None)).collect();
        manager.load_group(&group, callbacks("group".to_string()), DEFAULT_PRIORITY)?;
    }

    let start = Instant::now();
    let mut now_ms = 0;
    while *pending.borrow() > 0 && now_ms < args.timeout_ms {
        std::thread::sleep(Duration::from_millis(FRAME_MS));
        let previous_ms = now_ms;
        now_ms = start.elapsed().as_millis() as u64;
        manager.tick(now_ms, frame_delta(previous_ms, now_ms));
    }

    if *pending.borrow() > 0 {
        log::warn!("Timed out after {now_ms}ms with {} task(s) pending.", pending.borrow());
    }

    let mut urls: Vec<_> = outcomes.borrow().keys().cloned().collect();
    urls.sort();
    for url in urls {
        match (outcomes.borrow().get(&url).cloned().flatten(), manager.get(&url)) {
            (Some(error), _) => log::error!("{url}: {error}"),
            (None, Some(_)) => {
                let load_type = manager.agent().cache().type_of(&url).unwrap_or("?");
                log::info!("{url}: loaded as '{load_type}'");
            }
            (None, None) => log::info!("{url}: loaded"),
        }
    }

    for metric in manager.metrics().namespace_metrics("assets") {
        log::info!("{}: {:?}", metric.id, metric.value);
    }

    manager.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_delta_tracks_the_clock() {
        assert_eq!(frame_delta(0, 16), 16);
        assert_eq!(frame_delta(16, 50), 34);
        assert_eq!(frame_delta(50, 50), 0);
        assert_eq!(frame_delta(60, 50), 0);
    }
}
