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
use lode_sdk::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_group_of_mixed_files_loads_and_caches_by_type() -> Result<()> {
    // --- 1. Setup: a small asset directory ---
    let dir = tempdir()?;
    std::fs::write(dir.path().join("readme.txt"), "hi")?;
    std::fs::write(dir.path().join("level.json"), r#"{"name": "intro"}"#)?;
    std::fs::write(dir.path().join("hero.png"), [0x89u8, b'P', b'N', b'G'])?;
    std::fs::write(dir.path().join("blob.dat"), [7u8])?;
    let mut manager = LoadManager::synchronous(dir.path(), AssetAgentConfig::default())?;

    // --- 2. Load everything as one group ---
    let outcome = Rc::new(RefCell::new(None::<CompletionMap>));
    let sink = outcome.clone();
    manager.load_group(
        &[
            ("readme.txt", None),
            ("level.json", None),
            ("hero.png", None),
            ("blob.dat", None),
            ("missing.txt", None),
        ],
        TaskCallbacks::new().on_complete(move |info| *sink.borrow_mut() = Some(info.clone())),
        DEFAULT_PRIORITY,
    )?;
    manager.tick(0, 0);

    // --- 3. Assert: per-url outcomes and typed payloads ---
    let outcome = outcome.borrow().clone().expect("group completed in one tick");
    assert_eq!(outcome.len(), 5);
    assert!(outcome["missing.txt"].is_some());
    assert_eq!(outcome.values().filter(|e| e.is_none()).count(), 4);

    let text = manager.get("readme.txt").expect("text cached");
    assert_eq!(text.downcast_ref::<String>().map(String::as_str), Some("hi"));

    let json = manager.get("level.json").expect("json cached");
    let json = json
        .downcast_ref::<serde_json::Value>()
        .expect("json is parsed");
    assert_eq!(json["name"], "intro");

    let image = manager.get("hero.png").expect("image cached");
    assert_eq!(image.downcast_ref::<Vec<u8>>().map(Vec::len), Some(4));
    assert_eq!(manager.agent().cache().type_of("hero.png"), Some("image"));
    assert_eq!(manager.agent().cache().type_of("blob.dat"), Some("None"));

    assert!(manager.get("missing.txt").is_none());
    assert!(manager.is_idle());
    Ok(())
}

#[test]
fn test_threaded_manager_completes_across_ticks() -> Result<()> {
    let dir = tempdir()?;
    std::fs::write(dir.path().join("a.txt"), "async")?;
    let mut manager = LoadManager::new(dir.path(), AssetAgentConfig::default())?;

    let done = Rc::new(RefCell::new(false));
    let flag = done.clone();
    manager.load(
        "a.txt",
        None,
        TaskCallbacks::new().on_complete(move |_| *flag.borrow_mut() = true),
        DEFAULT_PRIORITY,
    )?;

    let mut now_ms = 0;
    while !*done.borrow() && now_ms < 5_000 {
        std::thread::sleep(Duration::from_millis(5));
        now_ms += 5;
        manager.tick(now_ms, 5);
    }

    assert!(*done.borrow(), "load did not complete in time");
    assert!(manager.get("a.txt").is_some());
    Ok(())
}
