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
use lode_core::asset::{LoadEvent, LoadReporter, LoadRequest, Loader};
use lode_infra::{FsLoader, ReadMode};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_threaded_reads_report_back_through_the_channel() -> Result<()> {
    // --- 1. Setup: two files on disk ---
    let dir = tempdir()?;
    std::fs::create_dir(dir.path().join("sub"))?;
    std::fs::write(dir.path().join("sub/one.bin"), [1u8, 2, 3])?;
    std::fs::write(dir.path().join("two.bin"), [4u8])?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let loader = FsLoader::new(dir.path(), ReadMode::Binary);

    // --- 2. Load both on worker threads ---
    for url in ["sub/one.bin", "two.bin"] {
        loader.load(
            LoadRequest {
                url: url.to_string(),
                load_type: "binary".to_string(),
            },
            LoadReporter::new(tx.clone()),
        );
    }

    // --- 3. Assert: one completion per url, in any order ---
    let mut completed = Vec::new();
    while completed.len() < 2 {
        if let LoadEvent::Complete { url, result } = rx.recv_timeout(Duration::from_secs(5))? {
            let bytes = result
                .map_err(anyhow::Error::msg)?
                .downcast_ref::<Vec<u8>>()
                .cloned()
                .unwrap_or_default();
            completed.push((url, bytes));
        }
    }
    completed.sort();
    assert_eq!(
        completed,
        vec![
            ("sub/one.bin".to_string(), vec![1, 2, 3]),
            ("two.bin".to_string(), vec![4]),
        ]
    );
    Ok(())
}
