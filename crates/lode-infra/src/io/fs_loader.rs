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

use anyhow::{Context, Result};
use lode_core::asset::{LoadReporter, LoadRequest, Loader, Payload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// How an [`FsLoader`] turns file bytes into a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// UTF-8 text, delivered as a `String`.
    Text,
    /// Raw bytes, delivered as a `Vec<u8>`.
    Binary,
}

/// A [`Loader`] that resolves urls relative to a root directory.
///
/// Each request is read on its own worker thread; the result comes back
/// through the request's reporter. A synchronous loader reads inline, which
/// keeps tests and tools deterministic.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
    mode: ReadMode,
    threaded: bool,
}

impl FsLoader {
    /// Creates a threaded loader reading from `root`.
    pub fn new(root: impl AsRef<Path>, mode: ReadMode) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode,
            threaded: true,
        }
    }

    /// Reads files on the calling thread instead of spawning workers.
    pub fn synchronous(mut self) -> Self {
        self.threaded = false;
        self
    }

    /// The directory urls are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The payload format this loader produces.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    fn fetch(root: &Path, mode: ReadMode, request: &LoadRequest, reporter: &LoadReporter) {
        reporter.progress(&request.url, 0.0);
        match read(root, mode, &request.url) {
            Ok(payload) => {
                reporter.progress(&request.url, 1.0);
                reporter.complete_shared(&request.url, payload);
            }
            Err(e) => {
                log::warn!("{e:#}");
                reporter.fail(&request.url, format!("{e:#}"));
            }
        }
    }
}

impl Loader for FsLoader {
    fn load(&self, request: LoadRequest, reporter: LoadReporter) {
        if !self.threaded {
            Self::fetch(&self.root, self.mode, &request, &reporter);
            return;
        }

        let root = self.root.clone();
        let mode = self.mode;
        let url = request.url.clone();
        let failure = reporter.clone();
        let spawned = thread::Builder::new()
            .name("lode-fs-reader".to_string())
            .spawn(move || Self::fetch(&root, mode, &request, &reporter));
        if let Err(e) = spawned {
            log::error!("Failed to spawn a reader for '{url}': {e}");
            failure.fail(&url, format!("failed to spawn reader: {e}"));
        }
    }
}

fn read(root: &Path, mode: ReadMode, url: &str) -> Result<Payload> {
    let path = root.join(url);
    let payload: Payload = match mode {
        ReadMode::Text => Arc::new(
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read text from '{}'", path.display()))?,
        ),
        ReadMode::Binary => Arc::new(
            std::fs::read(&path)
                .with_context(|| format!("Failed to read bytes from '{}'", path.display()))?,
        ),
    };
    log::trace!("Read '{}'.", path.display());
    Ok(payload)
}
