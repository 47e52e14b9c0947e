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

use super::Payload;
use crossbeam_channel::Sender;
use std::any::Any;
use std::sync::Arc;

/// One back-end fetch: the url to load and the type it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// The resource location, as passed by the caller.
    pub url: String,
    /// The resolved load type.
    pub load_type: String,
}

/// A notification sent by a loader back-end about one url.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// The fetch of `url` advanced to `progress` (0.0 ..= 1.0).
    Progress {
        /// The url being fetched.
        url: String,
        /// Fraction complete.
        progress: f32,
    },
    /// The fetch of `url` finished.
    Complete {
        /// The url that was fetched.
        url: String,
        /// The loaded payload, or the back-end's error message.
        result: Result<Payload, String>,
    },
}

impl LoadEvent {
    /// The url this event concerns.
    pub fn url(&self) -> &str {
        match self {
            LoadEvent::Progress { url, .. } | LoadEvent::Complete { url, .. } => url,
        }
    }
}

/// The channel a loader back-end uses to report back to the scheduler.
///
/// Cheap to clone and safe to move to worker threads. Reports sent after the
/// scheduler is gone are dropped with a log line.
#[derive(Debug, Clone)]
pub struct LoadReporter {
    sender: Sender<LoadEvent>,
}

impl LoadReporter {
    /// Wraps the sending end of an event channel.
    pub fn new(sender: Sender<LoadEvent>) -> Self {
        Self { sender }
    }

    /// Reports fetch progress for `url`.
    pub fn progress(&self, url: &str, progress: f32) {
        self.send(LoadEvent::Progress {
            url: url.to_string(),
            progress: progress.clamp(0.0, 1.0),
        });
    }

    /// Reports a successful fetch of `url`.
    pub fn complete<T: Any + Send + Sync>(&self, url: &str, value: T) {
        self.complete_shared(url, Arc::new(value));
    }

    /// Reports a successful fetch of `url` with an already shared payload.
    pub fn complete_shared(&self, url: &str, payload: Payload) {
        self.send(LoadEvent::Complete {
            url: url.to_string(),
            result: Ok(payload),
        });
    }

    /// Reports a failed fetch of `url`.
    pub fn fail(&self, url: &str, error: impl Into<String>) {
        self.send(LoadEvent::Complete {
            url: url.to_string(),
            result: Err(error.into()),
        });
    }

    fn send(&self, event: LoadEvent) {
        if let Err(e) = self.sender.send(event) {
            log::error!(
                "Dropping load report for '{}': scheduler is gone.",
                e.0.url()
            );
        }
    }
}

/// A pluggable back-end that fetches resources of one load type.
///
/// The scheduler calls `load` at most once per distinct in-flight url. The
/// back-end must eventually report exactly one completion for that url through
/// the given reporter; it may report progress any number of times before that.
/// Timeouts are the back-end's responsibility.
pub trait Loader {
    /// Starts fetching `request.url`.
    fn load(&self, request: LoadRequest, reporter: LoadReporter);
}
