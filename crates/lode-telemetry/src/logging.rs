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

//! Logging bootstrap for binaries.

use env_logger::{Builder, Env};

/// Initializes the global logger, honoring `RUST_LOG` and defaulting to `info`.
///
/// # Errors
/// Fails if a global logger is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with_default("info")
}

/// Initializes the global logger with `default_filter` when `RUST_LOG` is unset.
pub fn init_logging_with_default(default_filter: &str) -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()?;
    log::debug!("Logger initialized with default filter '{default_filter}'.");
    Ok(())
}
