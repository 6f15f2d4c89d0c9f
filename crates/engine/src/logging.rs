// Copyright 2025 The Matchbook Authors
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

//! Logging initialization.
//!
//! Console (stderr) output is always on. When `LOG_DIR` is set, a
//! daily-rolling file appender is added under
//! `{LOG_DIR}/matchbook/matchbook.{date}.log`; `tracing-appender`
//! handles the rotation, so long-running processes switch files when
//! the date changes. `RUST_LOG` controls the filter (default `info`).

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use tracing_appender::{
	non_blocking,
	rolling::{self, Rotation},
};
use tracing_subscriber::{
	EnvFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, LOG_COMPONENT_NAME};

// Keeps the non-blocking writer flushing until process exit
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

fn setup_file_logging(log_root: &str) -> Result<non_blocking::NonBlocking> {
	let log_dir = Path::new(log_root).join(LOG_COMPONENT_NAME);
	fs::create_dir_all(&log_dir)
		.with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

	let file_appender = rolling::RollingFileAppender::builder()
		.rotation(Rotation::DAILY)
		.filename_prefix(LOG_COMPONENT_NAME.to_string())
		.filename_suffix("log")
		.build(&log_dir)
		.with_context(|| {
			format!(
				"Failed to create rolling file appender in {}",
				log_dir.display()
			)
		})?;

	let (file_writer, guard) = non_blocking(file_appender);
	LOG_GUARD.set(guard).ok();

	Ok(file_writer)
}

/// Initialize tracing with console output and an optional rolling file.
pub fn init_logging() -> Result<()> {
	dotenv::dotenv().ok();

	let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

	let console_layer = fmt::layer()
		.with_writer(std::io::stderr)
		.with_timer(fmt::time::UtcTime::rfc_3339())
		.with_target(true)
		.with_ansi(true);

	if let Ok(log_root) = env::var("LOG_DIR") {
		let file_writer = setup_file_logging(&log_root)?;
		Registry::default()
			.with(filter)
			.with(console_layer)
			.with(
				fmt::layer()
					.with_writer(file_writer)
					.with_timer(fmt::time::UtcTime::rfc_3339())
					.with_target(true)
					.with_ansi(false),
			)
			.init();
	} else {
		Registry::default().with(filter).with(console_layer).init();
	}

	Ok(())
}
