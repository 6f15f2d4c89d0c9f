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

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Component name used for log files and filter targets
pub const LOG_COMPONENT_NAME: &str = "matchbook";

/// Default log level when RUST_LOG is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Matching engine configuration
///
/// Defaults can be overridden from a `MATCHBOOK_`-prefixed environment
/// (e.g. `MATCHBOOK_ORDER_GATEWAY_PORT=0` for an ephemeral port); the
/// three CLI arguments override bind address and multicast target last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
	/// Address the three TCP listeners bind to
	pub bind_ip: IpAddr,
	/// Multicast group for the market-data feed
	pub multicast_ip: IpAddr,
	/// Multicast UDP port
	pub multicast_port: u16,
	/// Order gateway TCP port
	pub order_gateway_port: u16,
	/// Drop-copy TCP port
	pub drop_copy_port: u16,
	/// Market-data recovery TCP port
	pub md_recovery_port: u16,
	/// Books created eagerly at startup; all others appear on the first
	/// order for their symbol
	pub symbols: Vec<String>,
	/// Engine command channel capacity
	pub command_queue_depth: usize,
	/// Drop-copy broadcast channel capacity
	pub drop_copy_queue_depth: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
			multicast_ip: IpAddr::V4(Ipv4Addr::new(239, 255, 0, 1)),
			multicast_port: 9999,
			order_gateway_port: 8001,
			drop_copy_port: 8002,
			md_recovery_port: 8003,
			symbols: Vec::new(),
			command_queue_depth: 1024,
			drop_copy_queue_depth: 1024,
		}
	}
}

impl EngineConfig {
	/// Load configuration: defaults overlaid with `MATCHBOOK_*`
	/// environment variables (`MATCHBOOK_SYMBOLS` is comma-separated).
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::Config::try_from(&EngineConfig::default())?)
			.add_source(
				config::Environment::with_prefix("MATCHBOOK")
					.try_parsing(true)
					.list_separator(",")
					.with_list_parse_key("symbols"),
			)
			.build()?;

		cfg.try_deserialize()
	}
}
