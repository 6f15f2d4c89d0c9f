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

//! Matching engine service entry point.

use std::net::IpAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use matchbook_engine::config::EngineConfig;
use matchbook_engine::logging;
use matchbook_engine::supervisor::Supervisor;

#[derive(Parser, Debug)]
#[command(name = "matchbook-engine", about = "Single-venue matching engine")]
struct Args {
	/// IP address the three TCP services bind to
	bind_ip: IpAddr,
	/// Multicast group for the market-data feed
	multicast_ip: IpAddr,
	/// Multicast UDP port
	multicast_port: u16,
}

fn usage() -> ! {
	println!("Usage: matchbook-engine <bind_ip> <multicast_ip> <multicast_port>");
	println!("Example: matchbook-engine 192.168.1.100 239.255.0.1 9999");
	std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(error)
			if matches!(
				error.kind(),
				clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
			) =>
		{
			let _ = error.print();
			return Ok(());
		}
		Err(_) => usage(),
	};

	logging::init_logging()?;

	let mut config = EngineConfig::from_env().context("invalid MATCHBOOK_* environment")?;
	config.bind_ip = args.bind_ip;
	config.multicast_ip = args.multicast_ip;
	config.multicast_port = args.multicast_port;

	info!(target: "supervisor", "initializing matching engine");
	let supervisor = Supervisor::bind(config.clone()).await?;

	println!("[matchbook] Started on {}", config.bind_ip);
	println!(
		"[matchbook] Order Gateway:     port {}",
		supervisor.gateway_addr().port()
	);
	println!(
		"[matchbook] Drop Copy:         port {}",
		supervisor.drop_copy_addr().port()
	);
	println!(
		"[matchbook] Market Data:       port {}",
		supervisor.recovery_addr().port()
	);
	println!(
		"[matchbook] Multicast:         {}",
		supervisor.multicast_target()
	);
	println!("[matchbook] Order format: BUY:SYMBOL:QUANTITY:PRICE_NANOS");
	println!("[matchbook]   Example: BUY:AAPL:100:150123456789 (for $150.123456789)");
	println!("[matchbook] MD Recovery format: SNAPSHOT:SYMBOL (e.g., SNAPSHOT:AAPL)");
	println!("[matchbook] Press CTRL-C to shut down gracefully");

	let shutdown = CancellationToken::new();
	let signal_token = shutdown.clone();
	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => {
				info!(target: "supervisor", "received SIGINT, shutting down");
				signal_token.cancel();
			}
			Err(error) => {
				warn!(target: "supervisor", %error, "failed to listen for SIGINT");
			}
		}
	});

	supervisor.run(shutdown).await?;
	info!(target: "supervisor", "shutdown complete");

	Ok(())
}
