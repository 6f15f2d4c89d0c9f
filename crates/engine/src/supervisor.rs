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

//! Supervisor: constructs every component, binds the listeners, runs
//! the tasks, and coordinates cooperative shutdown.
//!
//! `bind` is separate from `run` so callers (the binary, the
//! integration tests) can learn the resolved addresses — binding port 0
//! yields ephemeral ports — before any traffic flows. Listener or
//! socket failures at bind time are fatal.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::dropcopy::{DropCopyMessage, DropCopyServer};
use crate::engine::{Engine, EngineCommand, EngineHandle, command_channel};
use crate::gateway::OrderGatewayServer;
use crate::multicast::MulticastPublisher;
use crate::recovery::MdRecoveryServer;

pub struct Supervisor {
	engine: Engine,
	commands: mpsc::Receiver<EngineCommand>,
	handle: EngineHandle,
	gateway: OrderGatewayServer,
	drop_copy: DropCopyServer,
	recovery: MdRecoveryServer,
	gateway_addr: SocketAddr,
	drop_copy_addr: SocketAddr,
	recovery_addr: SocketAddr,
	multicast_target: SocketAddr,
}

impl Supervisor {
	/// Construct the engine and bind every socket.
	pub async fn bind(config: EngineConfig) -> Result<Self> {
		let (handle, commands) = command_channel(config.command_queue_depth);
		let (drop_copy_tx, drop_copy_rx) = mpsc::channel::<DropCopyMessage>(config.drop_copy_queue_depth);

		let multicast_target = SocketAddr::new(config.multicast_ip, config.multicast_port);
		let publisher = MulticastPublisher::connect(config.bind_ip, multicast_target)
			.await
			.with_context(|| format!("failed to open multicast publisher for {multicast_target}"))?;

		let engine = Engine::new(&config.symbols, drop_copy_tx, Box::new(publisher));

		let gateway = OrderGatewayServer::bind(
			SocketAddr::new(config.bind_ip, config.order_gateway_port),
			handle.clone(),
		)
		.await
		.context("failed to bind order gateway listener")?;

		let drop_copy = DropCopyServer::bind(
			SocketAddr::new(config.bind_ip, config.drop_copy_port),
			drop_copy_rx,
		)
		.await
		.context("failed to bind drop-copy listener")?;

		let recovery = MdRecoveryServer::bind(
			SocketAddr::new(config.bind_ip, config.md_recovery_port),
			handle.clone(),
		)
		.await
		.context("failed to bind market-data recovery listener")?;

		let gateway_addr = gateway.local_addr()?;
		let drop_copy_addr = drop_copy.local_addr()?;
		let recovery_addr = recovery.local_addr()?;

		info!(
			target: "supervisor",
			gateway = %gateway_addr,
			drop_copy = %drop_copy_addr,
			recovery = %recovery_addr,
			multicast = %multicast_target,
			"all sockets bound"
		);

		Ok(Self {
			engine,
			commands,
			handle,
			gateway,
			drop_copy,
			recovery,
			gateway_addr,
			drop_copy_addr,
			recovery_addr,
			multicast_target,
		})
	}

	pub fn gateway_addr(&self) -> SocketAddr {
		self.gateway_addr
	}

	pub fn drop_copy_addr(&self) -> SocketAddr {
		self.drop_copy_addr
	}

	pub fn recovery_addr(&self) -> SocketAddr {
		self.recovery_addr
	}

	pub fn multicast_target(&self) -> SocketAddr {
		self.multicast_target
	}

	/// A handle to the engine loop, for embedding callers.
	pub fn engine_handle(&self) -> EngineHandle {
		self.handle.clone()
	}

	/// Run every component until the shutdown token fires, then wait
	/// for all of them to stop.
	pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
		let Supervisor {
			engine,
			commands,
			gateway,
			drop_copy,
			recovery,
			..
		} = self;

		let mut tasks = JoinSet::new();
		tasks.spawn(engine.run(commands, shutdown.child_token()));
		tasks.spawn(gateway.run(shutdown.child_token()));
		tasks.spawn(drop_copy.run(shutdown.child_token()));
		tasks.spawn(recovery.run(shutdown.child_token()));

		while let Some(result) = tasks.join_next().await {
			if let Err(error) = result {
				error!(target: "supervisor", %error, "component task failed");
			}
		}

		info!(target: "supervisor", "all components stopped");
		Ok(())
	}
}
