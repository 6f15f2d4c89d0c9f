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

//! Market-data recovery: on-demand per-symbol snapshots for subscribers
//! that missed multicast packets or just started.
//!
//! Request/response, one line each way: `SNAPSHOT:<SYMBOL>` in, one
//! snapshot line out. Requests with any other prefix are silently
//! ignored. Unknown symbols get an all-zero snapshot so every valid
//! request is answered by exactly one line.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use matchbook_sdk::wire;

use crate::engine::EngineHandle;

pub struct MdRecoveryServer {
	listener: TcpListener,
	engine: EngineHandle,
}

impl MdRecoveryServer {
	pub async fn bind(addr: SocketAddr, engine: EngineHandle) -> io::Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		Ok(Self { listener, engine })
	}

	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	pub async fn run(self, shutdown: CancellationToken) {
		info!(target: "recovery", "server started");
		let mut next_subscriber = 1u64;
		loop {
			tokio::select! {
				_ = shutdown.cancelled() => break,
				accepted = self.listener.accept() => match accepted {
					Ok((stream, peer)) => {
						let subscriber_id = format!("mdrecovery_{next_subscriber}");
						next_subscriber += 1;
						tokio::spawn(handle_connection(
							stream,
							peer,
							subscriber_id,
							self.engine.clone(),
							shutdown.clone(),
						));
					}
					Err(error) => {
						warn!(target: "recovery", %error, "accept failed");
					}
				},
			}
		}
		info!(target: "recovery", "server stopped");
	}
}

async fn handle_connection(
	stream: TcpStream,
	peer: SocketAddr,
	subscriber_id: String,
	engine: EngineHandle,
	shutdown: CancellationToken,
) {
	info!(target: "recovery", %subscriber_id, %peer, "subscriber connected");
	let (read_half, mut write_half) = stream.into_split();
	let mut lines = BufReader::new(read_half).lines();
	loop {
		tokio::select! {
			_ = shutdown.cancelled() => break,
			line = lines.next_line() => match line {
				Ok(Some(line)) => {
					let Some(symbol) = wire::parse_snapshot_request(&line) else {
						debug!(target: "recovery", %subscriber_id, request = %line, "ignoring request");
						continue;
					};
					let Ok(snapshot) = engine.snapshot(symbol).await else {
						break;
					};
					let reply = wire::format_recovery_snapshot(&snapshot);
					if write_half.write_all(reply.as_bytes()).await.is_err() {
						break;
					}
				}
				Ok(None) => break,
				Err(error) => {
					debug!(target: "recovery", %subscriber_id, %error, "read failed");
					break;
				}
			},
		}
	}
	info!(target: "recovery", %subscriber_id, "subscriber disconnected");
}
