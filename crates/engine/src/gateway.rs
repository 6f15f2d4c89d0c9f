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

//! Order gateway: inbound client orders over TCP.
//!
//! Each accepted connection gets a stable synthetic identity
//! (`client_<n>`) that tags every order it submits. Frames are
//! newline-terminated; the reader buffers and splits, so partial or
//! coalesced TCP reads are handled. The gateway never replies on this
//! channel — confirmations are observable on the drop-copy feed.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::EngineHandle;

pub struct OrderGatewayServer {
	listener: TcpListener,
	engine: EngineHandle,
}

impl OrderGatewayServer {
	pub async fn bind(addr: SocketAddr, engine: EngineHandle) -> io::Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		Ok(Self { listener, engine })
	}

	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	pub async fn run(self, shutdown: CancellationToken) {
		info!(target: "gateway", "server started");
		let mut next_client = 1u64;
		loop {
			tokio::select! {
				_ = shutdown.cancelled() => break,
				accepted = self.listener.accept() => match accepted {
					Ok((stream, peer)) => {
						let client_id = format!("client_{next_client}");
						next_client += 1;
						tokio::spawn(handle_connection(
							stream,
							peer,
							client_id,
							self.engine.clone(),
							shutdown.clone(),
						));
					}
					Err(error) => {
						warn!(target: "gateway", %error, "accept failed");
					}
				},
			}
		}
		info!(target: "gateway", "server stopped");
	}
}

async fn handle_connection(
	stream: TcpStream,
	peer: SocketAddr,
	client_id: String,
	engine: EngineHandle,
	shutdown: CancellationToken,
) {
	info!(target: "gateway", %client_id, %peer, "client connected");
	let mut lines = BufReader::new(stream).lines();
	loop {
		tokio::select! {
			_ = shutdown.cancelled() => break,
			line = lines.next_line() => match line {
				Ok(Some(line)) => {
					if line.is_empty() {
						continue;
					}
					if engine.submit_order(client_id.clone(), line).await.is_err() {
						break;
					}
				}
				Ok(None) => break,
				Err(error) => {
					debug!(target: "gateway", %client_id, %error, "read failed");
					break;
				}
			},
		}
	}
	info!(target: "gateway", %client_id, "client disconnected");
}
