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

//! Best-effort market-data publication.
//!
//! [`MarketDataSink`] is the seam between the engine and the transport:
//! production wires in a connected UDP socket aimed at the multicast
//! group; tests substitute a capturing sink. There are no sequence
//! numbers and no gap detection — consumers that miss a datagram
//! refetch over the recovery channel.

use std::io;
use std::net::{IpAddr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

/// Where formatted market-data lines go
pub trait MarketDataSink: Send + Sync {
	/// Publish one line; must not block and must not fail loudly.
	fn publish(&self, line: &str);
}

/// UDP multicast publisher over a connected socket
pub struct MulticastPublisher {
	socket: UdpSocket,
	target: SocketAddr,
}

impl MulticastPublisher {
	/// Bind an ephemeral UDP socket on `bind_ip` and connect it to the
	/// multicast target.
	pub async fn connect(bind_ip: IpAddr, target: SocketAddr) -> io::Result<Self> {
		let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0)).await?;
		if let SocketAddr::V4(v4) = target {
			if v4.ip().is_multicast() {
				socket.set_multicast_loop_v4(true)?;
			}
		}
		socket.connect(target).await?;
		Ok(Self { socket, target })
	}

	pub fn target(&self) -> SocketAddr {
		self.target
	}
}

impl MarketDataSink for MulticastPublisher {
	fn publish(&self, line: &str) {
		// Fire-and-forget: a datagram that cannot be sent right now is
		// simply lost for this tick.
		if let Err(error) = self.socket.try_send(line.as_bytes()) {
			debug!(target: "multicast", %error, "send failed");
		}
	}
}
