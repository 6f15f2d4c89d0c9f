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

//! Drop-copy publisher: the read-only audit stream of every order and
//! fill event, for post-trade consumers.
//!
//! The engine pushes typed events onto a bounded channel; this task
//! formats them and broadcasts one line per subscriber. Writes are
//! non-retrying — a subscriber that cannot take the bytes right now
//! loses that message. Dead peers are reaped when their drain task sees
//! the socket close, never by the broadcast path itself.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::{
	TcpListener, TcpStream,
	tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use matchbook_sdk::types::{Fill, Order};
use matchbook_sdk::wire;

/// Events broadcast on the drop-copy feed, in the order the engine
/// emitted them
#[derive(Debug, Clone)]
pub enum DropCopyMessage {
	/// Post-match state of an order the engine just processed
	OrderUpdate(Order),
	/// One execution, in match order
	Fill(Fill),
}

pub struct DropCopyServer {
	listener: TcpListener,
	events: mpsc::Receiver<DropCopyMessage>,
	subscribers: HashMap<u64, OwnedWriteHalf>,
	next_subscriber_id: u64,
}

impl DropCopyServer {
	pub async fn bind(addr: SocketAddr, events: mpsc::Receiver<DropCopyMessage>) -> io::Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		Ok(Self {
			listener,
			events,
			subscribers: HashMap::new(),
			next_subscriber_id: 1,
		})
	}

	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	pub async fn run(mut self, shutdown: CancellationToken) {
		info!(target: "dropcopy", "server started");
		let (disconnects_tx, mut disconnects) = mpsc::channel::<u64>(64);
		loop {
			tokio::select! {
				_ = shutdown.cancelled() => break,
				accepted = self.listener.accept() => match accepted {
					Ok((stream, peer)) => {
						self.subscribe(stream, peer, &disconnects_tx, &shutdown);
					}
					Err(error) => {
						warn!(target: "dropcopy", %error, "accept failed");
					}
				},
				message = self.events.recv() => match message {
					Some(message) => self.broadcast(&message),
					// Engine gone; nothing more will ever arrive
					None => break,
				},
				Some(id) = disconnects.recv() => self.unsubscribe(id),
			}
		}
		info!(target: "dropcopy", "server stopped");
	}

	fn subscribe(
		&mut self,
		stream: TcpStream,
		peer: SocketAddr,
		disconnects: &mpsc::Sender<u64>,
		shutdown: &CancellationToken,
	) {
		let id = self.next_subscriber_id;
		self.next_subscriber_id += 1;
		info!(target: "dropcopy", subscriber = id, %peer, "subscriber connected");

		let (read_half, write_half) = stream.into_split();
		self.subscribers.insert(id, write_half);

		let disconnects = disconnects.clone();
		let shutdown = shutdown.clone();
		tokio::spawn(async move {
			drain_until_disconnect(read_half, shutdown).await;
			let _ = disconnects.send(id).await;
		});
	}

	fn unsubscribe(&mut self, id: u64) {
		if self.subscribers.remove(&id).is_some() {
			info!(target: "dropcopy", subscriber = id, "subscriber disconnected");
		}
	}

	fn broadcast(&mut self, message: &DropCopyMessage) {
		let line = match message {
			DropCopyMessage::OrderUpdate(order) => wire::format_order_update(order),
			DropCopyMessage::Fill(fill) => wire::format_fill(fill),
		};
		for (id, subscriber) in &self.subscribers {
			if let Err(error) = subscriber.try_write(line.as_bytes()) {
				if error.kind() != io::ErrorKind::WouldBlock {
					debug!(target: "dropcopy", subscriber = *id, %error, "write failed");
				}
			}
		}
	}
}

/// Subscribers never send anything meaningful; drain and discard their
/// bytes until the socket closes, then report the disconnect.
async fn drain_until_disconnect(mut read_half: OwnedReadHalf, shutdown: CancellationToken) {
	let mut buf = [0u8; 512];
	loop {
		tokio::select! {
			_ = shutdown.cancelled() => break,
			read = read_half.read(&mut buf) => match read {
				Ok(0) | Err(_) => break,
				Ok(_) => {}
			},
		}
	}
}
