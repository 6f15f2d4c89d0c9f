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

//! Engine dispatch loop.
//!
//! A single task owns every order book and the order-id counter, and
//! consumes one FIFO command channel. That gives the system its two core
//! guarantees for free: orders on the same symbol are processed in
//! arrival order, and each request's matching plus fan-out (order
//! update, fills, market-data snapshot) runs to completion as one
//! indivisible step from any observer's perspective.
//!
//! Connection handlers never touch engine state; they talk to the loop
//! through a cloneable [`EngineHandle`]. Snapshot requests travel the
//! same channel and are answered through a `oneshot` responder, so they
//! serialize with order flow instead of racing it.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use matchbook_sdk::types::{MarketDataSnapshot, Order};
use matchbook_sdk::wire;

use crate::book::OrderBook;
use crate::dropcopy::DropCopyMessage;
use crate::multicast::MarketDataSink;

/// Error types for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("engine shut down")]
	Shutdown,
}

/// Commands consumed by the engine loop
#[derive(Debug)]
pub enum EngineCommand {
	/// A raw order line from a gateway connection
	Order { client_id: String, raw: String },
	/// A top-of-book snapshot request from a recovery connection
	Snapshot {
		symbol: String,
		respond_to: oneshot::Sender<MarketDataSnapshot>,
	},
}

/// Cloneable handle used by connection tasks to reach the engine loop
#[derive(Clone)]
pub struct EngineHandle {
	commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
	/// Forward one gateway line to the engine. Malformed lines are
	/// dropped inside the loop; this only fails once the engine is gone.
	pub async fn submit_order(
		&self,
		client_id: impl Into<String>,
		raw: impl Into<String>,
	) -> Result<(), EngineError> {
		self.commands
			.send(EngineCommand::Order {
				client_id: client_id.into(),
				raw: raw.into(),
			})
			.await
			.map_err(|_| EngineError::Shutdown)
	}

	/// Ask the loop for a snapshot. Unknown symbols yield an empty
	/// snapshot with the symbol echoed.
	pub async fn snapshot(&self, symbol: impl Into<String>) -> Result<MarketDataSnapshot, EngineError> {
		let (respond_to, response) = oneshot::channel();
		self.commands
			.send(EngineCommand::Snapshot {
				symbol: symbol.into(),
				respond_to,
			})
			.await
			.map_err(|_| EngineError::Shutdown)?;
		response.await.map_err(|_| EngineError::Shutdown)
	}
}

/// Create the engine command channel.
///
/// Multiple producers (connection tasks), single consumer (the engine
/// loop). The channel's FIFO order is the venue's arrival order.
pub fn command_channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<EngineCommand>) {
	let (commands, receiver) = mpsc::channel(capacity);
	(EngineHandle { commands }, receiver)
}

/// The matching engine: order-book registry, id allocation, fan-out
pub struct Engine {
	/// Symbol -> book; created lazily on first order for a symbol
	books: HashMap<String, OrderBook>,
	/// Next order id, monotonic across all symbols, starting at 1
	next_order_id: u64,
	drop_copy: mpsc::Sender<DropCopyMessage>,
	market_data: Box<dyn MarketDataSink>,
}

impl Engine {
	pub fn new(
		symbols: &[String],
		drop_copy: mpsc::Sender<DropCopyMessage>,
		market_data: Box<dyn MarketDataSink>,
	) -> Self {
		let mut books = HashMap::new();
		for symbol in symbols {
			books.insert(symbol.clone(), OrderBook::new(symbol.clone()));
		}
		Self {
			books,
			next_order_id: 1,
			drop_copy,
			market_data,
		}
	}

	/// Run the dispatch loop until shutdown or until every handle is
	/// dropped.
	pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>, shutdown: CancellationToken) {
		info!(target: "engine", "dispatch loop started");
		loop {
			tokio::select! {
				_ = shutdown.cancelled() => break,
				command = commands.recv() => match command {
					Some(EngineCommand::Order { client_id, raw }) => {
						self.process_order_request(&client_id, &raw);
					}
					Some(EngineCommand::Snapshot { symbol, respond_to }) => {
						let _ = respond_to.send(self.snapshot_for(&symbol));
					}
					None => break,
				},
			}
		}
		info!(target: "engine", "dispatch loop stopped");
	}

	/// Parse, validate, match and fan out one order request.
	///
	/// Side effects in order: the post-match taker record goes to
	/// drop-copy, then each fill in execution order, then exactly one
	/// snapshot on the multicast feed. The order id is allocated before
	/// any fan-out so every published event carries its final id.
	pub fn process_order_request(&mut self, client_id: &str, raw: &str) {
		info!(target: "engine", client_id, raw, "order received");

		let request = match wire::parse_order_request(raw) {
			Ok(request) => request,
			Err(error) => {
				warn!(target: "engine", client_id, %error, "dropping malformed order");
				return;
			}
		};

		let order_id = self.next_order_id;
		self.next_order_id += 1;

		info!(
			target: "engine",
			order_id,
			side = %request.side,
			quantity = request.quantity,
			symbol = %request.symbol,
			price = %wire::display_dollars(request.price),
			price_nanos = request.price,
			"processing order"
		);

		let order = Order::limit(order_id, request, client_id);
		let symbol = order.symbol.clone();
		let book = self
			.books
			.entry(symbol.clone())
			.or_insert_with(|| OrderBook::new(symbol));

		let fills = book.add_order(order);
		let order_update = book.order(order_id).cloned();
		let snapshot = book.get_snapshot();

		if let Some(order) = order_update {
			self.broadcast(DropCopyMessage::OrderUpdate(order));
		}
		for fill in fills {
			info!(
				target: "engine",
				fill_id = fill.fill_id,
				quantity = fill.quantity,
				price = %wire::display_dollars(fill.price),
				price_nanos = fill.price,
				"fill"
			);
			self.broadcast(DropCopyMessage::Fill(fill));
		}

		self.publish_market_data(&snapshot);
	}

	/// Compute the snapshot for a symbol; empty (all zeros) when the
	/// symbol has no book. Snapshot requests never create books.
	pub fn snapshot_for(&self, symbol: &str) -> MarketDataSnapshot {
		match self.books.get(symbol) {
			Some(book) => book.get_snapshot(),
			None => MarketDataSnapshot::empty(symbol),
		}
	}

	/// Hand a snapshot line to the multicast publisher, best-effort.
	fn publish_market_data(&self, snapshot: &MarketDataSnapshot) {
		self.market_data.publish(&wire::format_md_snapshot(snapshot));
	}

	/// Best-effort enqueue onto the drop-copy broadcast channel. A full
	/// channel loses the message rather than stalling matching.
	fn broadcast(&self, message: DropCopyMessage) {
		use tokio::sync::mpsc::error::TrySendError;
		match self.drop_copy.try_send(message) {
			Ok(()) => {}
			Err(TrySendError::Full(_)) => {
				warn!(target: "engine", "drop-copy channel full, event lost");
			}
			Err(TrySendError::Closed(_)) => {
				debug!(target: "engine", "drop-copy channel closed");
			}
		}
	}
}
