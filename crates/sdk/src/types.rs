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

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Nanoseconds since the Unix epoch.
///
/// All timestamps in the system (orders, fills, snapshots) use this clock.
pub fn timestamp_ns() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_nanos() as u64)
		.unwrap_or(0)
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Buy => f.write_str("BUY"),
			Side::Sell => f.write_str("SELL"),
		}
	}
}

/// Order type
///
/// Every order arriving over the gateway wire is a limit order; market
/// orders exist for internal submission paths and never rest on a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
	Limit,
	Market,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	New,
	PartiallyFilled,
	Filled,
	Cancelled,
	Rejected,
}

impl OrderStatus {
	/// `Filled` and `Cancelled` are terminal: once reached, the status
	/// never changes again.
	pub fn is_terminal(self) -> bool {
		matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
	}
}

impl fmt::Display for OrderStatus {
	/// Wire encoding used on the drop-copy feed.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let token = match self {
			OrderStatus::New => "NEW",
			OrderStatus::PartiallyFilled => "PARTIAL",
			OrderStatus::Filled => "FILLED",
			OrderStatus::Cancelled => "CANCELLED",
			OrderStatus::Rejected => "REJECTED",
		};
		f.write_str(token)
	}
}

/// A validated order request, as parsed from a gateway wire line
///
/// This is what a client submits; the engine turns it into an [`Order`]
/// by assigning an order id, a timestamp and the submitting client's
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
	pub side: Side,
	pub symbol: String,
	/// Share count, strictly positive
	pub quantity: u64,
	/// Limit price in nanodollars (1 USD = 10^9), strictly positive
	pub price: u64,
}

/// An order owned by a book
///
/// Created on engine intake, mutated only by its owning book during
/// matching and cancellation, and retained in the book's order map for
/// the life of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	pub order_id: u64,
	pub symbol: String,
	pub side: Side,
	#[serde(rename = "type")]
	pub order_type: OrderType,
	pub quantity: u64,
	pub remaining_quantity: u64,
	/// Limit price in nanodollars; unused for market orders
	pub price: u64,
	pub timestamp_ns: u64,
	pub status: OrderStatus,
	pub client_id: String,
}

impl Order {
	/// Build a limit order from a validated request.
	pub fn limit(order_id: u64, request: OrderRequest, client_id: impl Into<String>) -> Self {
		Self {
			order_id,
			symbol: request.symbol,
			side: request.side,
			order_type: OrderType::Limit,
			quantity: request.quantity,
			remaining_quantity: request.quantity,
			price: request.price,
			timestamp_ns: timestamp_ns(),
			status: OrderStatus::New,
			client_id: client_id.into(),
		}
	}

	/// Build a market order. No wire path produces these; they are for
	/// internal submission and never rest on a book.
	pub fn market(
		order_id: u64,
		symbol: impl Into<String>,
		side: Side,
		quantity: u64,
		client_id: impl Into<String>,
	) -> Self {
		Self {
			order_id,
			symbol: symbol.into(),
			side,
			order_type: OrderType::Market,
			quantity,
			remaining_quantity: quantity,
			price: 0,
			timestamp_ns: timestamp_ns(),
			status: OrderStatus::New,
			client_id: client_id.into(),
		}
	}
}

/// An execution between one buy and one sell order. Immutable once
/// emitted; fills print at the resting (maker) order's price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
	/// Monotonic per-book fill id, starting at 1
	pub fill_id: u64,
	pub buy_order_id: u64,
	pub sell_order_id: u64,
	pub symbol: String,
	pub quantity: u64,
	/// Execution price in nanodollars (the maker's price)
	pub price: u64,
	pub timestamp_ns: u64,
}

/// Instantaneous top-of-book view for one symbol
///
/// Zero values on any field mean "no such level" / "no trades yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataSnapshot {
	pub symbol: String,
	pub bid_price: u64,
	pub bid_quantity: u64,
	pub ask_price: u64,
	pub ask_quantity: u64,
	pub last_trade_price: u64,
	pub last_trade_quantity: u64,
	pub timestamp_ns: u64,
}

impl MarketDataSnapshot {
	/// An all-zero snapshot for a symbol with no book (or an empty one).
	pub fn empty(symbol: impl Into<String>) -> Self {
		Self {
			symbol: symbol.into(),
			bid_price: 0,
			bid_quantity: 0,
			ask_price: 0,
			ask_quantity: 0,
			last_trade_price: 0,
			last_trade_quantity: 0,
			timestamp_ns: timestamp_ns(),
		}
	}
}
