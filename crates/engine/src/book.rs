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

//! Per-symbol limit order book.
//!
//! Price ladders are `BTreeMap`s keyed by nanodollar price: bids are
//! walked highest-first, asks lowest-first. Each level holds a FIFO
//! queue of order ids; the orders themselves live in a single arena map
//! (`orders`), so queues and lookups share one owning copy per order.
//! Matching applies price-time priority and fills print at the resting
//! (maker) order's price.

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::debug;

use matchbook_sdk::types::{
	Fill, MarketDataSnapshot, Order, OrderStatus, OrderType, Side, timestamp_ns,
};

/// Limit order book for one symbol
pub struct OrderBook {
	symbol: String,
	/// Buy side: price -> FIFO queue of order ids, matched highest price first
	bids: BTreeMap<u64, VecDeque<u64>>,
	/// Sell side: price -> FIFO queue of order ids, matched lowest price first
	asks: BTreeMap<u64, VecDeque<u64>>,
	/// Every order this book has ever seen, resting or terminal
	orders: HashMap<u64, Order>,
	/// Next fill id, monotonic per book
	next_fill_id: u64,
	last_trade_price: u64,
	last_trade_quantity: u64,
}

impl OrderBook {
	pub fn new(symbol: impl Into<String>) -> Self {
		Self {
			symbol: symbol.into(),
			bids: BTreeMap::new(),
			asks: BTreeMap::new(),
			orders: HashMap::new(),
			next_fill_id: 1,
			last_trade_price: 0,
			last_trade_quantity: 0,
		}
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	/// Look up any order ever processed by this book.
	pub fn order(&self, order_id: u64) -> Option<&Order> {
		self.orders.get(&order_id)
	}

	/// Best (highest) bid price, if any bid level exists.
	pub fn best_bid(&self) -> Option<u64> {
		self.bids.keys().next_back().copied()
	}

	/// Best (lowest) ask price, if any ask level exists.
	pub fn best_ask(&self) -> Option<u64> {
		self.asks.keys().next().copied()
	}

	/// Insert a new order, match it against the opposite side, and rest
	/// any limit remainder. Returns the fills in execution order.
	///
	/// The caller validates input: `remaining_quantity == quantity > 0`
	/// and status `New`. A market order never rests; an unfilled market
	/// remainder leaves the order `Rejected`.
	pub fn add_order(&mut self, mut order: Order) -> Vec<Fill> {
		debug_assert_eq!(order.symbol, self.symbol);
		debug_assert!(order.quantity > 0 && order.remaining_quantity == order.quantity);
		debug_assert_eq!(order.status, OrderStatus::New);

		let fills = self.match_order(&mut order);

		if order.remaining_quantity > 0 {
			match order.order_type {
				OrderType::Limit => self.rest(&order),
				OrderType::Market => order.status = OrderStatus::Rejected,
			}
		}

		self.orders.insert(order.order_id, order);
		fills
	}

	/// Walk the opposite side best-level-first, filling against queue
	/// heads until the order is exhausted or prices no longer cross.
	fn match_order(&mut self, taker: &mut Order) -> Vec<Fill> {
		let mut fills = Vec::new();

		while taker.remaining_quantity > 0 {
			let level_price = match taker.side {
				Side::Buy => self.asks.keys().next().copied(),
				Side::Sell => self.bids.keys().next_back().copied(),
			};
			let Some(level_price) = level_price else { break };

			if taker.order_type == OrderType::Limit {
				let crosses = match taker.side {
					Side::Buy => level_price <= taker.price,
					Side::Sell => level_price >= taker.price,
				};
				if !crosses {
					break;
				}
			}

			let book_side = match taker.side {
				Side::Buy => &mut self.asks,
				Side::Sell => &mut self.bids,
			};
			let Some(queue) = book_side.get_mut(&level_price) else {
				break;
			};
			let Some(&maker_id) = queue.front() else {
				book_side.remove(&level_price);
				continue;
			};
			let Some(maker) = self.orders.get_mut(&maker_id) else {
				queue.pop_front();
				if queue.is_empty() {
					book_side.remove(&level_price);
				}
				continue;
			};

			// A cancelled order stays queued until it reaches the head;
			// discard it here without producing a fill.
			if maker.remaining_quantity == 0 {
				debug!(
					target: "book",
					symbol = %self.symbol,
					order_id = maker_id,
					"discarding cancelled head entry"
				);
				queue.pop_front();
				if queue.is_empty() {
					book_side.remove(&level_price);
				}
				continue;
			}

			let quantity = taker.remaining_quantity.min(maker.remaining_quantity);
			let price = maker.price;
			let (buy_order_id, sell_order_id) = match taker.side {
				Side::Buy => (taker.order_id, maker.order_id),
				Side::Sell => (maker.order_id, taker.order_id),
			};

			fills.push(Fill {
				fill_id: self.next_fill_id,
				buy_order_id,
				sell_order_id,
				symbol: self.symbol.clone(),
				quantity,
				price,
				timestamp_ns: timestamp_ns(),
			});
			self.next_fill_id += 1;

			maker.remaining_quantity -= quantity;
			maker.status = if maker.remaining_quantity == 0 {
				OrderStatus::Filled
			} else {
				OrderStatus::PartiallyFilled
			};
			taker.remaining_quantity -= quantity;
			taker.status = if taker.remaining_quantity == 0 {
				OrderStatus::Filled
			} else {
				OrderStatus::PartiallyFilled
			};

			if maker.remaining_quantity == 0 {
				queue.pop_front();
			}
			if queue.is_empty() {
				book_side.remove(&level_price);
			}

			self.last_trade_price = price;
			self.last_trade_quantity = quantity;
		}

		fills
	}

	/// Append a limit remainder to the tail of its price level, creating
	/// the level if needed.
	fn rest(&mut self, order: &Order) {
		let side_map = match order.side {
			Side::Buy => &mut self.bids,
			Side::Sell => &mut self.asks,
		};
		side_map
			.entry(order.price)
			.or_default()
			.push_back(order.order_id);
	}

	/// Mark an order cancelled. Returns `true` iff the order exists in
	/// this book.
	///
	/// The queue entry is left in place; the match loop discards
	/// zero-remaining heads at dequeue time. A terminal order keeps its
	/// status.
	pub fn cancel_order(&mut self, order_id: u64) -> bool {
		match self.orders.get_mut(&order_id) {
			Some(order) => {
				if !order.status.is_terminal() {
					order.status = OrderStatus::Cancelled;
					order.remaining_quantity = 0;
				}
				true
			}
			None => false,
		}
	}

	/// Top-of-book snapshot. Pure query; the timestamp is stamped at
	/// call time.
	pub fn get_snapshot(&self) -> MarketDataSnapshot {
		let mut snapshot = MarketDataSnapshot::empty(self.symbol.clone());
		snapshot.last_trade_price = self.last_trade_price;
		snapshot.last_trade_quantity = self.last_trade_quantity;

		if let Some((&price, queue)) = self.bids.iter().next_back() {
			snapshot.bid_price = price;
			snapshot.bid_quantity = self.level_quantity(queue);
		}
		if let Some((&price, queue)) = self.asks.iter().next() {
			snapshot.ask_price = price;
			snapshot.ask_quantity = self.level_quantity(queue);
		}

		snapshot
	}

	fn level_quantity(&self, queue: &VecDeque<u64>) -> u64 {
		queue
			.iter()
			.filter_map(|id| self.orders.get(id))
			.map(|order| order.remaining_quantity)
			.sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DOLLAR: u64 = 1_000_000_000;

	fn limit(id: u64, side: Side, quantity: u64, price: u64) -> Order {
		Order::limit(
			id,
			matchbook_sdk::types::OrderRequest {
				side,
				symbol: "AAPL".to_string(),
				quantity,
				price,
			},
			format!("client_{id}"),
		)
	}

	fn book() -> OrderBook {
		OrderBook::new("AAPL")
	}

	#[test]
	fn simple_cross_fills_both_sides() {
		let mut book = book();
		assert!(book.add_order(limit(1, Side::Sell, 100, 150 * DOLLAR)).is_empty());

		let fills = book.add_order(limit(2, Side::Buy, 100, 150 * DOLLAR));
		assert_eq!(fills.len(), 1);
		assert_eq!(fills[0].fill_id, 1);
		assert_eq!(fills[0].buy_order_id, 2);
		assert_eq!(fills[0].sell_order_id, 1);
		assert_eq!(fills[0].quantity, 100);
		assert_eq!(fills[0].price, 150 * DOLLAR);

		assert_eq!(book.order(1).unwrap().status, OrderStatus::Filled);
		assert_eq!(book.order(2).unwrap().status, OrderStatus::Filled);
		assert_eq!(book.best_bid(), None);
		assert_eq!(book.best_ask(), None);

		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.bid_price, 0);
		assert_eq!(snapshot.ask_price, 0);
		assert_eq!(snapshot.last_trade_price, 150 * DOLLAR);
		assert_eq!(snapshot.last_trade_quantity, 100);
	}

	#[test]
	fn partial_fill_rests_remainder() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 50, 300 * DOLLAR));

		let fills = book.add_order(limit(2, Side::Buy, 200, 300 * DOLLAR));
		assert_eq!(fills.len(), 1);
		assert_eq!(fills[0].quantity, 50);

		let taker = book.order(2).unwrap();
		assert_eq!(taker.status, OrderStatus::PartiallyFilled);
		assert_eq!(taker.remaining_quantity, 150);

		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.bid_price, 300 * DOLLAR);
		assert_eq!(snapshot.bid_quantity, 150);
		assert_eq!(snapshot.ask_price, 0);
		assert_eq!(snapshot.ask_quantity, 0);
	}

	#[test]
	fn time_priority_within_level() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 100, 250 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 100, 250 * DOLLAR));

		let fills = book.add_order(limit(3, Side::Buy, 150, 250 * DOLLAR));
		assert_eq!(fills.len(), 2);
		assert_eq!(fills[0].sell_order_id, 1);
		assert_eq!(fills[0].quantity, 100);
		assert_eq!(fills[1].sell_order_id, 2);
		assert_eq!(fills[1].quantity, 50);

		assert_eq!(book.order(1).unwrap().status, OrderStatus::Filled);
		let second = book.order(2).unwrap();
		assert_eq!(second.status, OrderStatus::PartiallyFilled);
		assert_eq!(second.remaining_quantity, 50);
	}

	#[test]
	fn no_cross_rests_without_fills() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 100, 151 * DOLLAR));

		let fills = book.add_order(limit(2, Side::Buy, 100, 150 * DOLLAR));
		assert!(fills.is_empty());
		assert_eq!(book.order(2).unwrap().status, OrderStatus::New);

		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.bid_price, 150 * DOLLAR);
		assert_eq!(snapshot.bid_quantity, 100);
		assert_eq!(snapshot.ask_price, 151 * DOLLAR);
		assert_eq!(snapshot.ask_quantity, 100);
		assert!(snapshot.bid_price < snapshot.ask_price);
	}

	#[test]
	fn walks_levels_in_price_order() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 100, 150 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 100, 151 * DOLLAR));
		book.add_order(limit(3, Side::Sell, 100, 152 * DOLLAR));

		let fills = book.add_order(limit(4, Side::Buy, 250, 152 * DOLLAR));
		let executed: Vec<(u64, u64)> = fills.iter().map(|f| (f.quantity, f.price)).collect();
		assert_eq!(
			executed,
			vec![
				(100, 150 * DOLLAR),
				(100, 151 * DOLLAR),
				(50, 152 * DOLLAR)
			]
		);

		// 150 and 151 are swept; 152 keeps the 50-share remainder
		assert_eq!(book.best_ask(), Some(152 * DOLLAR));
		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.ask_quantity, 50);
		assert_eq!(book.best_bid(), None);
	}

	#[test]
	fn fills_print_at_maker_price() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 10, 100 * DOLLAR));

		// Taker bids above the resting ask; the fill prints at the ask
		let fills = book.add_order(limit(2, Side::Buy, 10, 105 * DOLLAR));
		assert_eq!(fills[0].price, 100 * DOLLAR);
	}

	#[test]
	fn fill_ids_are_monotonic_per_book() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 10, 100 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 10, 100 * DOLLAR));
		let first = book.add_order(limit(3, Side::Buy, 10, 100 * DOLLAR));
		let second = book.add_order(limit(4, Side::Buy, 10, 100 * DOLLAR));
		assert_eq!(first[0].fill_id, 1);
		assert_eq!(second[0].fill_id, 2);
	}

	#[test]
	fn quantity_is_conserved() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 30, 100 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 40, 101 * DOLLAR));

		let fills = book.add_order(limit(3, Side::Buy, 100, 101 * DOLLAR));
		let filled: u64 = fills.iter().map(|f| f.quantity).sum();
		let taker = book.order(3).unwrap();
		assert_eq!(filled + taker.remaining_quantity, taker.quantity);
	}

	#[test]
	fn cancel_marks_and_returns_existence() {
		let mut book = book();
		book.add_order(limit(1, Side::Buy, 100, 99 * DOLLAR));

		assert!(book.cancel_order(1));
		let order = book.order(1).unwrap();
		assert_eq!(order.status, OrderStatus::Cancelled);
		assert_eq!(order.remaining_quantity, 0);

		assert!(!book.cancel_order(42));
	}

	#[test]
	fn cancel_keeps_terminal_status() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 10, 100 * DOLLAR));
		book.add_order(limit(2, Side::Buy, 10, 100 * DOLLAR));

		assert!(book.cancel_order(1));
		assert_eq!(book.order(1).unwrap().status, OrderStatus::Filled);
	}

	#[test]
	fn cancelled_head_is_skipped_without_a_fill() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 100, 150 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 60, 150 * DOLLAR));
		assert!(book.cancel_order(1));

		// The cancelled order is still queued at the head of the level;
		// matching must discard it and fill against order 2 only.
		let fills = book.add_order(limit(3, Side::Buy, 100, 150 * DOLLAR));
		assert_eq!(fills.len(), 1);
		assert_eq!(fills[0].sell_order_id, 2);
		assert_eq!(fills[0].quantity, 60);

		let taker = book.order(3).unwrap();
		assert_eq!(taker.status, OrderStatus::PartiallyFilled);
		assert_eq!(taker.remaining_quantity, 40);
		// The swept ask level is gone; the remainder rests as the bid
		assert_eq!(book.best_ask(), None);
		assert_eq!(book.best_bid(), Some(150 * DOLLAR));
	}

	#[test]
	fn cancelled_orders_do_not_count_in_snapshots() {
		let mut book = book();
		book.add_order(limit(1, Side::Buy, 100, 99 * DOLLAR));
		book.add_order(limit(2, Side::Buy, 25, 99 * DOLLAR));
		book.cancel_order(1);

		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.bid_price, 99 * DOLLAR);
		assert_eq!(snapshot.bid_quantity, 25);
	}

	#[test]
	fn market_order_sweeps_then_rejects_remainder() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 50, 150 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 50, 175 * DOLLAR));

		let taker = Order::market(3, "AAPL", Side::Buy, 150, "client_3");
		let fills = book.add_order(taker);

		// A market order ignores price limits and walks every level
		assert_eq!(fills.len(), 2);
		assert_eq!(fills[0].price, 150 * DOLLAR);
		assert_eq!(fills[1].price, 175 * DOLLAR);

		let taker = book.order(3).unwrap();
		assert_eq!(taker.status, OrderStatus::Rejected);
		assert_eq!(taker.remaining_quantity, 50);
		// Never rests
		assert_eq!(book.best_bid(), None);
	}

	#[test]
	fn market_order_against_empty_book_is_rejected() {
		let mut book = book();
		let fills = book.add_order(Order::market(1, "AAPL", Side::Sell, 10, "client_1"));
		assert!(fills.is_empty());
		assert_eq!(book.order(1).unwrap().status, OrderStatus::Rejected);
	}

	#[test]
	fn market_order_full_fill_is_filled() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 10, 100 * DOLLAR));
		let fills = book.add_order(Order::market(2, "AAPL", Side::Buy, 10, "client_2"));
		assert_eq!(fills.len(), 1);
		assert_eq!(book.order(2).unwrap().status, OrderStatus::Filled);
	}

	#[test]
	fn snapshot_is_idempotent_up_to_timestamp() {
		let mut book = book();
		book.add_order(limit(1, Side::Buy, 5, 99 * DOLLAR));
		book.add_order(limit(2, Side::Sell, 7, 101 * DOLLAR));

		let mut first = book.get_snapshot();
		let mut second = book.get_snapshot();
		first.timestamp_ns = 0;
		second.timestamp_ns = 0;
		assert_eq!(first, second);
	}

	#[test]
	fn last_trade_survives_cancels() {
		let mut book = book();
		book.add_order(limit(1, Side::Sell, 10, 100 * DOLLAR));
		book.add_order(limit(2, Side::Buy, 10, 100 * DOLLAR));
		book.add_order(limit(3, Side::Buy, 5, 90 * DOLLAR));
		book.cancel_order(3);

		let snapshot = book.get_snapshot();
		assert_eq!(snapshot.last_trade_price, 100 * DOLLAR);
		assert_eq!(snapshot.last_trade_quantity, 10);
	}

	#[test]
	fn book_never_ends_crossed() {
		let mut book = book();
		let orders = [
			(1, Side::Sell, 10, 105),
			(2, Side::Buy, 20, 103),
			(3, Side::Sell, 15, 104),
			(4, Side::Buy, 30, 104),
			(5, Side::Sell, 25, 103),
			(6, Side::Buy, 5, 106),
		];
		for (id, side, quantity, dollars) in orders {
			book.add_order(limit(id, side, quantity, dollars * DOLLAR));
			if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
				assert!(bid < ask, "crossed book after order {id}: {bid} >= {ask}");
			}
		}
	}
}
