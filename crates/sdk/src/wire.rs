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

//! Textual wire codec
//!
//! Every channel speaks newline-terminated ASCII lines with
//! colon-separated fields. Prices travel as integer nanodollars; the
//! parenthesised dollar rendering on egress lines is presentation only
//! and is computed with integer arithmetic so it is exact for the full
//! u64 range.
//!
//! Formats:
//! - gateway ingress: `SIDE:SYMBOL:QTY:PRICE_NANOS`
//! - drop-copy:       `ORDER:...` and `FILL:...`
//! - recovery:        request `SNAPSHOT:SYMBOL`, reply `SNAPSHOT:...`
//! - multicast:       `MD:...:TS:<ns>`

use thiserror::Error;

use crate::types::{Fill, MarketDataSnapshot, Order, OrderRequest, Side};

/// Nanodollars per dollar
pub const NANOS_PER_DOLLAR: u64 = 1_000_000_000;

/// Errors produced while decoding an inbound wire line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
	#[error("expected 4 colon-separated fields, got {0}")]
	FieldCount(usize),
	#[error("unknown side token: {0:?}")]
	InvalidSide(String),
	#[error("empty symbol")]
	EmptySymbol,
	#[error("invalid quantity: {0:?}")]
	InvalidQuantity(String),
	#[error("invalid price: {0:?}")]
	InvalidPrice(String),
	#[error("quantity must be positive")]
	ZeroQuantity,
	#[error("price must be positive")]
	ZeroPrice,
}

/// Render a nanodollar price as a dollar string, e.g. `150.123456789`.
pub fn display_dollars(nanos: u64) -> String {
	format!("{}.{:09}", nanos / NANOS_PER_DOLLAR, nanos % NANOS_PER_DOLLAR)
}

/// Parse a gateway order line: `SIDE:SYMBOL:QTY:PRICE_NANOS`.
///
/// Exactly four fields; the side must be `BUY` or `SELL`; quantity and
/// price are decimal u64 and must be positive. Anything else is an
/// error — callers log and drop the line, no reply is sent.
pub fn parse_order_request(line: &str) -> Result<OrderRequest, WireError> {
	let fields: Vec<&str> = line.split(':').collect();
	if fields.len() != 4 {
		return Err(WireError::FieldCount(fields.len()));
	}

	let side = match fields[0] {
		"BUY" => Side::Buy,
		"SELL" => Side::Sell,
		other => return Err(WireError::InvalidSide(other.to_string())),
	};

	let symbol = fields[1];
	if symbol.is_empty() {
		return Err(WireError::EmptySymbol);
	}

	let quantity: u64 = fields[2]
		.parse()
		.map_err(|_| WireError::InvalidQuantity(fields[2].to_string()))?;
	if quantity == 0 {
		return Err(WireError::ZeroQuantity);
	}

	let price: u64 = fields[3]
		.parse()
		.map_err(|_| WireError::InvalidPrice(fields[3].to_string()))?;
	if price == 0 {
		return Err(WireError::ZeroPrice);
	}

	Ok(OrderRequest {
		side,
		symbol: symbol.to_string(),
		quantity,
		price,
	})
}

/// Encode an order request as a gateway line (newline included).
pub fn format_order_request(request: &OrderRequest) -> String {
	format!(
		"{}:{}:{}:{}\n",
		request.side, request.symbol, request.quantity, request.price
	)
}

/// Parse a recovery request line. Returns the symbol for
/// `SNAPSHOT:<SYMBOL>` with a non-empty symbol, `None` for anything
/// else (which the server silently ignores).
pub fn parse_snapshot_request(line: &str) -> Option<&str> {
	line.strip_prefix("SNAPSHOT:").filter(|s| !s.is_empty())
}

/// Drop-copy order record (newline included).
pub fn format_order_update(order: &Order) -> String {
	format!(
		"ORDER:{}:CLIENT:{}:SIDE:{}:SYMBOL:{}:QTY:{}:REMAINING:{}:PRICE:{}(${}):STATUS:{}:TS:{}\n",
		order.order_id,
		order.client_id,
		order.side,
		order.symbol,
		order.quantity,
		order.remaining_quantity,
		order.price,
		display_dollars(order.price),
		order.status,
		order.timestamp_ns,
	)
}

/// Drop-copy fill record (newline included).
pub fn format_fill(fill: &Fill) -> String {
	format!(
		"FILL:{}:BUY_ORDER:{}:SELL_ORDER:{}:SYMBOL:{}:QTY:{}:PRICE:{}(${}):TS:{}\n",
		fill.fill_id,
		fill.buy_order_id,
		fill.sell_order_id,
		fill.symbol,
		fill.quantity,
		fill.price,
		display_dollars(fill.price),
		fill.timestamp_ns,
	)
}

fn format_levels(snapshot: &MarketDataSnapshot) -> String {
	format!(
		"BID:{}@{}(${}):ASK:{}@{}(${}):LAST:{}@{}(${})",
		snapshot.bid_quantity,
		snapshot.bid_price,
		display_dollars(snapshot.bid_price),
		snapshot.ask_quantity,
		snapshot.ask_price,
		display_dollars(snapshot.ask_price),
		snapshot.last_trade_quantity,
		snapshot.last_trade_price,
		display_dollars(snapshot.last_trade_price),
	)
}

/// Recovery reply line (newline included). Carries no timestamp; the
/// multicast variant does.
pub fn format_recovery_snapshot(snapshot: &MarketDataSnapshot) -> String {
	format!("SNAPSHOT:{}:{}\n", snapshot.symbol, format_levels(snapshot))
}

/// Multicast market-data line (newline included).
pub fn format_md_snapshot(snapshot: &MarketDataSnapshot) -> String {
	format!(
		"MD:{}:{}:TS:{}\n",
		snapshot.symbol,
		format_levels(snapshot),
		snapshot.timestamp_ns,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{OrderStatus, OrderType};

	#[test]
	fn parses_valid_order_line() {
		let request = parse_order_request("BUY:AAPL:100:150123456789").unwrap();
		assert_eq!(request.side, Side::Buy);
		assert_eq!(request.symbol, "AAPL");
		assert_eq!(request.quantity, 100);
		assert_eq!(request.price, 150_123_456_789);
	}

	#[test]
	fn rejects_wrong_field_count() {
		assert_eq!(
			parse_order_request("BUY:AAPL:100"),
			Err(WireError::FieldCount(3))
		);
		assert_eq!(
			parse_order_request("BUY:AAPL:100:1:extra"),
			Err(WireError::FieldCount(5))
		);
	}

	#[test]
	fn rejects_unknown_side_token() {
		// The side must parse; it is never defaulted to SELL.
		assert_eq!(
			parse_order_request("HOLD:AAPL:100:1"),
			Err(WireError::InvalidSide("HOLD".to_string()))
		);
		assert_eq!(
			parse_order_request("buy:AAPL:100:1"),
			Err(WireError::InvalidSide("buy".to_string()))
		);
	}

	#[test]
	fn rejects_bad_numbers() {
		assert!(matches!(
			parse_order_request("SELL:MSFT:ten:1"),
			Err(WireError::InvalidQuantity(_))
		));
		assert!(matches!(
			parse_order_request("SELL:MSFT:10:-5"),
			Err(WireError::InvalidPrice(_))
		));
		// u64 overflow is a parse failure, not a wrap
		assert!(matches!(
			parse_order_request("SELL:MSFT:99999999999999999999:1"),
			Err(WireError::InvalidQuantity(_))
		));
		assert_eq!(
			parse_order_request("SELL:MSFT:0:1"),
			Err(WireError::ZeroQuantity)
		);
		assert_eq!(
			parse_order_request("SELL:MSFT:10:0"),
			Err(WireError::ZeroPrice)
		);
	}

	#[test]
	fn rejects_empty_symbol() {
		assert_eq!(parse_order_request("BUY::10:1"), Err(WireError::EmptySymbol));
	}

	#[test]
	fn order_request_round_trip() {
		let request = OrderRequest {
			side: Side::Sell,
			symbol: "TSLA".to_string(),
			quantity: 50,
			price: 250_000_000_000,
		};
		let line = format_order_request(&request);
		assert_eq!(line, "SELL:TSLA:50:250000000000\n");
		assert_eq!(parse_order_request(line.trim_end()).unwrap(), request);
	}

	#[test]
	fn dollar_display_is_exact() {
		assert_eq!(display_dollars(0), "0.000000000");
		assert_eq!(display_dollars(1), "0.000000001");
		assert_eq!(display_dollars(150_123_456_789), "150.123456789");
		assert_eq!(display_dollars(NANOS_PER_DOLLAR), "1.000000000");
	}

	#[test]
	fn snapshot_request_parsing() {
		assert_eq!(parse_snapshot_request("SNAPSHOT:AAPL"), Some("AAPL"));
		assert_eq!(parse_snapshot_request("SNAPSHOT:"), None);
		assert_eq!(parse_snapshot_request("STATUS:AAPL"), None);
		assert_eq!(parse_snapshot_request(""), None);
	}

	#[test]
	fn empty_snapshot_line() {
		let mut snapshot = MarketDataSnapshot::empty("AAPL");
		snapshot.timestamp_ns = 0;
		assert_eq!(
			format_recovery_snapshot(&snapshot),
			"SNAPSHOT:AAPL:BID:0@0($0.000000000):ASK:0@0($0.000000000):LAST:0@0($0.000000000)\n"
		);
	}

	#[test]
	fn md_line_carries_timestamp() {
		let snapshot = MarketDataSnapshot {
			symbol: "MSFT".to_string(),
			bid_price: 300_000_000_000,
			bid_quantity: 150,
			ask_price: 0,
			ask_quantity: 0,
			last_trade_price: 300_000_000_000,
			last_trade_quantity: 50,
			timestamp_ns: 42,
		};
		assert_eq!(
			format_md_snapshot(&snapshot),
			"MD:MSFT:BID:150@300000000000($300.000000000):ASK:0@0($0.000000000):\
			LAST:50@300000000000($300.000000000):TS:42\n"
		);
	}

	#[test]
	fn order_and_fill_lines() {
		let order = Order {
			order_id: 7,
			symbol: "AAPL".to_string(),
			side: Side::Buy,
			order_type: OrderType::Limit,
			quantity: 100,
			remaining_quantity: 40,
			price: 150_000_000_000,
			timestamp_ns: 99,
			status: OrderStatus::PartiallyFilled,
			client_id: "client_3".to_string(),
		};
		assert_eq!(
			format_order_update(&order),
			"ORDER:7:CLIENT:client_3:SIDE:BUY:SYMBOL:AAPL:QTY:100:REMAINING:40:\
			PRICE:150000000000($150.000000000):STATUS:PARTIAL:TS:99\n"
		);

		let fill = Fill {
			fill_id: 1,
			buy_order_id: 7,
			sell_order_id: 3,
			symbol: "AAPL".to_string(),
			quantity: 60,
			price: 150_000_000_000,
			timestamp_ns: 98,
		};
		assert_eq!(
			format_fill(&fill),
			"FILL:1:BUY_ORDER:7:SELL_ORDER:3:SYMBOL:AAPL:QTY:60:\
			PRICE:150000000000($150.000000000):TS:98\n"
		);
	}
}
