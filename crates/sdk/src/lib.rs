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

//! Matchbook SDK
//!
//! Shared domain types, the textual wire codec, and thin async clients for
//! the matchbook matching engine. The engine exposes three TCP line
//! channels (order gateway, drop-copy audit stream, market-data recovery)
//! and one UDP multicast feed; everything that crosses those channels is
//! defined here so the engine and its consumers agree on a single
//! encoding.

pub mod client;
pub mod types;
pub mod wire;

pub use client::{ClientError, DropCopyClient, OrderGatewayClient, RecoveryClient};
pub use types::{
	Fill, MarketDataSnapshot, Order, OrderRequest, OrderStatus, OrderType, Side, timestamp_ns,
};
pub use wire::WireError;
