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

//! Matchbook Matching Engine
//!
//! A single-venue equities/derivatives matching engine. Client
//! connections submit limit orders over a TCP line protocol; each
//! symbol's central limit order book matches under price-time priority;
//! executions fan out to a drop-copy audit stream and top-of-book
//! snapshots go to both a reliable recovery channel and a best-effort
//! UDP multicast feed.
//!
//! Architecture:
//! - Single-task matching core: one engine task owns every book and all
//!   id allocation, consuming a FIFO command channel
//! - Per-request indivisibility: match, order update, fills and
//!   snapshot publication complete before the next command is taken
//! - Connection handlers are thin framers talking to the engine through
//!   a cloneable handle
//! - Best-effort egress: drop-copy and multicast writes never retry and
//!   never stall matching

pub mod book;
pub mod config;
pub mod dropcopy;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod multicast;
pub mod recovery;
pub mod supervisor;

pub use book::OrderBook;
pub use config::EngineConfig;
pub use dropcopy::{DropCopyMessage, DropCopyServer};
pub use engine::{Engine, EngineCommand, EngineError, EngineHandle, command_channel};
pub use gateway::OrderGatewayServer;
pub use multicast::{MarketDataSink, MulticastPublisher};
pub use recovery::MdRecoveryServer;
pub use supervisor::Supervisor;
