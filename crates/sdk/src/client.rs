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

//! Thin async clients for the engine's three TCP channels.
//!
//! These are deliberately minimal line-protocol wrappers: they frame,
//! they do not interpret. Downstream consumers (and the engine's own
//! integration tests) decide what to do with the lines.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::{
	TcpStream, ToSocketAddrs,
	tcp::{OwnedReadHalf, OwnedWriteHalf},
};

use crate::types::OrderRequest;
use crate::wire;

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("connection closed by server")]
	Closed,
}

/// Client for the order gateway (fire-and-forget order submission).
///
/// The gateway never replies on this channel; confirmations arrive on
/// the drop-copy feed.
pub struct OrderGatewayClient {
	stream: TcpStream,
}

impl OrderGatewayClient {
	pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
		let stream = TcpStream::connect(addr).await?;
		Ok(Self { stream })
	}

	/// Submit an order.
	pub async fn submit(&mut self, request: &OrderRequest) -> Result<(), ClientError> {
		let line = wire::format_order_request(request);
		self.stream.write_all(line.as_bytes()).await?;
		Ok(())
	}

	/// Submit a raw line verbatim (a trailing newline is appended).
	/// Useful for exercising the gateway's malformed-input handling.
	pub async fn submit_raw(&mut self, line: &str) -> Result<(), ClientError> {
		self.stream.write_all(line.as_bytes()).await?;
		self.stream.write_all(b"\n").await?;
		Ok(())
	}
}

/// Subscriber to the drop-copy audit stream (push-only from the server).
pub struct DropCopyClient {
	lines: Lines<BufReader<TcpStream>>,
}

impl DropCopyClient {
	pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
		let stream = TcpStream::connect(addr).await?;
		Ok(Self {
			lines: BufReader::new(stream).lines(),
		})
	}

	/// Next `ORDER:` or `FILL:` line, without the trailing newline.
	pub async fn next_line(&mut self) -> Result<String, ClientError> {
		self.lines.next_line().await?.ok_or(ClientError::Closed)
	}
}

/// Request/response client for the market-data recovery channel.
pub struct RecoveryClient {
	reader: Lines<BufReader<OwnedReadHalf>>,
	writer: OwnedWriteHalf,
}

impl RecoveryClient {
	pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
		let stream = TcpStream::connect(addr).await?;
		let (read_half, write_half) = stream.into_split();
		Ok(Self {
			reader: BufReader::new(read_half).lines(),
			writer: write_half,
		})
	}

	/// Request a snapshot for `symbol` and wait for the reply line.
	pub async fn snapshot(&mut self, symbol: &str) -> Result<String, ClientError> {
		let request = format!("SNAPSHOT:{symbol}\n");
		self.writer.write_all(request.as_bytes()).await?;
		self.reader.next_line().await?.ok_or(ClientError::Closed)
	}
}
