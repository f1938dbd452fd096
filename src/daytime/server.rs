use std::io::Write;

use crate::addr::SocketAddrV4;
use crate::server::{Service, TcpServer};
use crate::socket::ConnectedStream;
use super::clock::{Clock, SystemClock};
use super::format_daytime;

/// Server side of the daytime protocol.
#[derive(Debug, Default, Clone)]
pub struct DaytimeService<C = SystemClock> {
	clock: C,
}

impl DaytimeService<SystemClock> {
	pub fn new() -> Self {
		Self::with_clock(SystemClock)
	}
}

impl<C: Clock> DaytimeService<C> {
	pub fn with_clock(clock: C) -> Self {
		Self { clock }
	}
}

impl<C: Clock> Service for DaytimeService<C> {
	fn on_start(&mut self, server: &TcpServer) {
		tracing::info!(port = server.port(), "daytime server listening");
	}

	fn handle(&mut self, conn: &mut ConnectedStream, peer: SocketAddrV4) -> std::io::Result<()> {
		let line = format_daytime(&self.clock.now());
		conn.write_all(line.as_bytes())?;
		tracing::debug!(%peer, line = line.trim_end(), "sent daytime");
		Ok(())
	}
}
