//! Echo protocol (RFC 862, TCP variant): every byte received is sent back
//! until the client closes its side.

use std::io::Write;

use crate::addr::SocketAddrV4;
use crate::server::Service;
use crate::socket::ConnectedStream;

const CHUNK: usize = 4096;

#[derive(Debug, Default, Clone, Copy)]
pub struct EchoService;

impl Service for EchoService {
	fn handle(&mut self, conn: &mut ConnectedStream, peer: SocketAddrV4) -> std::io::Result<()> {
		let mut buf = [0u8; CHUNK];
		let mut total = 0usize;
		loop {
			let n = conn.read(&mut buf)?;
			if n == 0 {
				break;
			}
			conn.write_all(&buf[..n])?;
			total += n;
		}
		tracing::debug!(%peer, bytes = total, "echo finished");
		Ok(())
	}
}
