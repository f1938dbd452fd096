use crate::addr::SocketAddrV4;
use crate::socket::ConnectedStream;
use super::TcpServer;

/// Protocol behaviour plugged into a [`Runner`](super::Runner).
///
/// The runner owns the accept loop; a service only decides what bytes are
/// exchanged on one connection. The connection is closed by the runner once
/// `handle` returns, whether it succeeded or not.
pub trait Service {
	/// Called once, before the first `accept`.
	fn on_start(&mut self, server: &TcpServer) {
		let _ = server;
	}

	/// Performs the protocol exchange on one accepted connection.
	fn handle(&mut self, conn: &mut ConnectedStream, peer: SocketAddrV4) -> std::io::Result<()>;
}

impl<S: Service + ?Sized> Service for Box<S> {
	fn on_start(&mut self, server: &TcpServer) {
		(**self).on_start(server)
	}

	fn handle(&mut self, conn: &mut ConnectedStream, peer: SocketAddrV4) -> std::io::Result<()> {
		(**self).handle(conn, peer)
	}
}

/// Accepts and immediately closes every connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullService;

impl Service for NullService {
	fn handle(&mut self, _conn: &mut ConnectedStream, _peer: SocketAddrV4) -> std::io::Result<()> {
		Ok(())
	}
}
