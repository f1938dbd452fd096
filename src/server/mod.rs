//! Blocking IPv4 TCP server.
//!
//! [`TcpServer`] owns the listening socket and nothing else. What happens to
//! an accepted connection is decided by a [`Service`], driven by a
//! [`Runner`].

mod runner;
mod service;

pub use self::runner::{Runner, RunState, ShutdownHandle};
pub use self::service::{NullService, Service};

use std::fmt;

use crate::addr::{Ipv4, SocketAddrV4};
use crate::error::SocketError;
use crate::socket::{ConnectedStream, Socket, Stream};

/// Pending-connection queue depth used unless a builder overrides it.
pub const LISTEN_BACKLOG: i32 = 2;

/// A bound, listening TCP server socket.
///
/// A `TcpServer` only exists once `bind` and `listen` have both succeeded;
/// a failure in either drops the socket before the error is returned.
#[derive(Debug)]
pub struct TcpServer {
	socket: Socket,
	addr: SocketAddrV4,
}

impl TcpServer {
	/// Binds every local interface on `port` and listens with
	/// [`LISTEN_BACKLOG`].
	///
	/// Port 0 asks the kernel for an ephemeral port; [`TcpServer::port`]
	/// then reports the one it picked.
	pub fn new(port: u16) -> Result<Self, SocketError> {
		ServerBuilder::new(port).build()
	}

	pub fn builder(port: u16) -> ServerBuilder {
		ServerBuilder::new(port)
	}

	/// Associates the listening socket with a local address.
	///
	/// A server returned by [`TcpServer::new`] or [`ServerBuilder::build`]
	/// is already bound, so on those this fails with `EINVAL` and the
	/// recorded address is left as it was. On success the address is
	/// re-read from the kernel.
	pub fn bind(&mut self, addr: &SocketAddrV4) -> Result<(), SocketError> {
		self.socket.bind(addr)?;
		self.addr = self.socket.local_addr()?;
		tracing::debug!(addr = %self.addr, "bound");
		Ok(())
	}

	/// Marks the socket passive with a queue of `backlog` pending connections.
	pub fn listen(&self, backlog: i32) -> Result<(), SocketError> {
		self.socket.listen(backlog)?;
		tracing::debug!(backlog, "listening");
		Ok(())
	}

	/// Blocks until a peer connects.
	///
	/// The returned stream owns the connection; dropping it closes the
	/// descriptor. Failures are returned as [`SocketError::Accept`] and
	/// never retried here.
	pub fn accept(&self) -> Result<(ConnectedStream, SocketAddrV4), SocketError> {
		let (socket, peer) = self.socket.accept()?;
		Ok((ConnectedStream::new(socket, peer), peer))
	}

	pub fn log_connection(&self, peer: &SocketAddrV4) {
		tracing::info!(%peer, port = self.port(), "connection from {peer}");
	}

	pub fn connection_serviced(&self) {
		tracing::info!(port = self.port(), "connection serviced");
	}

	/// The bound port.
	pub fn port(&self) -> u16 {
		self.addr.port()
	}

	/// The bound address, as reported by the kernel after `bind`.
	pub fn local_addr(&self) -> SocketAddrV4 {
		self.addr
	}

	pub fn descriptor(&self) -> std::os::fd::RawFd {
		self.socket.descriptor()
	}

	/// Closes the listening socket. Later `accept` calls fail with
	/// [`SocketError::Accept`].
	pub fn close(&mut self) -> Result<(), SocketError> {
		self.socket.close()
	}
}

impl fmt::Display for TcpServer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TcpServer(port={})", self.port())
	}
}

/// Builder for [`TcpServer`] with non-default bind policies.
///
/// # Example
/// ```no_run
/// use daylane::{SocketAddrV4, TcpServer};
///
/// let server = TcpServer::builder(1313)
///     .address(SocketAddrV4::localhost(1313))
///     .backlog(16)
///     .build()?;
/// # Ok::<(), daylane::SocketError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ServerBuilder {
	addr: SocketAddrV4,
	backlog: i32,
	reuse_addr: bool,
}

impl ServerBuilder {
	pub fn new(port: u16) -> Self {
		Self {
			addr: SocketAddrV4::unspecified(port),
			backlog: LISTEN_BACKLOG,
			reuse_addr: false,
		}
	}

	/// Bind to a specific local address instead of `0.0.0.0`.
	pub fn address(mut self, addr: SocketAddrV4) -> Self {
		self.addr = addr;
		self
	}

	/// Set listen backlog. Default: [`LISTEN_BACKLOG`].
	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Set SO_REUSEADDR before binding. Default: off.
	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	/// Creates the socket, binds and starts listening.
	pub fn build(self) -> Result<TcpServer, SocketError> {
		let socket = Socket::open::<Ipv4, Stream>()?;
		if self.reuse_addr {
			socket.set_reuse_addr(true)?;
		}

		let mut server = TcpServer { socket, addr: self.addr };
		server.bind(&self.addr)?;
		server.listen(self.backlog)?;

		tracing::info!(addr = %server.addr, backlog = self.backlog, "{server} listening");
		Ok(server)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ephemeral_port_is_resolved() {
		let server = TcpServer::new(0).unwrap();
		assert_ne!(server.port(), 0);
		assert!(server.local_addr().is_unspecified());
		assert!(server.descriptor() >= 0);
		assert_eq!(server.to_string(), format!("TcpServer(port={})", server.port()));
	}

	#[test]
	fn builder_binds_requested_address() {
		let server = TcpServer::builder(0)
			.address(SocketAddrV4::localhost(0))
			.backlog(8)
			.reuse_addr(true)
			.build()
			.unwrap();
		assert_eq!(server.local_addr().ip(), [127, 0, 0, 1]);
	}

	#[test]
	fn binding_a_second_time_fails() {
		let mut server = TcpServer::new(0).unwrap();
		let before = server.local_addr();
		let err = server.bind(&SocketAddrV4::localhost(0)).unwrap_err();
		assert!(matches!(err, SocketError::Bind { errno, .. } if errno == libc::EINVAL), "{err:?}");
		assert_eq!(server.local_addr(), before);
	}

	#[test]
	fn unassigned_address_is_bind_error() {
		// TEST-NET-1 is never configured on a local interface.
		let err = TcpServer::builder(0)
			.address(SocketAddrV4::new([192, 0, 2, 1], 0))
			.build()
			.unwrap_err();
		assert!(matches!(err, SocketError::Bind { errno, .. } if errno == libc::EADDRNOTAVAIL), "{err:?}");
	}

	#[test]
	fn accept_after_close_is_accept_error() {
		let mut server = TcpServer::new(0).unwrap();
		server.close().unwrap();
		server.close().unwrap();
		let err = server.accept().unwrap_err();
		assert!(matches!(err, SocketError::Accept { errno } if errno == libc::EBADF), "{err:?}");
	}

	#[test]
	fn listen_after_close_is_listen_error() {
		let mut server = TcpServer::new(0).unwrap();
		server.close().unwrap();
		let err = server.listen(LISTEN_BACKLOG).unwrap_err();
		assert!(matches!(err, SocketError::Listen { backlog: LISTEN_BACKLOG, .. }), "{err:?}");
	}
}
