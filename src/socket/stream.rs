use std::os::fd::{AsRawFd, RawFd};

use crate::addr::SocketAddrV4;
use crate::error::SocketError;
use super::raw::Socket;

/// A connected stream socket.
///
/// Produced by `TcpServer::accept()`. Owns its descriptor through a
/// [`Socket`], so the connection is closed on every exit path of the
/// handler that received it, including early returns on error.
#[derive(Debug)]
pub struct ConnectedStream {
	socket: Socket,
	peer: SocketAddrV4,
}

impl ConnectedStream {
	pub(crate) fn new(socket: Socket, peer: SocketAddrV4) -> Self {
		Self { socket, peer }
	}

	/// Returns the raw file descriptor.
	#[inline]
	pub fn descriptor(&self) -> RawFd {
		self.socket.descriptor()
	}

	/// Address of the remote end, as reported by `accept()`.
	pub fn peer_addr(&self) -> SocketAddrV4 {
		self.peer
	}

	/// Returns the local address of this connection.
	pub fn local_addr(&self) -> Result<SocketAddrV4, SocketError> {
		self.socket.local_addr()
	}

	pub fn read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.socket.recv(buf)
	}

	pub fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
		self.socket.send(buf)
	}

	pub fn shutdown(&self, how: Shutdown) -> Result<(), SocketError> {
		self.socket.shutdown(how.raw())
	}

	/// Closes the connection now instead of at drop.
	pub fn close(mut self) -> Result<(), SocketError> {
		self.socket.close()
	}
}

impl AsRawFd for ConnectedStream {
	fn as_raw_fd(&self) -> RawFd {
		self.descriptor()
	}
}

impl std::io::Read for ConnectedStream {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		ConnectedStream::read(self, buf)
	}
}

impl std::io::Write for ConnectedStream {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		ConnectedStream::write(self, buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())  // nothing buffered in userspace
	}
}

pub enum Shutdown {
	Read,   // SHUT_RD
	Write,  // SHUT_WR
	ReadWrite,   // SHUT_RDWR
}

impl Shutdown {
	pub(crate) fn raw(&self) -> libc::c_int {
		match self {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		}
	}
}
