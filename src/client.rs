//! Blocking IPv4 TCP client.

use std::os::fd::{AsRawFd, RawFd};

use crate::addr::{Ipv4, SocketAddrV4};
use crate::error::{IoError, SocketError};
use crate::socket::{Shutdown, Socket, Stream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
	Fresh,
	Connected(SocketAddrV4),
	Failed,
}

/// A single-use TCP client.
///
/// The socket is allocated at construction; [`TcpClient::connect`] may be
/// attempted once. After a failed attempt the client cannot be reused:
/// build a new one.
#[derive(Debug)]
pub struct TcpClient {
	socket: Socket,
	state: ClientState,
}

/// Client-side protocol exchange, run after a successful connect.
pub trait Session {
	type Output;

	fn run(&mut self, client: &mut TcpClient) -> std::io::Result<Self::Output>;
}

impl TcpClient {
	/// Allocates an IPv4 stream socket.
	pub fn new() -> Result<Self, SocketError> {
		Ok(Self {
			socket: Socket::open::<Ipv4, Stream>()?,
			state: ClientState::Fresh,
		})
	}

	/// Connects to `ip:port`.
	///
	/// `ip` must be a numeric IPv4 address; anything else fails with
	/// [`SocketError::InvalidAddress`] before the kernel is involved.
	///
	/// # Example
	/// ```no_run
	/// use daylane::TcpClient;
	///
	/// let mut client = TcpClient::new()?;
	/// client.connect("127.0.0.1", 13)?;
	/// # Ok::<(), daylane::SocketError>(())
	/// ```
	pub fn connect(&mut self, ip: &str, port: u16) -> Result<(), SocketError> {
		let addr = SocketAddrV4::parse(ip, port)?;
		self.connect_addr(addr)
	}

	/// Connects to an already-parsed endpoint.
	pub fn connect_addr(&mut self, addr: SocketAddrV4) -> Result<(), SocketError> {
		match self.state {
			ClientState::Fresh => {}
			ClientState::Connected(_) => {
				return Err(SocketError::Connect { errno: libc::EISCONN, addr: addr.to_string() });
			}
			ClientState::Failed => {
				return Err(SocketError::Connect { errno: libc::EINVAL, addr: addr.to_string() });
			}
		}

		match self.socket.connect(&addr) {
			Ok(()) => {
				tracing::debug!(%addr, fd = self.socket.descriptor(), "connected");
				self.state = ClientState::Connected(addr);
				Ok(())
			}
			Err(err) => {
				self.state = ClientState::Failed;
				Err(err)
			}
		}
	}

	pub fn is_connected(&self) -> bool {
		matches!(self.state, ClientState::Connected(_))
	}

	/// The endpoint this client connected to.
	pub fn peer_addr(&self) -> Option<SocketAddrV4> {
		match self.state {
			ClientState::Connected(addr) => Some(addr),
			_ => None,
		}
	}

	/// Local endpoint chosen by the kernel for this connection.
	pub fn local_addr(&self) -> Result<SocketAddrV4, SocketError> {
		self.socket.local_addr()
	}

	pub fn socket(&self) -> &Socket {
		&self.socket
	}

	#[inline]
	pub fn descriptor(&self) -> RawFd {
		self.socket.descriptor()
	}

	pub fn read(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.ensure_connected()?;
		self.socket.recv(buf)
	}

	pub fn write(&self, buf: &[u8]) -> std::io::Result<usize> {
		self.ensure_connected()?;
		self.socket.send(buf)
	}

	/// Runs a protocol exchange over the connected socket.
	pub fn run<S: Session>(&mut self, session: &mut S) -> std::io::Result<S::Output> {
		self.ensure_connected()?;
		session.run(self)
	}

	/// Shuts down one or both directions of the connection.
	pub fn shutdown(&self, how: Shutdown) -> Result<(), SocketError> {
		self.socket.shutdown(how.raw())
	}

	/// Closes the socket early. Safe to call more than once.
	pub fn close(&mut self) -> Result<(), SocketError> {
		self.socket.close()
	}

	fn ensure_connected(&self) -> std::io::Result<()> {
		if self.is_connected() && self.socket.is_open() {
			Ok(())
		} else {
			Err(IoError::NotConnected.into())
		}
	}
}

impl AsRawFd for TcpClient {
	fn as_raw_fd(&self) -> RawFd {
		self.descriptor()
	}
}

impl std::io::Read for TcpClient {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		TcpClient::read(self, buf)
	}
}

impl std::io::Write for TcpClient {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		TcpClient::write(self, buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}
