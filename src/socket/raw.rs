use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use crate::addr::{Domain, FromSockAddr, SocketAddrV4, ToSockAddr};
use crate::error::{IoError, SocketError, errno};
use super::SockType;

/// Descriptor value reported once a socket has been closed.
pub const CLOSED: RawFd = -1;

/// Owner of exactly one OS socket descriptor.
///
/// The descriptor is released exactly once: either by an explicit
/// [`Socket::close`] or when the `Socket` is dropped. Closing an
/// already-closed socket does nothing.
#[derive(Debug)]
pub struct Socket {
	fd: Option<OwnedFd>,
}

impl Socket {
	/// Allocates a new descriptor with `socket(family, ty, protocol)`.
	///
	/// The descriptor is created with `SOCK_CLOEXEC` (close on exec).
	pub fn new(family: libc::c_int, ty: libc::c_int, protocol: libc::c_int) -> Result<Self, SocketError> {
		let fd = unsafe {
			libc::socket(family, ty | libc::SOCK_CLOEXEC, protocol)
		};
		if fd == -1 {
			return Err(SocketError::Create { errno: errno() });
		}
		tracing::debug!(fd, family, ty, protocol, "socket created");
		let fd = unsafe { OwnedFd::from_raw_fd(fd) };

		Ok(Self::from_fd(fd))
	}

	/// Allocates a socket for domain `D` and type `T`, default protocol.
	pub fn open<D: Domain, T: SockType>() -> Result<Self, SocketError> {
		Self::new(D::raw(), T::raw(), 0)
	}

	pub(crate) fn from_fd(fd: OwnedFd) -> Self {
		Self { fd: Some(fd) }
	}

	/// Returns the raw descriptor, or [`CLOSED`] after close.
	///
	/// Does not transfer ownership.
	#[inline]
	pub fn descriptor(&self) -> RawFd {
		self.fd.as_ref().map_or(CLOSED, AsRawFd::as_raw_fd)
	}

	#[inline]
	pub fn is_open(&self) -> bool {
		self.fd.is_some()
	}

	/// Releases the descriptor.
	///
	/// A no-op when already closed. The socket counts as closed even when
	/// `close(2)` reports an error; the descriptor is never closed twice.
	pub fn close(&mut self) -> Result<(), SocketError> {
		let Some(fd) = self.fd.take() else {
			return Ok(());
		};
		let raw = fd.into_raw_fd();
		if unsafe { libc::close(raw) } == -1 {
			return Err(SocketError::Close { errno: errno() });
		}
		tracing::debug!(fd = raw, "socket closed");
		Ok(())
	}

	/// Binds the descriptor to a local address.
	pub(crate) fn bind(&self, addr: &SocketAddrV4) -> Result<(), SocketError> {
		let result = addr.with_raw(|ptr, len| unsafe {
			libc::bind(self.descriptor(), ptr, len)
		});
		if result == -1 {
			return Err(SocketError::Bind { errno: errno(), addr: addr.to_string() });
		}
		Ok(())
	}

	/// Marks the descriptor passive with a pending-connection queue of `backlog`.
	pub(crate) fn listen(&self, backlog: i32) -> Result<(), SocketError> {
		let result = unsafe { libc::listen(self.descriptor(), backlog) };
		if result == -1 {
			return Err(SocketError::Listen { errno: errno(), backlog });
		}
		Ok(())
	}

	/// Blocking connect to a remote address.
	pub(crate) fn connect(&self, addr: &SocketAddrV4) -> Result<(), SocketError> {
		let result = addr.with_raw(|ptr, len| unsafe {
			libc::connect(self.descriptor(), ptr, len)
		});
		if result == -1 {
			return Err(SocketError::Connect { errno: errno(), addr: addr.to_string() });
		}
		Ok(())
	}

	/// Blocks until a peer connects; returns the new connection and its address.
	pub(crate) fn accept(&self) -> Result<(Socket, SocketAddrV4), SocketError> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let fd = unsafe {
			libc::accept4(
				self.descriptor(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
				libc::SOCK_CLOEXEC,
			)
		};
		if fd == -1 {
			return Err(SocketError::Accept { errno: errno() });
		}

		// Owned before anything else can fail so the connection never leaks.
		let conn = Socket::from_fd(unsafe { OwnedFd::from_raw_fd(fd) });
		let peer = unsafe {
			SocketAddrV4::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len)
		}
		.ok_or(SocketError::Accept { errno: libc::EAFNOSUPPORT })?;

		Ok((conn, peer))
	}

	/// Sets SO_REUSEADDR.
	pub(crate) fn set_reuse_addr(&self, enable: bool) -> Result<(), SocketError> {
		let val: libc::c_int = if enable { 1 } else { 0 };
		let result = unsafe {
			libc::setsockopt(
				self.descriptor(),
				libc::SOL_SOCKET,
				libc::SO_REUSEADDR,
				&val as *const _ as *const libc::c_void,
				std::mem::size_of::<libc::c_int>() as libc::socklen_t,
			)
		};
		if result == -1 {
			return Err(SocketError::SetOption { errno: errno(), option: "SO_REUSEADDR" });
		}
		Ok(())
	}

	/// Returns the local address (`getsockname`).
	pub(crate) fn local_addr(&self) -> Result<SocketAddrV4, SocketError> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let result = unsafe {
			libc::getsockname(
				self.descriptor(),
				&mut storage as *mut _ as *mut libc::sockaddr,
				&mut len,
			)
		};
		if result == -1 {
			return Err(SocketError::GetOption { errno: errno(), option: "SO_SOCKNAME" });
		}

		unsafe {
			SocketAddrV4::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len)
		}
		.ok_or(SocketError::GetOption { errno: libc::EAFNOSUPPORT, option: "SO_SOCKNAME" })
	}

	pub(crate) fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
		let n = unsafe {
			libc::read(
				self.descriptor(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
			)
		};

		if n == -1 {
			Err(IoError::Read { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub(crate) fn send(&self, buf: &[u8]) -> std::io::Result<usize> {
		// MSG_NOSIGNAL: a peer that hung up yields EPIPE instead of killing us.
		let n = unsafe {
			libc::send(
				self.descriptor(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
				libc::MSG_NOSIGNAL,
			)
		};

		if n == -1 {
			Err(IoError::Write { errno: errno() }.into())
		} else {
			Ok(n as usize)
		}
	}

	pub(crate) fn shutdown(&self, how: libc::c_int) -> Result<(), SocketError> {
		let result = unsafe { libc::shutdown(self.descriptor(), how) };
		if result == -1 {
			return Err(SocketError::SetOption { errno: errno(), option: "shutdown" });
		}
		Ok(())
	}
}

impl Drop for Socket {
	fn drop(&mut self) {
		if let Err(err) = self.close() {
			tracing::warn!(%err, "failed to close socket on drop");
		}
	}
}

impl AsRawFd for Socket {
	fn as_raw_fd(&self) -> RawFd {
		self.descriptor()
	}
}

impl FromRawFd for Socket {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		unsafe { Self::from_fd(OwnedFd::from_raw_fd(fd)) }
	}
}

impl IntoRawFd for Socket {
	/// Gives up ownership; returns [`CLOSED`] if already closed.
	fn into_raw_fd(mut self) -> RawFd {
		self.fd.take().map_or(CLOSED, IntoRawFd::into_raw_fd)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Ipv4, Stream};

	#[test]
	fn valid_triple_yields_descriptor() {
		let socket = Socket::new(libc::AF_INET, libc::SOCK_STREAM, 0).unwrap();
		assert!(socket.descriptor() >= 0);
		assert!(socket.is_open());
	}

	#[test]
	fn invalid_triple_is_create_error() {
		let err = Socket::new(-1, libc::SOCK_STREAM, 0).unwrap_err();
		assert!(matches!(err, SocketError::Create { .. }), "{err:?}");

		let err = Socket::new(libc::AF_INET, libc::SOCK_STREAM, libc::IPPROTO_UDP).unwrap_err();
		assert!(matches!(err, SocketError::Create { errno } if errno == libc::EPROTONOSUPPORT));
	}

	#[test]
	fn close_is_idempotent() {
		let mut socket = Socket::open::<Ipv4, Stream>().unwrap();
		socket.close().unwrap();
		assert_eq!(socket.descriptor(), CLOSED);
		assert!(!socket.is_open());
		socket.close().unwrap();
		assert_eq!(socket.descriptor(), CLOSED);
	}

	#[test]
	fn into_raw_fd_transfers_ownership() {
		let socket = Socket::open::<Ipv4, Stream>().unwrap();
		let raw = socket.into_raw_fd();
		assert!(raw >= 0);
		let mut socket = unsafe { Socket::from_raw_fd(raw) };
		socket.close().unwrap();
	}
}
