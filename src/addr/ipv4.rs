use std::fmt;
use std::net::Ipv4Addr;

use crate::addr::{Domain, ToSockAddr};
use crate::error::SocketError;

/// IPv4 address family marker.
///
/// Sockets with this domain use 32-bit addresses (e.g., 192.168.1.1).
pub struct Ipv4;

impl Domain for Ipv4 {
	type Addr = SocketAddrV4;

	#[inline]
	fn raw() -> libc::c_int {
		libc::AF_INET
	}
}

/// IPv4 socket address (IP + port).
///
/// Immutable once built. Textual input goes through [`SocketAddrV4::parse`],
/// which rejects anything that is not a dotted-quad address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddrV4 {
	ip: [u8; 4],
	port: u16,
}

impl SocketAddrV4 {
	/// Creates a new IPv4 address.
	pub const fn new(ip: [u8; 4], port: u16) -> Self {
		Self { ip, port }
	}

	/// `0.0.0.0:port`, i.e. every local interface.
	pub const fn unspecified(port: u16) -> Self {
		Self::new([0, 0, 0, 0], port)
	}

	/// `127.0.0.1:port`.
	pub const fn localhost(port: u16) -> Self {
		Self::new([127, 0, 0, 1], port)
	}

	/// Parses a numeric IPv4 address (`"a.b.c.d"`) and pairs it with `port`.
	///
	/// Hostnames, out-of-range octets and leading zeros are rejected with
	/// [`SocketError::InvalidAddress`].
	pub fn parse(ip: &str, port: u16) -> Result<Self, SocketError> {
		let parsed: Ipv4Addr = ip.parse().map_err(|_| SocketError::InvalidAddress {
			input: ip.to_owned(),
		})?;
		Ok(Self::new(parsed.octets(), port))
	}

	/// Creates from raw sockaddr_in.
	pub(crate) fn from_raw(raw: &libc::sockaddr_in) -> Self {
		Self {
			ip: raw.sin_addr.s_addr.to_ne_bytes(),
			port: u16::from_be(raw.sin_port),
		}
	}

	/// Returns the IP bytes.
	pub fn ip(&self) -> [u8; 4] {
		self.ip
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn is_unspecified(&self) -> bool {
		self.ip == [0, 0, 0, 0]
	}

	/// Returns a copy with a different port.
	pub fn with_port(&self, port: u16) -> Self {
		Self::new(self.ip, port)
	}

	/// Converts to the raw sockaddr_in for syscalls.
	pub(crate) fn to_raw(&self) -> libc::sockaddr_in {
		libc::sockaddr_in {
			sin_family: libc::AF_INET as libc::sa_family_t,
			sin_port: self.port.to_be(),
			sin_addr: libc::in_addr {
				s_addr: u32::from_be_bytes(self.ip).to_be(),
			},
			sin_zero: [0; 8],
		}
	}
}

impl fmt::Display for SocketAddrV4 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [a, b, c, d] = self.ip;
		write!(f, "{a}.{b}.{c}.{d}:{}", self.port)
	}
}

impl ToSockAddr for SocketAddrV4 {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();  // sockaddr_in lives on THIS stack frame
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
		f(ptr, len)
	}
}

/*
sockaddr_in layout:
  - sin_family: AF_INET
  - sin_port: port in network byte order (big-endian)
  - sin_addr: IP address in network byte order
  - sin_zero: padding to match sockaddr size
 */

#[cfg(test)]
mod tests {
	use super::*;
	use crate::addr::FromSockAddr;

	#[test]
	fn parses_dotted_quad() {
		let addr = SocketAddrV4::parse("192.168.1.20", 13).unwrap();
		assert_eq!(addr.ip(), [192, 168, 1, 20]);
		assert_eq!(addr.port(), 13);
		assert_eq!(addr.to_string(), "192.168.1.20:13");
	}

	#[test]
	fn rejects_malformed_text() {
		for input in ["999.1.1.1", "not-an-ip", "", "1.2.3", "1.2.3.4.5", "localhost", "::1", " 1.2.3.4"] {
			let err = SocketAddrV4::parse(input, 13).unwrap_err();
			assert!(
				matches!(&err, SocketError::InvalidAddress { input: got } if got == input),
				"{input:?} gave {err:?}"
			);
		}
	}

	#[test]
	fn raw_conversion_keeps_network_order() {
		let addr = SocketAddrV4::new([10, 0, 0, 1], 8080);
		let raw = addr.to_raw();
		assert_eq!(raw.sin_port, 8080u16.to_be());
		assert_eq!(raw.sin_addr.s_addr.to_ne_bytes(), [10, 0, 0, 1]);

		let back = addr.with_raw(|ptr, len| unsafe { SocketAddrV4::from_sockaddr(ptr, len) });
		assert_eq!(back, Some(addr));
	}

	#[test]
	fn short_sockaddr_is_rejected() {
		let raw = SocketAddrV4::localhost(1).to_raw();
		let ptr = &raw as *const _ as *const libc::sockaddr;
		assert_eq!(unsafe { SocketAddrV4::from_sockaddr(ptr, 2) }, None);
	}
}
