mod raw;
mod stream;

pub use self::raw::{Socket, CLOSED};
pub use self::stream::{ConnectedStream, Shutdown};

/// Trait for socket type markers.
///
/// Each type implementing this trait represents a socket type
/// that can be passed to the `socket()` syscall.
pub trait SockType {
	/// Returns the libc constant for this socket type.
	fn raw() -> libc::c_int;
}

/// Stream socket marker.
///
/// Provides reliable, ordered, two-way byte streams (TCP with Ipv4).
pub struct Stream;

impl SockType for Stream {
	#[inline]
	fn raw() -> libc::c_int {
		libc::SOCK_STREAM
	}
}
