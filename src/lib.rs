//! Blocking IPv4 TCP building blocks over raw Linux sockets.
//!
//! - [`Socket`] owns one descriptor and closes it exactly once.
//! - [`TcpServer`] binds and listens at construction and hands out
//!   [`ConnectedStream`]s from `accept`.
//! - [`TcpClient`] connects once to a numeric IPv4 endpoint.
//! - [`Runner`] drives a [`Service`] over a server's accept loop, one
//!   connection at a time.
//!
//! [`daytime`] and [`echo`] are protocols built on those extension points.

pub mod daytime;
pub mod echo;
mod addr;
mod client;
mod error;
mod server;
mod socket;

pub use self::error::{IoError, SocketError, errno};
pub use self::addr::{Domain, Ipv4, SocketAddrV4};
pub use self::client::{Session, TcpClient};
pub use self::server::{LISTEN_BACKLOG, NullService, RunState, Runner, ServerBuilder, Service,
                       ShutdownHandle, TcpServer};
pub use self::socket::{CLOSED, ConnectedStream, Shutdown, SockType, Socket, Stream};
