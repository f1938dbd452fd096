use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::addr::{Ipv4, SocketAddrV4};
use crate::error::SocketError;
use crate::socket::{Socket, Stream};
use super::{Service, TcpServer};

/// Lifecycle of a [`Runner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
	/// Built, `run` not called yet.
	Idle = 0,
	/// Inside the accept loop.
	Listening = 1,
	/// Shutdown requested; the loop exits at the next check.
	Stopping = 2,
	/// `run` has returned.
	Stopped = 3,
}

impl RunState {
	fn from_u8(raw: u8) -> Self {
		match raw {
			0 => RunState::Idle,
			1 => RunState::Listening,
			2 => RunState::Stopping,
			_ => RunState::Stopped,
		}
	}
}

#[derive(Debug)]
struct Shared {
	state: AtomicU8,
}

impl Shared {
	fn load(&self) -> RunState {
		RunState::from_u8(self.state.load(Ordering::Acquire))
	}

	fn store(&self, state: RunState) {
		self.state.store(state as u8, Ordering::Release);
	}

	fn transition(&self, from: RunState, to: RunState) -> bool {
		self.state
			.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
			.is_ok()
	}
}

/// Accept-loop driver: one [`TcpServer`], one [`Service`], one connection
/// at a time.
///
/// Every accepted connection goes through the same sequence: accept, log,
/// `Service::handle`, close, log. Handler failures are logged and do not
/// stop the loop; accept failures do.
pub struct Runner<S> {
	server: TcpServer,
	service: S,
	shared: Arc<Shared>,
}

impl<S: Service> Runner<S> {
	pub fn new(server: TcpServer, service: S) -> Self {
		Self {
			server,
			service,
			shared: Arc::new(Shared { state: AtomicU8::new(RunState::Idle as u8) }),
		}
	}

	/// Returns a handle that can stop [`Runner::run`] from another thread.
	pub fn shutdown_handle(&self) -> ShutdownHandle {
		let addr = self.server.local_addr();
		let wake = if addr.is_unspecified() {
			SocketAddrV4::localhost(addr.port())
		} else {
			addr
		};
		ShutdownHandle { shared: Arc::clone(&self.shared), wake }
	}

	pub fn state(&self) -> RunState {
		self.shared.load()
	}

	pub fn server(&self) -> &TcpServer {
		&self.server
	}

	pub fn service(&self) -> &S {
		&self.service
	}

	pub fn into_parts(self) -> (TcpServer, S) {
		(self.server, self.service)
	}

	/// Runs the accept loop until shutdown or an accept failure.
	///
	/// Returns `Ok(())` after a requested shutdown, including one requested
	/// before `run` was entered. `Stopped` is terminal: calling `run` again
	/// returns `Ok(())` without accepting anything.
	pub fn run(&mut self) -> Result<(), SocketError> {
		loop {
			match self.shared.load() {
				RunState::Stopping => {
					self.shared.store(RunState::Stopped);
					return Ok(());
				}
				RunState::Stopped => return Ok(()),
				current => {
					if self.shared.transition(current, RunState::Listening) {
						break;
					}
				}
			}
		}

		self.service.on_start(&self.server);
		let result = self.serve();
		self.shared.store(RunState::Stopped);

		match &result {
			Ok(()) => tracing::info!(port = self.server.port(), "server stopped"),
			Err(err) => tracing::error!(port = self.server.port(), %err, "server stopped"),
		}
		result
	}

	fn stopping(&self) -> bool {
		self.shared.load() == RunState::Stopping
	}

	fn serve(&mut self) -> Result<(), SocketError> {
		loop {
			if self.stopping() {
				return Ok(());
			}

			let (mut conn, peer) = match self.server.accept() {
				Ok(accepted) => accepted,
				Err(_) if self.stopping() => return Ok(()),
				Err(err) => return Err(err),
			};

			if self.stopping() {
				tracing::debug!(%peer, "dropping connection accepted during shutdown");
				return Ok(());
			}

			self.server.log_connection(&peer);
			if let Err(err) = self.service.handle(&mut conn, peer) {
				tracing::warn!(%peer, %err, "connection handler failed");
			}
			drop(conn);
			self.server.connection_serviced();
		}
	}
}

/// Stops a running [`Runner`] from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
	shared: Arc<Shared>,
	wake: SocketAddrV4,
}

impl ShutdownHandle {
	/// Requests shutdown and wakes a blocked `accept`.
	///
	/// The wake-up is a loopback connection to the listening port, made only
	/// while the runner is `Listening`; the runner drops it without servicing
	/// it. Before `run` only the state changes. Calling this after the runner
	/// stopped does nothing.
	pub fn shutdown(&self) {
		if self.shared.transition(RunState::Idle, RunState::Stopping) {
			tracing::info!(port = self.wake.port(), "shutdown requested before start");
			return;
		}
		if !self.shared.transition(RunState::Listening, RunState::Stopping) {
			return;
		}
		tracing::info!(port = self.wake.port(), "shutdown requested");
		let woke = Socket::open::<Ipv4, Stream>().and_then(|socket| socket.connect(&self.wake));
		if let Err(err) = woke {
			tracing::debug!(%err, "wake-up connect failed");
		}
	}

	pub fn state(&self) -> RunState {
		self.shared.load()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::server::NullService;

	#[test]
	fn shutdown_before_run_returns_immediately() {
		let mut runner = Runner::new(TcpServer::new(0).unwrap(), NullService);
		assert_eq!(runner.state(), RunState::Idle);

		let handle = runner.shutdown_handle();
		handle.shutdown();
		assert_eq!(handle.state(), RunState::Stopping);

		runner.run().unwrap();
		assert_eq!(runner.state(), RunState::Stopped);

		// No-op once stopped.
		handle.shutdown();
		assert_eq!(handle.state(), RunState::Stopped);
	}

	/// Counts the connections handed to it.
	#[derive(Default)]
	struct Counting {
		handled: Vec<SocketAddrV4>,
	}

	impl Service for Counting {
		fn handle(&mut self, _conn: &mut crate::ConnectedStream, peer: SocketAddrV4) -> std::io::Result<()> {
			self.handled.push(peer);
			Ok(())
		}
	}

	#[test]
	fn shutdown_before_run_leaves_nothing_to_service() {
		let server = TcpServer::builder(0)
			.address(SocketAddrV4::localhost(0))
			.build()
			.unwrap();
		let mut runner = Runner::new(server, Counting::default());
		runner.shutdown_handle().shutdown();

		runner.run().unwrap();
		assert_eq!(runner.state(), RunState::Stopped);
		// Stopped is terminal; a second run must not accept anything.
		runner.run().unwrap();
		assert_eq!(runner.state(), RunState::Stopped);

		let (server, service) = runner.into_parts();
		assert!(service.handled.is_empty(), "{:?}", service.handled);

		// Nothing is waiting in the listen backlog either.
		let mut pfd = libc::pollfd { fd: server.descriptor(), events: libc::POLLIN, revents: 0 };
		let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
		assert_eq!(ready, 0, "a connection is queued on the listener");
	}

	#[test]
	fn accept_failure_stops_the_loop() {
		let mut server = TcpServer::new(0).unwrap();
		server.close().unwrap();

		let mut runner = Runner::new(server, NullService);
		let err = runner.run().unwrap_err();
		assert!(matches!(err, SocketError::Accept { .. }), "{err:?}");
		assert_eq!(runner.state(), RunState::Stopped);
	}
}
