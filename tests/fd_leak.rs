//! Kept in its own test binary: it counts the process's open descriptors,
//! which other tests running in parallel would disturb.

use daylane::{Ipv4, Socket, SocketError, Stream, TcpClient, TcpServer};

fn open_fds() -> usize {
	std::fs::read_dir("/proc/self/fd").expect("procfs").count()
}

#[test]
fn descriptors_return_to_baseline() {
	let holder = TcpServer::new(0).unwrap();
	let taken = holder.port();
	let baseline = open_fds();

	for _ in 0..64 {
		let socket = Socket::open::<Ipv4, Stream>().unwrap();
		assert!(socket.descriptor() >= 0);
		drop(socket);

		let mut closed_early = Socket::open::<Ipv4, Stream>().unwrap();
		closed_early.close().unwrap();
		closed_early.close().unwrap();

		let _client = TcpClient::new().unwrap();

		let mut bad_addr = TcpClient::new().unwrap();
		assert!(matches!(bad_addr.connect("999.1.1.1", taken), Err(SocketError::InvalidAddress { .. })));

		let server = TcpServer::new(0).unwrap();
		drop(server);

		// Construction that fails at bind must not leave the socket open.
		assert!(matches!(TcpServer::new(taken), Err(SocketError::Bind { .. })));
	}

	assert_eq!(open_fds(), baseline);
}
