use std::thread;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use daylane::daytime::{DaytimeService, DaytimeSession, FixedClock, format_daytime};
use daylane::{Runner, SocketAddrV4, TcpClient, TcpServer};

fn fetch(port: u16) -> String {
	let mut client = TcpClient::new().unwrap();
	client.connect("127.0.0.1", port).unwrap();
	client.run(&mut DaytimeSession).unwrap().into_text()
}

#[test]
fn fixed_clock_gives_exact_bytes() {
	let at = NaiveDate::from_ymd_opt(1993, 6, 9).unwrap().and_hms_opt(4, 26, 40).unwrap();
	let server = TcpServer::builder(0)
		.address(SocketAddrV4::localhost(0))
		.build()
		.unwrap();
	let port = server.port();
	let mut runner = Runner::new(server, DaytimeService::with_clock(FixedClock(at)));
	let handle = runner.shutdown_handle();
	let join = thread::spawn(move || runner.run());

	assert_eq!(fetch(port), "Wed Jun  9 04:26:40 1993\r\n");
	assert_eq!(fetch(port), format_daytime(&at));

	handle.shutdown();
	join.join().unwrap().unwrap();
}

#[test]
fn system_clock_serves_back_to_back_clients() {
	let server = TcpServer::new(0).unwrap();
	let port = server.port();
	let mut runner = Runner::new(server, DaytimeService::new());
	let handle = runner.shutdown_handle();
	let join = thread::spawn(move || runner.run());

	for _ in 0..3 {
		let mut client = TcpClient::new().unwrap();
		client.connect("127.0.0.1", port).unwrap();
		let response = client.run(&mut DaytimeSession).unwrap();
		assert!(response.text().ends_with("\r\n"), "{:?}", response.text());
		assert!(response.timestamp().is_some(), "{:?}", response.text());
	}

	handle.shutdown();
	join.join().unwrap().unwrap();
}

#[test]
fn session_requires_a_connection() {
	let mut client = TcpClient::new().unwrap();
	let err = client.run(&mut DaytimeSession).unwrap_err();
	assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}

#[test]
fn read_failure_is_returned_to_the_caller() {
	let server = TcpServer::builder(0)
		.address(SocketAddrV4::localhost(0))
		.build()
		.unwrap();

	let mut client = TcpClient::new().unwrap();
	client.connect("127.0.0.1", server.port()).unwrap();
	client.close().unwrap();

	// Reported as an error value, the process keeps running.
	let err = client.run(&mut DaytimeSession).unwrap_err();
	assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}
