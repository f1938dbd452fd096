//! RFC 867 daytime server.
//!
//! Serves one connection at a time until the process is terminated.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use daylane::daytime::{DAYTIME_PORT, DaytimeService};
use daylane::{LISTEN_BACKLOG, Runner, SocketAddrV4, TcpServer};

/// Daytime server command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Port to listen on
	#[arg(short, long, default_value_t = DAYTIME_PORT, env = "DAYTIME_PORT")]
	port: u16,

	/// Local IPv4 address to bind
	#[arg(short, long, default_value = "0.0.0.0", value_name = "IP")]
	bind: String,

	/// Pending-connection queue depth
	#[arg(long, default_value_t = LISTEN_BACKLOG)]
	backlog: i32,

	/// Set SO_REUSEADDR before binding
	#[arg(long)]
	reuse_addr: bool,

	/// Enable verbose logging (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	init_logging(args.verbose);

	let addr = SocketAddrV4::parse(&args.bind, args.port)?;
	let server = TcpServer::builder(args.port)
		.address(addr)
		.backlog(args.backlog)
		.reuse_addr(args.reuse_addr)
		.build()
		.with_context(|| format!("failed to start daytime server on {addr}"))?;

	info!("{server} ready, press Ctrl-C to exit");

	let mut runner = Runner::new(server, DaytimeService::new());
	runner.run().context("daytime server stopped")?;
	Ok(())
}

fn init_logging(verbose: u8) {
	let default = match verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
		.init();
}
