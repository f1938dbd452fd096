//! RFC 867 daytime client: connects, prints the server's answer.

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use daylane::TcpClient;
use daylane::daytime::{DAYTIME_PORT, DaytimeSession};

/// Daytime client command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Server IPv4 address (numeric, e.g. 129.6.15.28)
	#[arg(value_name = "IP")]
	server: String,

	/// Server port
	#[arg(short, long, default_value_t = DAYTIME_PORT)]
	port: u16,

	/// Enable verbose logging
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			EnvFilter::new(if args.verbose > 0 { "debug" } else { "warn" })
		}))
		.with_writer(std::io::stderr)
		.init();

	let mut client = TcpClient::new()?;
	client
		.connect(&args.server, args.port)
		.with_context(|| format!("failed to reach daytime server {}:{}", args.server, args.port))?;

	let response = client.run(&mut DaytimeSession).map_err(|err| {
		error!(%err, "read error");
		anyhow::Error::new(err).context("read error")
	})?;
	print!("Daytime server response: {}", response.text());
	Ok(())
}
