use chrono::NaiveDateTime;

use crate::client::{Session, TcpClient};
use super::CTIME_FORMAT;

/// Size of the receive buffer; one byte is kept back, so at most 127 bytes
/// are read.
const RESPONSE_BUFFER: usize = 128;

/// Client side of the daytime protocol: one read, no request.
#[derive(Debug, Default, Clone, Copy)]
pub struct DaytimeSession;

impl Session for DaytimeSession {
	type Output = DaytimeResponse;

	fn run(&mut self, client: &mut TcpClient) -> std::io::Result<DaytimeResponse> {
		let mut buf = [0u8; RESPONSE_BUFFER];
		let n = client.read(&mut buf[..RESPONSE_BUFFER - 1])?;
		Ok(DaytimeResponse::new(String::from_utf8_lossy(&buf[..n]).into_owned()))
	}
}

/// Raw text received from a daytime server.
///
/// RFC 867 does not fix a syntax, so the text is kept as-is;
/// [`DaytimeResponse::timestamp`] only understands the ctime layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaytimeResponse {
	text: String,
}

impl DaytimeResponse {
	pub fn new(text: String) -> Self {
		Self { text }
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn into_text(self) -> String {
		self.text
	}

	/// Parses a ctime-style response (`Wed Jun  9 04:26:40 1993\r\n`).
	pub fn timestamp(&self) -> Option<NaiveDateTime> {
		NaiveDateTime::parse_from_str(self.text.trim(), CTIME_FORMAT).ok()
	}
}
