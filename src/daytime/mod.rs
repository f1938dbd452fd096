//! RFC 867 Daytime protocol, TCP variant.
//!
//! The server writes one line holding the current local time as soon as a
//! connection is accepted, then closes it. Nothing is read from the client.

mod clock;
mod client;
mod server;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::client::{DaytimeResponse, DaytimeSession};
pub use self::server::DaytimeService;

use chrono::NaiveDateTime;

/// Well-known daytime port.
pub const DAYTIME_PORT: u16 = 13;

/// `ctime(3)` layout, e.g. `Wed Jun  9 04:26:40 1993`.
pub(crate) const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Width of the timestamp on the wire, before the line terminator.
const TIMESTAMP_WIDTH: usize = 24;

/// Formats one daytime response line, `\r\n` included.
pub fn format_daytime(at: &NaiveDateTime) -> String {
	let mut line: String = at
		.format(CTIME_FORMAT)
		.to_string()
		.chars()
		.take(TIMESTAMP_WIDTH)
		.collect();
	line.push_str("\r\n");
	line
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	#[test]
	fn matches_ctime_layout() {
		let at = NaiveDate::from_ymd_opt(1993, 6, 9).unwrap().and_hms_opt(4, 26, 40).unwrap();
		assert_eq!(format_daytime(&at), "Wed Jun  9 04:26:40 1993\r\n");
	}

	#[test]
	fn two_digit_day_is_not_padded() {
		let at = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap().and_hms_opt(23, 59, 5).unwrap();
		assert_eq!(format_daytime(&at), "Tue Dec 31 23:59:05 2024\r\n");
	}

	#[test]
	fn five_digit_year_is_cut_to_width() {
		let at = NaiveDate::from_ymd_opt(12345, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
		let line = format_daytime(&at);
		assert_eq!(line.len(), TIMESTAMP_WIDTH + 2);
		assert!(line.ends_with("\r\n"), "{line:?}");
	}
}
