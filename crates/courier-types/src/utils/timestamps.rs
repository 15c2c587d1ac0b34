//! Lenient timestamp deserialization.
//!
//! Order backends emit either RFC 3339 timestamps with an offset or local
//! date-times without one (`2024-03-01T08:00:00`). Offset-less values are
//! taken as UTC.

use chrono::{DateTime, NaiveDateTime, ParseError, Utc};
use serde::{de, Deserialize, Deserializer};

/// Parses an RFC 3339 timestamp, falling back to an offset-less date-time in UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
	raw.parse::<DateTime<Utc>>().or_else(|offset_error| {
		raw.parse::<NaiveDateTime>()
			.map(|naive| naive.and_utc())
			.map_err(|_| offset_error)
	})
}

/// `deserialize_with` helper for `DateTime<Utc>` fields.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	parse_timestamp(&raw).map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// `deserialize_with` helper for `Option<DateTime<Utc>>` fields.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<String>::deserialize(deserializer)?
		.map(|raw| {
			parse_timestamp(&raw)
				.map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
		})
		.transpose()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn test_parse_timestamp() {
		let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
		assert_eq!(parse_timestamp("2024-03-01T08:00:00Z").unwrap(), expected);
		assert_eq!(parse_timestamp("2024-03-01T10:00:00+02:00").unwrap(), expected);
		assert_eq!(parse_timestamp("2024-03-01T08:00:00").unwrap(), expected);
		assert_eq!(
			parse_timestamp("2024-03-01T08:00:00.250").unwrap(),
			expected + chrono::Duration::milliseconds(250)
		);
		assert!(parse_timestamp("yesterday").is_err());
		assert!(parse_timestamp("").is_err());
	}
}
