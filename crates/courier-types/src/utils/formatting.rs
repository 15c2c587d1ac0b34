//! String formatting utilities.
//!
//! Provides the human-readable identifiers printed on orders and a
//! truncation helper for keeping identifiers short in log lines.

use uuid::Uuid;

/// Truncates an identifier for display, keeping the first 8 characters followed by "..".
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

/// Builds an order number from the creation time, e.g. `ORD-1709280000000`.
pub fn format_order_number(created_at_millis: i64) -> String {
	format!("ORD-{}", created_at_millis)
}

/// Builds a public tracking number from a random seed, e.g. `TRK-3F2A9C1B`.
pub fn format_tracking_number(seed: Uuid) -> String {
	let simple = seed.simple().to_string();
	format!("TRK-{}", simple[..8].to_uppercase())
}
