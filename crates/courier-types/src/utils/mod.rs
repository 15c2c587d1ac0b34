//! Formatting and time helpers shared across the portal crates.

pub mod formatting;
pub mod helpers;
pub mod timestamps;

pub use formatting::{format_order_number, format_tracking_number, truncate_id};
pub use helpers::current_timestamp_millis;
pub use timestamps::parse_timestamp;
