//! Common types for the courier portal.
//!
//! This crate defines the data model shared by every portal component: orders
//! and their statuses, the delta events that update them, display metadata for
//! statuses, notifications, and the wire messages emitted by order feeds.

/// Feed wire messages and their conversion into order events.
pub mod events;
/// User-visible notifications.
pub mod notification;
/// Orders, statuses, patches and the events applied to order collections.
pub mod order;
/// Self-registration trait for pluggable implementations.
pub mod registry;
/// Display metadata for order statuses.
pub mod status;
/// Formatting and time helpers.
pub mod utils;
/// Configuration schema validation for pluggable implementations.
pub mod validation;

// Re-export all types for convenient access
pub use events::*;
pub use notification::*;
pub use order::*;
pub use registry::*;
pub use status::*;
pub use utils::{current_timestamp_millis, truncate_id};
pub use validation::*;
