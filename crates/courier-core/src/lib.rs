//! Order status domain for the courier portal.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! logging: each operation takes the current state by reference and returns a
//! new state, leaving the input untouched. The hosting application owns the
//! single long-lived `PortalSession` and threads it through its event loop.
//!
//! - [`registry`] maps statuses to display metadata and lifecycle predecessors.
//! - [`state`] applies snapshots, upserts and patches to an order collection.
//! - [`notifications`] keeps the queue of timed, dismissible notifications.
//! - [`stats`] derives dashboard counters and list filters.
//! - [`session`] ties the above together for a single portal user.

pub mod notifications;
pub mod registry;
pub mod session;
pub mod state;
pub mod stats;

pub use notifications::{snapshot_notice, transition_notice, NotificationQueue};
pub use registry::{describe, is_expected_transition, predecessors, timeline};
pub use session::PortalSession;
pub use state::apply;
pub use stats::{filter_orders, find_by_tracking_number, recent_orders, OrderStats, StatusFilter};
