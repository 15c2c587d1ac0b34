//! Notification dispatcher.
//!
//! The queue is a plain value: `dispatch`, `expire_stale` and `dismiss` each
//! return a new queue. Display order is insertion order (oldest first) and is
//! never changed by removals. There is no cap on pending notifications; hosts
//! that want one can throttle how often they dispatch.

use courier_types::{
	Notification, NotificationDraft, Order, OrderStatus, Severity, DEFAULT_NOTIFICATION_TITLE,
};
use std::time::Duration;

use crate::registry::describe;
use crate::stats::OrderStats;

/// Ordered set of visible notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQueue {
	next_id: u64,
	timeout_ms: u64,
	items: Vec<Notification>,
}

impl NotificationQueue {
	/// Visibility window of auto-expiring notifications unless configured otherwise.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

	pub fn new(timeout: Duration) -> Self {
		Self {
			next_id: 1,
			timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
			items: Vec::new(),
		}
	}

	/// Visible notifications, oldest first.
	pub fn items(&self) -> &[Notification] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// Appends a notification with the next id, created at `now_ms`.
	pub fn dispatch(&self, draft: NotificationDraft, now_ms: u64) -> Self {
		let mut next = self.clone();
		next.items.push(Notification {
			id: self.next_id,
			title: draft
				.title
				.unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
			message: draft.message,
			severity: draft.severity,
			auto_expire: draft.auto_expire,
			created_at: now_ms,
		});
		next.next_id += 1;
		next
	}

	/// Drops auto-expiring notifications whose timeout has elapsed at `now_ms`.
	pub fn expire_stale(&self, now_ms: u64) -> Self {
		let mut next = self.clone();
		next.items
			.retain(|item| self.expires_at(item).is_none_or(|deadline| deadline > now_ms));
		next
	}

	/// Removes one notification regardless of its expiry.
	pub fn dismiss(&self, id: u64) -> Self {
		let mut next = self.clone();
		next.items.retain(|item| item.id != id);
		next
	}

	/// Earliest time at which `expire_stale` would remove something.
	pub fn next_expiry(&self) -> Option<u64> {
		self.items.iter().filter_map(|item| self.expires_at(item)).min()
	}

	fn expires_at(&self, item: &Notification) -> Option<u64> {
		item.auto_expire
			.then(|| item.created_at.saturating_add(self.timeout_ms))
	}
}

impl Default for NotificationQueue {
	fn default() -> Self {
		Self::new(Self::DEFAULT_TIMEOUT)
	}
}

/// Notice for an order whose status changed, or that was seen for the first time.
///
/// Returns `None` when the status is unchanged. Failures stay visible until dismissed.
pub fn transition_notice(
	order: &Order,
	previous: Option<&OrderStatus>,
) -> Option<NotificationDraft> {
	let descriptor = describe(&order.status);

	let draft = match previous {
		Some(previous) if *previous == order.status => return None,
		Some(_) => NotificationDraft::new(
			format!("Order {} is now {}", order.order_number, descriptor.label),
			descriptor.severity,
		)
		.with_title(format!("Order {}", descriptor.badge)),
		None => NotificationDraft::new(
			format!(
				"Order {} for {} was added ({})",
				order.order_number, order.recipient_name, descriptor.label
			),
			Severity::Info,
		)
		.with_title("New Order"),
	};

	Some(match order.status {
		OrderStatus::Failed => draft.sticky(),
		_ => draft,
	})
}

/// Notice shown after the order list has been (re)loaded.
pub fn snapshot_notice(stats: &OrderStats) -> NotificationDraft {
	NotificationDraft::new(
		format!(
			"Orders loaded successfully. You have {} active orders.",
			stats.active
		),
		Severity::Success,
	)
	.with_title("Welcome!")
}
