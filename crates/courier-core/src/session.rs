//! Portal session state.
//!
//! A `PortalSession` bundles the order collection and the notification queue
//! of one portal user. Handling an event runs the reducer and turns the
//! resulting status changes into notifications.

use courier_types::{truncate_id, Order, OrderEvent, OrderId};
use std::time::Duration;
use tracing::instrument;

use crate::notifications::{snapshot_notice, transition_notice, NotificationQueue};
use crate::registry::is_expected_transition;
use crate::state;
use crate::stats::OrderStats;

/// Orders and notifications owned by the host for one portal user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalSession {
	orders: Vec<Order>,
	notifications: NotificationQueue,
}

impl PortalSession {
	/// Empty session whose auto-expiring notifications last `notification_timeout`.
	pub fn new(notification_timeout: Duration) -> Self {
		Self {
			orders: Vec::new(),
			notifications: NotificationQueue::new(notification_timeout),
		}
	}

	/// Orders in display order.
	pub fn orders(&self) -> &[Order] {
		&self.orders
	}

	pub fn notifications(&self) -> &NotificationQueue {
		&self.notifications
	}

	pub fn stats(&self) -> OrderStats {
		OrderStats::from_orders(&self.orders)
	}

	/// Applies an order event and dispatches notices for the changes it caused.
	///
	/// Snapshots produce a single summary notice; upserts and patches produce one
	/// notice when the affected order is new or changed status. Patches for
	/// unknown orders change nothing.
	#[instrument(skip_all, fields(event = event.kind()))]
	pub fn handle(&self, event: OrderEvent, now_ms: u64) -> Self {
		let target = match &event {
			OrderEvent::ReplaceAll(_) => None,
			OrderEvent::Upsert(order) => Some(order.id.clone()),
			OrderEvent::PatchById { id, .. } => Some(id.clone()),
		};

		let orders = state::apply(&self.orders, event);
		let notifications = match target {
			None => self
				.notifications
				.dispatch(snapshot_notice(&OrderStats::from_orders(&orders)), now_ms),
			Some(id) => self.notify_change(&orders, &id, now_ms),
		};

		Self {
			orders,
			notifications,
		}
	}

	fn notify_change(&self, orders: &[Order], id: &OrderId, now_ms: u64) -> NotificationQueue {
		let Some(order) = orders.iter().find(|order| &order.id == id) else {
			tracing::debug!(order_id = %truncate_id(id.as_str()), "Ignoring update for unknown order");
			return self.notifications.clone();
		};

		let previous = self
			.orders
			.iter()
			.find(|o| &o.id == id)
			.map(|o| &o.status);

		if let Some(from) = previous {
			if !is_expected_transition(from, &order.status) {
				tracing::debug!(
					order_id = %truncate_id(id.as_str()),
					from = %from,
					to = %order.status,
					"Status changed outside the usual lifecycle"
				);
			}
		}

		match transition_notice(order, previous) {
			Some(draft) => self.notifications.dispatch(draft, now_ms),
			None => self.notifications.clone(),
		}
	}

	/// Removes expired notifications.
	pub fn expire(&self, now_ms: u64) -> Self {
		Self {
			orders: self.orders.clone(),
			notifications: self.notifications.expire_stale(now_ms),
		}
	}

	/// Removes one notification.
	pub fn dismiss(&self, notification_id: u64) -> Self {
		Self {
			orders: self.orders.clone(),
			notifications: self.notifications.dismiss(notification_id),
		}
	}
}
