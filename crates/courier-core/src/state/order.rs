//! Order state reducer.
//!
//! `apply` is the single entry point: it borrows the current collection and
//! returns the next one. The reducer assumes well-formed events (validation
//! happens where feed messages are parsed) and never fails.

use courier_types::{Order, OrderEvent, OrderPatch, OrderStatus};
use std::collections::HashSet;

/// Applies one event to the order collection, returning the new collection.
///
/// - `ReplaceAll` discards the current collection. Should the snapshot list an
///   id twice, only its first occurrence is kept.
/// - `Upsert` replaces a known order in place or inserts an unknown one at the front.
/// - `PatchById` merges fields into a known order and is a no-op otherwise.
pub fn apply(orders: &[Order], event: OrderEvent) -> Vec<Order> {
	match event {
		OrderEvent::ReplaceAll(snapshot) => {
			let mut seen = HashSet::with_capacity(snapshot.len());
			snapshot
				.into_iter()
				.filter(|order| seen.insert(order.id.clone()))
				.collect()
		},
		OrderEvent::Upsert(order) => {
			let mut next = orders.to_vec();
			match next.iter().position(|existing| existing.id == order.id) {
				Some(index) => next[index] = order,
				None => next.insert(0, order),
			}
			next
		},
		OrderEvent::PatchById { id, patch } => {
			let mut next = orders.to_vec();
			if let Some(existing) = next.iter_mut().find(|existing| existing.id == id) {
				*existing = merge_patch(existing, &patch);
			}
			next
		},
	}
}

/// Merges a patch into an order and restores the timestamp invariants.
///
/// `updated_at` advances to the patch timestamp but never moves backwards or
/// drops below `created_at`.
/// `delivered_at` is cleared unless the merged status is `Delivered`; a
/// delivered order without one falls back to the patch timestamp, then to
/// `updated_at`.
pub fn merge_patch(order: &Order, patch: &OrderPatch) -> Order {
	let mut merged = order.clone();

	if let Some(status) = &patch.status {
		merged.status = status.clone();
	}
	if let Some(name) = &patch.recipient_name {
		merged.recipient_name = name.clone();
	}
	if let Some(phone) = &patch.recipient_phone {
		merged.recipient_phone = Some(phone.clone());
	}
	if let Some(address) = &patch.delivery_address {
		merged.delivery_address = address.clone();
	}
	if let Some(description) = &patch.package_description {
		merged.package_description = description.clone();
	}
	if let Some(weight) = patch.weight {
		merged.weight = Some(weight);
	}
	if let Some(dimensions) = &patch.dimensions {
		merged.dimensions = Some(dimensions.clone());
	}
	if let Some(timestamp) = patch.timestamp {
		merged.updated_at = timestamp.max(merged.updated_at).max(merged.created_at);
	}
	if let Some(delivered_at) = patch.delivered_at {
		merged.delivered_at = Some(delivered_at);
	}

	if merged.status == OrderStatus::Delivered {
		if merged.delivered_at.is_none() {
			merged.delivered_at = Some(patch.timestamp.unwrap_or(merged.updated_at));
		}
	} else {
		merged.delivered_at = None;
	}

	merged
}
