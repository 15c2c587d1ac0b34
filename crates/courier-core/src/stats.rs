//! Dashboard counters and list views over the order collection.

use courier_types::{Order, OrderStatus};
use std::convert::Infallible;
use std::str::FromStr;

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStats {
	pub total: usize,
	/// Orders still moving through the lifecycle.
	pub active: usize,
	/// Orders not yet in the warehouse (submitted or processing).
	pub pending: usize,
	pub delivered: usize,
	pub failed: usize,
}

impl OrderStats {
	pub fn from_orders(orders: &[Order]) -> Self {
		orders.iter().fold(
			Self {
				total: orders.len(),
				..Default::default()
			},
			|mut stats, order| {
				if order.status.is_active() {
					stats.active += 1;
				}
				match order.status {
					OrderStatus::Submitted | OrderStatus::Processing => stats.pending += 1,
					OrderStatus::Delivered => stats.delivered += 1,
					OrderStatus::Failed => stats.failed += 1,
					_ => {},
				}
				stats
			},
		)
	}
}

/// Status filter of the order list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
	#[default]
	All,
	Only(OrderStatus),
}

impl StatusFilter {
	pub fn matches(&self, order: &Order) -> bool {
		match self {
			StatusFilter::All => true,
			StatusFilter::Only(status) => order.status == *status,
		}
	}
}

/// Parses `"ALL"` or a status code.
impl FromStr for StatusFilter {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.trim() {
			"" | "ALL" => StatusFilter::All,
			code => StatusFilter::Only(OrderStatus::from_code(code)),
		})
	}
}

/// Orders matching the filter, in display order.
pub fn filter_orders<'a>(orders: &'a [Order], filter: &StatusFilter) -> Vec<&'a Order> {
	orders.iter().filter(|order| filter.matches(order)).collect()
}

/// Looks up an order by its public tracking number, ignoring case and surrounding spaces.
pub fn find_by_tracking_number<'a>(orders: &'a [Order], tracking_number: &str) -> Option<&'a Order> {
	let wanted = tracking_number.trim();
	if wanted.is_empty() {
		return None;
	}
	orders
		.iter()
		.find(|order| order.tracking_number.eq_ignore_ascii_case(wanted))
}

/// The `limit` most recently created orders, newest first.
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
	let mut recent: Vec<&Order> = orders.iter().collect();
	recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
	recent.truncate(limit);
	recent
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone, Utc};
	use courier_types::OrderId;

	fn order(id: u64, status: OrderStatus, age_hours: i64) -> Order {
		let created = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap() - Duration::hours(age_hours);
		Order {
			id: OrderId::from(id),
			order_number: format!("ORD-{}", 1_234_567_890 + id),
			tracking_number: format!("TRK-ABC{:05}", id),
			recipient_name: "Jane Smith".into(),
			recipient_phone: None,
			delivery_address: "456 Oak Ave, Kandy".into(),
			package_description: String::new(),
			weight: None,
			dimensions: None,
			delivered_at: (status == OrderStatus::Delivered).then_some(created),
			status,
			created_at: created,
			updated_at: created,
		}
	}

	fn sample() -> Vec<Order> {
		vec![
			order(1, OrderStatus::OutForDelivery, 48),
			order(2, OrderStatus::Delivered, 120),
			order(3, OrderStatus::InWarehouse, 24),
			order(4, OrderStatus::Processing, 6),
			order(5, OrderStatus::Failed, 72),
			order(6, OrderStatus::from_code("ON_HOLD"), 1),
		]
	}

	#[test]
	fn test_stats() {
		let stats = OrderStats::from_orders(&sample());
		assert_eq!(
			stats,
			OrderStats {
				total: 6,
				active: 3,
				pending: 1,
				delivered: 1,
				failed: 1,
			}
		);
		assert_eq!(OrderStats::from_orders(&[]), OrderStats::default());
	}

	#[test]
	fn test_filter() {
		let orders = sample();
		assert_eq!(filter_orders(&orders, &StatusFilter::All).len(), 6);

		let filter: StatusFilter = "DELIVERED".parse().unwrap();
		let delivered = filter_orders(&orders, &filter);
		assert_eq!(delivered.len(), 1);
		assert_eq!(delivered[0].id, OrderId::from(2));

		assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
		let unknown: StatusFilter = "ON_HOLD".parse().unwrap();
		assert_eq!(filter_orders(&orders, &unknown).len(), 1);
	}

	#[test]
	fn test_tracking_lookup() {
		let orders = sample();
		let found = find_by_tracking_number(&orders, "  trk-abc00003 ").unwrap();
		assert_eq!(found.id, OrderId::from(3));
		assert!(find_by_tracking_number(&orders, "TRK-NOTFOUND").is_none());
		assert!(find_by_tracking_number(&orders, "   ").is_none());
	}

	#[test]
	fn test_recent_orders() {
		let orders = sample();
		let recent: Vec<&str> = recent_orders(&orders, 3)
			.iter()
			.map(|o| o.id.as_str())
			.collect();
		assert_eq!(recent, vec!["6", "4", "3"]);
		assert_eq!(recent_orders(&orders, 100).len(), 6);
	}
}
