//! Status registry.
//!
//! Static lookup from an order status to the metadata used for badges,
//! progress bars and tracking timelines, plus the table of lifecycle
//! predecessors. Lookups are total: unknown codes get a neutral descriptor
//! carrying the raw code as label.

use courier_types::{OrderStatus, Severity, StatusDescriptor, TimelineStep};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Statuses shown on the tracking timeline, in lifecycle order.
const TIMELINE: [OrderStatus; 6] = [
	OrderStatus::Submitted,
	OrderStatus::Processing,
	OrderStatus::InWarehouse,
	OrderStatus::RoutePlanned,
	OrderStatus::OutForDelivery,
	OrderStatus::Delivered,
];

/// Returns display metadata for a status. Never fails.
pub fn describe(status: &OrderStatus) -> StatusDescriptor {
	let (label, badge, severity, progress) = match status {
		OrderStatus::Submitted => ("Order Submitted", "Submitted", Severity::Neutral, 20),
		OrderStatus::Processing => ("Processing", "Processing", Severity::Warning, 40),
		OrderStatus::InWarehouse => ("In Warehouse", "In Warehouse", Severity::Info, 60),
		OrderStatus::RoutePlanned => ("Route Planned", "Route Planned", Severity::Info, 70),
		OrderStatus::OutForDelivery => {
			("Out for Delivery", "Out for Delivery", Severity::Warning, 90)
		},
		OrderStatus::Delivered => ("Delivered", "Delivered", Severity::Success, 100),
		// Terminal branch, not a point on the progress bar
		OrderStatus::Failed => ("Delivery Failed", "Failed", Severity::Danger, 0),
		OrderStatus::Unrecognized(code) => (code.as_str(), code.as_str(), Severity::Neutral, 0),
	};

	StatusDescriptor {
		status: status.clone(),
		label: label.to_string(),
		badge: badge.to_string(),
		severity,
		progress,
	}
}

/// Valid predecessors of each status. Unknown codes have none.
static PREDECESSORS: Lazy<HashMap<OrderStatus, Vec<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(OrderStatus::Submitted, vec![]);
	for pair in TIMELINE.windows(2) {
		m.insert(pair[1].clone(), vec![pair[0].clone()]);
	}
	m.insert(
		OrderStatus::Failed,
		TIMELINE
			.iter()
			.filter(|status| status.is_active())
			.cloned()
			.collect(),
	);
	m
});

/// Statuses an order may hold immediately before reaching `status`.
pub fn predecessors(status: &OrderStatus) -> &'static [OrderStatus] {
	PREDECESSORS
		.get(status)
		.map(Vec::as_slice)
		.unwrap_or(&[])
}

/// Whether moving from `from` to `to` follows the canonical lifecycle.
///
/// Informational only: feeds are allowed to skip steps or arrive out of order.
pub fn is_expected_transition(from: &OrderStatus, to: &OrderStatus) -> bool {
	from == to || predecessors(to).contains(from)
}

/// Tracking timeline for an order currently in `status`.
pub fn timeline(status: &OrderStatus) -> Vec<TimelineStep> {
	let reached_index = TIMELINE.iter().position(|step| step == status).unwrap_or(0);

	TIMELINE
		.iter()
		.enumerate()
		.map(|(index, step)| TimelineStep {
			status: step.clone(),
			label: describe(step).label,
			reached: index <= reached_index,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_canonical_descriptors() {
		for status in OrderStatus::CANONICAL {
			let descriptor = describe(&status);
			assert!(descriptor.progress <= 100);
			assert!(!descriptor.label.is_empty());
			assert!(!descriptor.badge.is_empty());
			assert_eq!(descriptor.status, status);
		}
	}

	#[test]
	fn test_lifecycle_progress_is_increasing() {
		let progress: Vec<u8> = TIMELINE.iter().map(|s| describe(s).progress).collect();
		assert!(progress.windows(2).all(|w| w[0] < w[1]));
		assert_eq!(describe(&OrderStatus::Failed).progress, 0);
		assert_eq!(describe(&OrderStatus::Delivered).progress, 100);
	}

	#[test]
	fn test_unknown_status_falls_back() {
		let status = OrderStatus::from_code("ON_HOLD");
		let descriptor = describe(&status);
		assert_eq!(descriptor.label, "ON_HOLD");
		assert_eq!(descriptor.badge, "ON_HOLD");
		assert_eq!(descriptor.severity, Severity::Neutral);
		assert_eq!(descriptor.progress, 0);
	}

	#[test]
	fn test_severity_table() {
		assert_eq!(describe(&OrderStatus::Processing).severity, Severity::Warning);
		assert_eq!(describe(&OrderStatus::Delivered).severity, Severity::Success);
		assert_eq!(describe(&OrderStatus::Failed).severity, Severity::Danger);
		assert_eq!(describe(&OrderStatus::Failed).label, "Delivery Failed");
		assert_eq!(describe(&OrderStatus::Failed).badge, "Failed");
	}

	#[test]
	fn test_predecessors() {
		assert!(predecessors(&OrderStatus::Submitted).is_empty());
		assert_eq!(
			predecessors(&OrderStatus::Delivered),
			&[OrderStatus::OutForDelivery]
		);
		assert_eq!(predecessors(&OrderStatus::Failed).len(), 5);
		assert!(!predecessors(&OrderStatus::Failed).contains(&OrderStatus::Delivered));
		assert!(predecessors(&OrderStatus::from_code("ON_HOLD")).is_empty());
	}

	#[test]
	fn test_expected_transitions() {
		assert!(is_expected_transition(
			&OrderStatus::Submitted,
			&OrderStatus::Processing
		));
		assert!(is_expected_transition(
			&OrderStatus::OutForDelivery,
			&OrderStatus::Failed
		));
		assert!(is_expected_transition(
			&OrderStatus::Delivered,
			&OrderStatus::Delivered
		));
		assert!(!is_expected_transition(
			&OrderStatus::Submitted,
			&OrderStatus::Delivered
		));
		assert!(!is_expected_transition(
			&OrderStatus::Delivered,
			&OrderStatus::Failed
		));
	}

	#[test]
	fn test_timeline_marks_reached_steps() {
		let steps = timeline(&OrderStatus::RoutePlanned);
		assert_eq!(steps.len(), 6);
		let reached: Vec<bool> = steps.iter().map(|s| s.reached).collect();
		assert_eq!(reached, vec![true, true, true, true, false, false]);
		assert_eq!(steps[0].label, "Order Submitted");

		// Failed and unknown orders only show the submission
		for status in [OrderStatus::Failed, OrderStatus::from_code("ON_HOLD")] {
			let reached = timeline(&status).iter().filter(|s| s.reached).count();
			assert_eq!(reached, 1);
		}
		assert!(timeline(&OrderStatus::Delivered).iter().all(|s| s.reached));
	}
}
