//! Display metadata for order statuses.
//!
//! Badges, progress bars and tracking timelines are all rendered from a
//! `StatusDescriptor`, which the status registry derives from an `OrderStatus`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::OrderStatus;

/// Visual severity class of a badge or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	#[default]
	Neutral,
	Info,
	Warning,
	Success,
	Danger,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Severity::Neutral => "neutral",
			Severity::Info => "info",
			Severity::Warning => "warning",
			Severity::Success => "success",
			Severity::Danger => "danger",
		};
		f.write_str(name)
	}
}

/// Display metadata for a single status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDescriptor {
	/// The status being described.
	pub status: OrderStatus,
	/// Long label used on the tracking page.
	pub label: String,
	/// Short label used on list badges.
	pub badge: String,
	/// Severity class of the badge.
	pub severity: Severity,
	/// Progress through the lifecycle, 0..=100.
	pub progress: u8,
}

/// One step of a tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
	pub status: OrderStatus,
	pub label: String,
	/// Whether the order has reached (or passed) this step.
	pub reached: bool,
}
