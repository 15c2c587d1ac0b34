//! Order types for the courier portal.
//!
//! This module defines delivery orders, the closed set of lifecycle statuses,
//! partial updates (patches) and the events that the order reducer applies to
//! an in-memory order collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::formatting::{format_order_number, format_tracking_number};

/// Stable, unique identifier of an order.
///
/// Backends emit identifiers either as JSON numbers or strings; both are
/// accepted and normalised to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl<'de> Deserialize<'de> for OrderId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum RawId {
			Text(String),
			Number(u64),
		}

		Ok(match RawId::deserialize(deserializer)? {
			RawId::Text(text) => OrderId(text),
			RawId::Number(number) => OrderId(number.to_string()),
		})
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<u64> for OrderId {
	fn from(id: u64) -> Self {
		Self(id.to_string())
	}
}

impl From<&str> for OrderId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for OrderId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Lifecycle status of a delivery order.
///
/// The canonical lifecycle is `Submitted -> Processing -> InWarehouse ->
/// RoutePlanned -> OutForDelivery -> Delivered`, with `Failed` as a terminal
/// branch. Codes outside that set are kept verbatim as `Unrecognized` so that
/// newer backends never break older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
	/// Order has been submitted by the client.
	Submitted,
	/// Order is being processed.
	Processing,
	/// Package is in a warehouse awaiting dispatch.
	InWarehouse,
	/// A delivery route has been planned.
	RoutePlanned,
	/// Package is with a driver.
	OutForDelivery,
	/// Package has been delivered.
	Delivered,
	/// Delivery failed.
	Failed,
	/// Any code this client does not know about.
	Unrecognized(String),
}

impl OrderStatus {
	/// Canonical statuses in lifecycle order, followed by the failure branch.
	pub const CANONICAL: [OrderStatus; 7] = [
		OrderStatus::Submitted,
		OrderStatus::Processing,
		OrderStatus::InWarehouse,
		OrderStatus::RoutePlanned,
		OrderStatus::OutForDelivery,
		OrderStatus::Delivered,
		OrderStatus::Failed,
	];

	/// Wire code of this status.
	pub fn code(&self) -> &str {
		match self {
			OrderStatus::Submitted => "SUBMITTED",
			OrderStatus::Processing => "PROCESSING",
			OrderStatus::InWarehouse => "IN_WAREHOUSE",
			OrderStatus::RoutePlanned => "ROUTE_PLANNED",
			OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Failed => "FAILED",
			OrderStatus::Unrecognized(code) => code,
		}
	}

	/// Maps a wire code to a status. Never fails.
	pub fn from_code(code: &str) -> Self {
		match code {
			"SUBMITTED" => OrderStatus::Submitted,
			"PROCESSING" => OrderStatus::Processing,
			"IN_WAREHOUSE" => OrderStatus::InWarehouse,
			"ROUTE_PLANNED" => OrderStatus::RoutePlanned,
			"OUT_FOR_DELIVERY" => OrderStatus::OutForDelivery,
			"DELIVERED" => OrderStatus::Delivered,
			"FAILED" => OrderStatus::Failed,
			other => OrderStatus::Unrecognized(other.to_string()),
		}
	}

	/// True while the order is still moving through the lifecycle.
	pub fn is_active(&self) -> bool {
		matches!(
			self,
			OrderStatus::Submitted
				| OrderStatus::Processing
				| OrderStatus::InWarehouse
				| OrderStatus::RoutePlanned
				| OrderStatus::OutForDelivery
		)
	}

	/// True for `Delivered` and `Failed`.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Failed)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

impl FromStr for OrderStatus {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(OrderStatus::from_code(s))
	}
}

impl From<String> for OrderStatus {
	fn from(code: String) -> Self {
		OrderStatus::from_code(&code)
	}
}

impl From<OrderStatus> for String {
	fn from(status: OrderStatus) -> Self {
		match status {
			OrderStatus::Unrecognized(code) => code,
			known => known.code().to_string(),
		}
	}
}

/// A delivery order as held by the portal session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: OrderId,
	/// Human-readable order number, generated at creation.
	pub order_number: String,
	/// Public tracking number.
	#[serde(default)]
	pub tracking_number: String,
	/// Name of the recipient.
	pub recipient_name: String,
	/// Contact phone of the recipient.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient_phone: Option<String>,
	/// Delivery address.
	pub delivery_address: String,
	/// What is being shipped.
	#[serde(default)]
	pub package_description: String,
	/// Package weight in kilograms.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weight: Option<f64>,
	/// Package dimensions as entered by the client.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimensions: Option<String>,
	/// Current status.
	pub status: OrderStatus,
	/// When the order was created.
	#[serde(deserialize_with = "crate::utils::timestamps::deserialize")]
	pub created_at: DateTime<Utc>,
	/// When the order was last updated. Never earlier than `created_at`.
	#[serde(deserialize_with = "crate::utils::timestamps::deserialize")]
	pub updated_at: DateTime<Utc>,
	/// Set if and only if the status is `Delivered`.
	#[serde(
		default,
		deserialize_with = "crate::utils::timestamps::deserialize_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub delivered_at: Option<DateTime<Utc>>,
}

/// Client-entered fields of an order that has not been submitted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
	pub recipient_name: String,
	#[serde(default)]
	pub recipient_phone: Option<String>,
	pub delivery_address: String,
	pub package_description: String,
	#[serde(default)]
	pub weight: Option<f64>,
	#[serde(default)]
	pub dimensions: Option<String>,
}

impl Order {
	/// Creates a freshly submitted order with generated order and tracking numbers.
	pub fn create(id: OrderId, new_order: NewOrder, now: DateTime<Utc>) -> Self {
		Self {
			id,
			order_number: format_order_number(now.timestamp_millis()),
			tracking_number: format_tracking_number(uuid::Uuid::new_v4()),
			recipient_name: new_order.recipient_name,
			recipient_phone: new_order.recipient_phone,
			delivery_address: new_order.delivery_address,
			package_description: new_order.package_description,
			weight: new_order.weight,
			dimensions: new_order.dimensions,
			status: OrderStatus::Submitted,
			created_at: now,
			updated_at: now,
			delivered_at: None,
		}
	}
}

/// Partial update merged into an existing order.
///
/// Absent fields leave the order untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient_name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient_phone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivery_address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub package_description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weight: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dimensions: Option<String>,
	#[serde(
		default,
		deserialize_with = "crate::utils::timestamps::deserialize_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub delivered_at: Option<DateTime<Utc>>,
	/// When the change happened upstream; becomes the order's `updated_at`.
	#[serde(
		default,
		deserialize_with = "crate::utils::timestamps::deserialize_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub timestamp: Option<DateTime<Utc>>,
}

impl OrderPatch {
	/// Patch that only changes the status.
	pub fn status(status: OrderStatus) -> Self {
		Self {
			status: Some(status),
			..Default::default()
		}
	}

	pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	pub fn with_delivered_at(mut self, delivered_at: DateTime<Utc>) -> Self {
		self.delivered_at = Some(delivered_at);
		self
	}
}

/// Update applied to an order collection by the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
	/// Replace the whole collection, typically after a fetch-all.
	ReplaceAll(Vec<Order>),
	/// Insert a new order at the front, or replace an existing one in place.
	Upsert(Order),
	/// Merge fields into an existing order; ignored if the id is unknown.
	PatchById { id: OrderId, patch: OrderPatch },
}

impl OrderEvent {
	/// Short name used in log fields.
	pub fn kind(&self) -> &'static str {
		match self {
			OrderEvent::ReplaceAll(_) => "replace_all",
			OrderEvent::Upsert(_) => "upsert",
			OrderEvent::PatchById { .. } => "patch",
		}
	}
}
