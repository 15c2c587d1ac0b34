//! Feed wire messages.
//!
//! Order feeds deliver JSON objects tagged by a `type` field. Each message is
//! converted into exactly one `OrderEvent` before it reaches the reducer, so
//! malformed payloads are rejected here, at the boundary, and never inside the
//! domain logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Order, OrderEvent, OrderId, OrderPatch, OrderStatus};

/// A message received from an order feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedMessage {
	/// Full list of the client's orders.
	OrdersSnapshot { orders: Vec<Order> },
	/// A single order, new or updated.
	OrderUpsert { order: Order },
	/// Status change of an existing order.
	#[serde(rename_all = "camelCase")]
	OrderStatusUpdate {
		order_id: OrderId,
		status: OrderStatus,
		#[serde(
			default,
			deserialize_with = "crate::utils::timestamps::deserialize_option",
			skip_serializing_if = "Option::is_none"
		)]
		timestamp: Option<DateTime<Utc>>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		location: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		message: Option<String>,
	},
	/// Proof of delivery for an existing order.
	#[serde(rename_all = "camelCase")]
	DeliveryCompleted {
		order_id: OrderId,
		#[serde(deserialize_with = "crate::utils::timestamps::deserialize")]
		delivered_at: DateTime<Utc>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		signature: Option<String>,
	},
}

impl FeedMessage {
	/// Parses one JSON message.
	pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}

	/// Wire name of the message type.
	pub fn kind(&self) -> &'static str {
		match self {
			FeedMessage::OrdersSnapshot { .. } => "ORDERS_SNAPSHOT",
			FeedMessage::OrderUpsert { .. } => "ORDER_UPSERT",
			FeedMessage::OrderStatusUpdate { .. } => "ORDER_STATUS_UPDATE",
			FeedMessage::DeliveryCompleted { .. } => "DELIVERY_COMPLETED",
		}
	}
}

impl From<FeedMessage> for OrderEvent {
	fn from(message: FeedMessage) -> Self {
		match message {
			FeedMessage::OrdersSnapshot { orders } => OrderEvent::ReplaceAll(orders),
			FeedMessage::OrderUpsert { order } => OrderEvent::Upsert(order),
			FeedMessage::OrderStatusUpdate {
				order_id,
				status,
				timestamp,
				..
			} => OrderEvent::PatchById {
				id: order_id,
				patch: OrderPatch {
					status: Some(status),
					timestamp,
					..Default::default()
				},
			},
			FeedMessage::DeliveryCompleted {
				order_id,
				delivered_at,
				..
			} => OrderEvent::PatchById {
				id: order_id,
				patch: OrderPatch::status(OrderStatus::Delivered)
					.with_delivered_at(delivered_at)
					.with_timestamp(delivered_at),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_update_becomes_patch() {
		let message = FeedMessage::parse(
			r#"{"type":"ORDER_STATUS_UPDATE","orderId":"ORD-1234567890","status":"OUT_FOR_DELIVERY","location":"Colombo Hub","timestamp":"2024-03-01T10:00:00Z"}"#,
		)
		.unwrap();
		assert_eq!(message.kind(), "ORDER_STATUS_UPDATE");

		match OrderEvent::from(message) {
			OrderEvent::PatchById { id, patch } => {
				assert_eq!(id.as_str(), "ORD-1234567890");
				assert_eq!(patch.status, Some(OrderStatus::OutForDelivery));
				assert!(patch.timestamp.is_some());
				assert!(patch.delivered_at.is_none());
			},
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[test]
	fn test_delivery_completed_sets_delivered_at() {
		let message = FeedMessage::parse(
			r#"{"type":"DELIVERY_COMPLETED","orderId":1,"deliveredAt":"2024-03-02T09:30:00Z","signature":"Customer signature received"}"#,
		)
		.unwrap();

		match OrderEvent::from(message) {
			OrderEvent::PatchById { id, patch } => {
				assert_eq!(id, OrderId::from(1));
				assert_eq!(patch.status, Some(OrderStatus::Delivered));
				assert_eq!(patch.delivered_at, patch.timestamp);
			},
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[test]
	fn test_snapshot_becomes_replace_all() {
		let message = FeedMessage::parse(r#"{"type":"ORDERS_SNAPSHOT","orders":[]}"#).unwrap();
		assert_eq!(OrderEvent::from(message), OrderEvent::ReplaceAll(vec![]));
	}

	#[test]
	fn test_malformed_messages_are_rejected() {
		// missing orderId
		assert!(FeedMessage::parse(r#"{"type":"ORDER_STATUS_UPDATE","status":"DELIVERED"}"#).is_err());
		// unknown type
		assert!(FeedMessage::parse(r#"{"type":"NEW_DRIVER","orderId":1}"#).is_err());
		assert!(FeedMessage::parse("not json").is_err());
	}

	#[test]
	fn test_snapshot_with_offsetless_timestamps() {
		use chrono::TimeZone;

		let message = FeedMessage::parse(
			r#"{"type":"ORDERS_SNAPSHOT","orders":[{"id":7,"orderNumber":"ORD-1234567897","trackingNumber":"TRK-GHI11111","recipientName":"Bob Johnson","deliveryAddress":"789 Pine Rd, Galle","status":"DELIVERED","createdAt":"2024-03-01T08:00:00","updatedAt":"2024-03-02T09:30:00.125","deliveredAt":"2024-03-02T09:30:00"}]}"#,
		)
		.unwrap();

		let OrderEvent::ReplaceAll(orders) = OrderEvent::from(message) else {
			panic!("snapshot must replace the collection");
		};
		assert_eq!(orders.len(), 1);
		assert_eq!(
			orders[0].created_at,
			Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
		);
		assert_eq!(
			orders[0].delivered_at,
			Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap())
		);

		let update = FeedMessage::parse(
			r#"{"type":"ORDER_STATUS_UPDATE","orderId":7,"status":"FAILED","timestamp":"2024-03-02T10:00:00"}"#,
		)
		.unwrap();
		match OrderEvent::from(update) {
			OrderEvent::PatchById { patch, .. } => assert_eq!(
				patch.timestamp,
				Some(Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap())
			),
			other => panic!("unexpected event: {:?}", other),
		}

		assert!(FeedMessage::parse(
			r#"{"type":"DELIVERY_COMPLETED","orderId":7,"deliveredAt":"soon"}"#
		)
		.is_err());
	}
}
