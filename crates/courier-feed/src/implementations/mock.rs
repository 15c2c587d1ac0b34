//! Synthetic demo feed.
//!
//! Every `interval_ms` the mock feed emits one message for the next configured
//! order id: first the order leaves the hub, on the following tick it is
//! delivered. Ids are visited round-robin so runs are reproducible.

use crate::{millis_setting, FeedError, FeedInterface};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_types::{
	ConfigSchema, FeedMessage, Field, FieldType, ImplementationRegistry, OrderEvent, OrderId,
	OrderStatus, Schema, ValidationError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const HUB_LOCATION: &str = "Colombo Hub";
const SIGNATURE: &str = "Customer signature received";

/// Feed that emits scripted status changes for a fixed set of orders.
pub struct MockFeed {
	order_ids: Vec<OrderId>,
	interval: Duration,
	shutdown_signal: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl MockFeed {
	pub fn new(order_ids: Vec<OrderId>, interval: Duration) -> Self {
		Self {
			order_ids,
			interval,
			shutdown_signal: Arc::new(Mutex::new(None)),
		}
	}

	/// Message emitted on tick `step` (0-based).
	pub fn message_for(order_ids: &[OrderId], step: usize, now: DateTime<Utc>) -> Option<FeedMessage> {
		let order_id = order_ids.get((step / 2) % order_ids.len().max(1))?.clone();
		Some(if step % 2 == 0 {
			FeedMessage::OrderStatusUpdate {
				order_id,
				status: OrderStatus::OutForDelivery,
				timestamp: Some(now),
				location: Some(HUB_LOCATION.to_string()),
				message: None,
			}
		} else {
			FeedMessage::DeliveryCompleted {
				order_id,
				delivered_at: now,
				signature: Some(SIGNATURE.to_string()),
			}
		})
	}

	async fn run(
		order_ids: Vec<OrderId>,
		period: Duration,
		sender: mpsc::UnboundedSender<OrderEvent>,
		mut shutdown_rx: mpsc::Receiver<()>,
	) {
		// First message after one full period
		let mut ticker = interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
		let mut step = 0;

		loop {
			tokio::select! {
				_ = ticker.tick() => {
					let Some(message) = Self::message_for(&order_ids, step, Utc::now()) else {
						break;
					};
					tracing::debug!(kind = message.kind(), step, "Emitting mock update");
					if sender.send(message.into()).is_err() {
						break;
					}
					step += 1;
				}
				_ = shutdown_rx.recv() => {
					break;
				}
			}
		}
	}
}

/// Configuration schema for the mock feed.
pub struct MockFeedSchema;

impl ConfigSchema for MockFeedSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("order_ids", FieldType::Array(Box::new(FieldType::String))).with_validator(
					|value| match value.as_array() {
						Some(ids) if !ids.is_empty() => Ok(()),
						_ => Err("order_ids must list at least one order".to_string()),
					},
				),
			],
			vec![Field::new(
				"interval_ms",
				FieldType::Integer {
					min: Some(1),
					max: Some(3_600_000),
				},
			)],
		)
		.strict();

		schema.validate(config)
	}
}

#[async_trait]
impl FeedInterface for MockFeed {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockFeedSchema)
	}

	async fn start(&self, sender: mpsc::UnboundedSender<OrderEvent>) -> Result<(), FeedError> {
		let mut signal = self.shutdown_signal.lock().await;
		if signal.as_ref().is_some_and(|tx| !tx.is_closed()) {
			return Err(FeedError::AlreadyRunning);
		}

		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		*signal = Some(shutdown_tx);

		tokio::spawn(Self::run(
			self.order_ids.clone(),
			self.interval,
			sender,
			shutdown_rx,
		));

		tracing::info!(
			orders = self.order_ids.len(),
			interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
			"Mock feed running"
		);
		Ok(())
	}

	async fn stop(&self) -> Result<(), FeedError> {
		if let Some(shutdown_tx) = self.shutdown_signal.lock().await.take() {
			let _ = shutdown_tx.send(()).await;
		}
		Ok(())
	}
}

/// Builds a mock feed from its configuration table.
///
/// ```toml
/// [feed.implementations.mock]
/// order_ids = ["ORD-1234567890", "ORD-1234567891"]  # required
/// interval_ms = 15000                                # optional, defaults to 15000
/// ```
pub fn create_feed(config: &toml::Value) -> Result<Box<dyn FeedInterface>, FeedError> {
	MockFeedSchema
		.validate(config)
		.map_err(|e| FeedError::Configuration(format!("mock feed: {}", e)))?;

	let order_ids = config
		.get("order_ids")
		.and_then(|v| v.as_array())
		.map(|ids| {
			ids.iter()
				.filter_map(|id| id.as_str())
				.map(OrderId::from)
				.collect::<Vec<_>>()
		})
		.ok_or_else(|| FeedError::Configuration("order_ids is required".to_string()))?;

	Ok(Box::new(MockFeed::new(
		order_ids,
		millis_setting(config, "interval_ms", 15_000),
	)))
}

/// Registry for the mock feed.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = crate::FeedFactory;

	fn factory() -> Self::Factory {
		create_feed
	}
}

impl crate::FeedRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn ids() -> Vec<OrderId> {
		vec![OrderId::from("ORD-1"), OrderId::from("ORD-2")]
	}

	#[test]
	fn test_message_sequence() {
		let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
		let script: Vec<(String, &str)> = (0..5)
			.map(|step| {
				let message = MockFeed::message_for(&ids(), step, now).unwrap();
				let id = match &message {
					FeedMessage::OrderStatusUpdate { order_id, .. }
					| FeedMessage::DeliveryCompleted { order_id, .. } => order_id.to_string(),
					other => panic!("unexpected message: {:?}", other),
				};
				(id, message.kind())
			})
			.collect();

		assert_eq!(
			script,
			vec![
				("ORD-1".to_string(), "ORDER_STATUS_UPDATE"),
				("ORD-1".to_string(), "DELIVERY_COMPLETED"),
				("ORD-2".to_string(), "ORDER_STATUS_UPDATE"),
				("ORD-2".to_string(), "DELIVERY_COMPLETED"),
				("ORD-1".to_string(), "ORDER_STATUS_UPDATE"),
			]
		);
		assert!(MockFeed::message_for(&[], 0, now).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn test_emits_on_interval_until_stopped() {
		let feed = MockFeed::new(ids(), Duration::from_millis(15_000));
		let (tx, mut rx) = mpsc::unbounded_channel();
		feed.start(tx).await.unwrap();

		let started = Instant::now();
		let first = rx.recv().await.unwrap();
		assert!(started.elapsed() >= Duration::from_millis(15_000));
		assert!(matches!(first, OrderEvent::PatchById { .. }));

		let second = rx.recv().await.unwrap();
		match second {
			OrderEvent::PatchById { patch, .. } => {
				assert_eq!(patch.status, Some(OrderStatus::Delivered));
			},
			other => panic!("unexpected event: {:?}", other),
		}

		feed.stop().await.unwrap();
		assert!(rx.recv().await.is_none());
	}

	#[test]
	fn test_create_feed_validates_config() {
		let valid: toml::Value = toml::from_str(r#"order_ids = ["ORD-1234567890"]"#).unwrap();
		assert!(create_feed(&valid).is_ok());

		for invalid in [
			"order_ids = []",
			"interval_ms = 1000",
			"order_ids = [1, 2]",
			r#"order_ids = ["ORD-1"]
interval_ms = 0"#,
		] {
			let config: toml::Value = toml::from_str(invalid).unwrap();
			assert!(matches!(
				create_feed(&config),
				Err(FeedError::Configuration(_))
			));
		}
	}
}
