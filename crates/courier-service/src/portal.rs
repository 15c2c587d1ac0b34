//! Portal event loop.
//!
//! The loop owns the `PortalSession`. Feed events are applied as they arrive
//! and a sweep timer drops expired notifications. The loop ends when every
//! feed has finished or the shutdown future resolves.

use courier_config::{Config, ConfigError};
use courier_core::PortalSession;
use courier_feed::{FeedError, FeedService};
use courier_types::{current_timestamp_millis, Notification, OrderEvent};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::instrument;

/// Errors that can stop the portal host.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("Config error: {0}")]
	Config(#[from] ConfigError),
	#[error("Feed error: {0}")]
	Feed(#[from] FeedError),
	/// None of the configured feeds could be built.
	#[error("No usable feed implementations configured")]
	NoFeeds,
}

/// The portal host: feeds plus the timing of the notification sweep.
pub struct Portal {
	portal_id: String,
	feeds: FeedService,
	notification_timeout: Duration,
	sweep_interval: Duration,
}

impl Portal {
	pub fn new(config: &Config, feeds: FeedService) -> Self {
		Self {
			portal_id: config.portal.id.clone(),
			feeds,
			notification_timeout: Duration::from_millis(config.notifications.timeout_ms),
			sweep_interval: Duration::from_millis(config.notifications.sweep_interval_ms),
		}
	}

	/// Starts the feeds and runs the session until they finish or `shutdown` resolves.
	#[instrument(skip_all, fields(portal = %self.portal_id))]
	pub async fn run<S>(&self, shutdown: S) -> Result<PortalSession, ServiceError>
	where
		S: Future<Output = ()>,
	{
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		self.feeds.start_all(event_tx).await?;

		let session = self.drive(event_rx, shutdown).await;

		self.feeds.stop_all().await?;
		Ok(session)
	}

	async fn drive<S>(&self, mut events: mpsc::UnboundedReceiver<OrderEvent>, shutdown: S) -> PortalSession
	where
		S: Future<Output = ()>,
	{
		let mut session = PortalSession::new(self.notification_timeout);
		let mut last_seen = 0;

		let mut sweep = tokio::time::interval(self.sweep_interval);
		sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				event = events.recv() => {
					let Some(event) = event else {
						tracing::info!("All feeds finished");
						break;
					};
					session = session.handle(event, current_timestamp_millis());
					let seen = last_seen;
					for notification in session.notifications().items().iter().filter(|n| n.id > seen) {
						log_notification(notification);
						last_seen = notification.id;
					}
				}
				_ = sweep.tick() => {
					let before = session.notifications().len();
					session = session.expire(current_timestamp_millis());
					let expired = before - session.notifications().len();
					if expired > 0 {
						tracing::debug!(expired, "Notifications expired");
					}
				}
				_ = &mut shutdown => {
					tracing::info!("Shutdown requested");
					break;
				}
			}
		}

		session
	}
}

fn log_notification(notification: &Notification) {
	tracing::info!(
		id = notification.id,
		severity = %notification.severity,
		sticky = !notification.auto_expire,
		"{}: {}",
		notification.title,
		notification.message
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::factory_registry::{build_feeds, feed_factories};
	use courier_types::{OrderId, OrderStatus};
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn recording() -> NamedTempFile {
		let orders = serde_json::json!({
			"type": "ORDERS_SNAPSHOT",
			"orders": [
				{
					"id": "ORD-1234567890",
					"orderNumber": "ORD-1234567890",
					"trackingNumber": "TRK-ABC12345",
					"recipientName": "John Doe",
					"deliveryAddress": "123 Main St, Colombo 03",
					"status": "OUT_FOR_DELIVERY",
					"createdAt": "2024-03-01T08:00:00Z",
					"updatedAt": "2024-03-01T08:00:00Z"
				},
				{
					"id": "ORD-1234567891",
					"orderNumber": "ORD-1234567891",
					"trackingNumber": "TRK-DEF67890",
					"recipientName": "Jane Smith",
					"deliveryAddress": "456 Oak Ave, Kandy",
					"status": "PROCESSING",
					"createdAt": "2024-03-01T09:00:00Z",
					"updatedAt": "2024-03-01T09:00:00Z"
				}
			]
		});

		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "{}", orders).unwrap();
		writeln!(
			file,
			r#"{{"type":"DELIVERY_COMPLETED","orderId":"ORD-1234567890","deliveredAt":"2024-03-02T09:30:00Z"}}"#
		)
		.unwrap();
		writeln!(
			file,
			r#"{{"type":"ORDER_STATUS_UPDATE","orderId":"ORD-1234567891","status":"FAILED"}}"#
		)
		.unwrap();
		file
	}

	fn portal_for(feed_table: &str) -> Portal {
		let config: Config = format!(
			r#"
[portal]
id = "portal-test"

[notifications]
timeout_ms = 60000
sweep_interval_ms = 1000

{}
"#,
			feed_table
		)
		.parse()
		.unwrap();
		let feeds = build_feeds(&config, &feed_factories()).unwrap();
		Portal::new(&config, feeds)
	}

	#[tokio::test]
	async fn test_replays_file_feed_into_session() {
		let file = recording();
		let portal = portal_for(&format!(
			"[feed.implementations.file]\npath = {:?}",
			file.path().display().to_string()
		));

		let session = portal.run(std::future::pending()).await.unwrap();

		let statuses: Vec<(&OrderId, &OrderStatus)> =
			session.orders().iter().map(|o| (&o.id, &o.status)).collect();
		assert_eq!(
			statuses,
			vec![
				(&OrderId::from("ORD-1234567890"), &OrderStatus::Delivered),
				(&OrderId::from("ORD-1234567891"), &OrderStatus::Failed),
			]
		);

		let titles: Vec<&str> = session
			.notifications()
			.items()
			.iter()
			.map(|n| n.title.as_str())
			.collect();
		assert_eq!(titles, vec!["Welcome!", "Order Delivered", "Order Failed"]);
		assert_eq!(session.stats().delivered, 1);
	}

	#[tokio::test]
	async fn test_shutdown_stops_running_feeds() {
		let portal = portal_for(
			r#"[feed.implementations.mock]
order_ids = ["ORD-1234567890"]
interval_ms = 3600000"#,
		);

		let session = portal.run(async {}).await.unwrap();
		assert!(session.orders().is_empty());
		assert!(session.notifications().is_empty());
	}
}
