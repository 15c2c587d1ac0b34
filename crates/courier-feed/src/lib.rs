//! Order feeds for the courier portal.
//!
//! A feed is the portal's source of order events. Implementations run a
//! background task that turns wire messages into `OrderEvent`s and pushes them
//! into a channel owned by the host. The `file` feed replays recorded JSON
//! lines, the `mock` feed emits synthetic status changes at a fixed pace.

use async_trait::async_trait;
use courier_types::{ConfigSchema, ImplementationRegistry, OrderEvent};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod mock;
}

/// Errors that can occur while running an order feed.
#[derive(Debug, Error)]
pub enum FeedError {
	/// The feed source could not be reached, even after retrying.
	#[error("Connection error: {0}")]
	Connection(String),
	/// A message from the feed could not be decoded.
	#[error("Parse error: {0}")]
	Parse(String),
	/// The feed's configuration table is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// `start` was called on a feed that is already running.
	#[error("Feed already running")]
	AlreadyRunning,
}

/// Trait implemented by every order feed.
#[async_trait]
pub trait FeedInterface: Send + Sync {
	/// Returns the schema used to validate this feed's configuration table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Starts delivering events into `sender`.
	///
	/// Returns once the background task is spawned. The task ends when `stop`
	/// is called, the source is exhausted, or the receiver is dropped; the
	/// sender is dropped with it.
	async fn start(&self, sender: mpsc::UnboundedSender<OrderEvent>) -> Result<(), FeedError>;

	/// Stops the background task. Stopping an idle feed is a no-op.
	async fn stop(&self) -> Result<(), FeedError>;
}

/// Builds a feed from its TOML table.
pub type FeedFactory = fn(&toml::Value) -> Result<Box<dyn FeedInterface>, FeedError>;

/// Registry trait for feed implementations.
pub trait FeedRegistry: ImplementationRegistry<Factory = FeedFactory> {}

/// All feed implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, FeedFactory)> {
	use implementations::{file, mock};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Runs a set of feeds side by side.
pub struct FeedService {
	feeds: Vec<(String, Box<dyn FeedInterface>)>,
}

impl FeedService {
	pub fn new(feeds: Vec<(String, Box<dyn FeedInterface>)>) -> Self {
		Self { feeds }
	}

	/// Names of the configured feeds.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.feeds.iter().map(|(name, _)| name.as_str())
	}

	/// Starts every feed. Feeds started before a failure are stopped again.
	pub async fn start_all(&self, sender: mpsc::UnboundedSender<OrderEvent>) -> Result<(), FeedError> {
		for (index, (name, feed)) in self.feeds.iter().enumerate() {
			if let Err(e) = feed.start(sender.clone()).await {
				tracing::error!(feed = %name, error = %e, "Failed to start feed");
				for (_, started) in &self.feeds[..index] {
					let _ = started.stop().await;
				}
				return Err(e);
			}
			tracing::info!(feed = %name, "Feed started");
		}
		Ok(())
	}

	/// Stops every feed, returning the first error after trying all of them.
	pub async fn stop_all(&self) -> Result<(), FeedError> {
		let mut first_error = None;
		for (name, feed) in &self.feeds {
			if let Err(e) = feed.stop().await {
				tracing::warn!(feed = %name, error = %e, "Failed to stop feed");
				first_error.get_or_insert(e);
			}
		}
		first_error.map_or(Ok(()), Err)
	}
}

/// Exponential backoff used when a feed source cannot be opened.
///
/// Retry `n` (1-based) waits `base_delay * 2^n`. After `max_attempts` retries
/// the connection is given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 5,
			base_delay: Duration::from_millis(1000),
		}
	}
}

impl ReconnectPolicy {
	/// Reads `reconnect_attempts` and `reconnect_base_ms` from a feed table.
	pub fn from_config(config: &toml::Value) -> Self {
		let defaults = Self::default();
		Self {
			max_attempts: config
				.get("reconnect_attempts")
				.and_then(|v| v.as_integer())
				.map(|v| v.clamp(0, u32::MAX as i64) as u32)
				.unwrap_or(defaults.max_attempts),
			base_delay: config
				.get("reconnect_base_ms")
				.and_then(|v| v.as_integer())
				.map(|v| Duration::from_millis(v.max(0) as u64))
				.unwrap_or(defaults.base_delay),
		}
	}

	/// Delay before retry `attempt`, or `None` once retries are exhausted.
	pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
		if attempt == 0 || attempt > self.max_attempts {
			return None;
		}
		let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
		Some(self.base_delay.saturating_mul(factor))
	}

	/// Runs `connect` until it succeeds or the retries are used up.
	pub async fn retry<T, F, Fut>(&self, target: &str, mut connect: F) -> Result<T, FeedError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, FeedError>>,
	{
		let mut attempt = 0;
		loop {
			match connect().await {
				Ok(value) => return Ok(value),
				Err(e) => {
					attempt += 1;
					let Some(delay) = self.delay_for(attempt) else {
						return Err(FeedError::Connection(format!(
							"giving up on {} after {} retries: {}",
							target, self.max_attempts, e
						)));
					};
					tracing::warn!(
						target_source = %target,
						attempt,
						delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
						error = %e,
						"Feed source unavailable, retrying"
					);
					tokio::time::sleep(delay).await;
				},
			}
		}
	}
}

/// Reads an optional non-negative millisecond setting from a feed table.
pub(crate) fn millis_setting(config: &toml::Value, key: &str, default: u64) -> Duration {
	Duration::from_millis(
		config
			.get(key)
			.and_then(|v| v.as_integer())
			.map(|v| v.max(0) as u64)
			.unwrap_or(default),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[test]
	fn test_delays_double() {
		let policy = ReconnectPolicy::default();
		let delays: Vec<u64> = (1..=5)
			.map(|n| policy.delay_for(n).unwrap().as_millis() as u64)
			.collect();
		assert_eq!(delays, vec![2000, 4000, 8000, 16000, 32000]);
		assert_eq!(policy.delay_for(0), None);
		assert_eq!(policy.delay_for(6), None);
	}

	#[test]
	fn test_policy_from_config() {
		let config: toml::Value = toml::from_str(
			r#"
			path = "orders.jsonl"
			reconnect_attempts = 2
			reconnect_base_ms = 50
			"#,
		)
		.unwrap();
		let policy = ReconnectPolicy::from_config(&config);
		assert_eq!(policy.max_attempts, 2);
		assert_eq!(policy.delay_for(2), Some(Duration::from_millis(200)));

		let empty = toml::Value::Table(toml::map::Map::new());
		assert_eq!(ReconnectPolicy::from_config(&empty), ReconnectPolicy::default());
	}

	#[tokio::test(start_paused = true)]
	async fn test_retry_succeeds_after_failures() {
		let calls = Arc::new(AtomicU32::new(0));
		let policy = ReconnectPolicy::default();

		let counter = calls.clone();
		let value = policy
			.retry("test", move || {
				let counter = counter.clone();
				async move {
					if counter.fetch_add(1, Ordering::SeqCst) < 2 {
						Err(FeedError::Connection("refused".into()))
					} else {
						Ok(7)
					}
				}
			})
			.await
			.unwrap();

		assert_eq!(value, 7);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_retry_gives_up() {
		let calls = Arc::new(AtomicU32::new(0));
		let policy = ReconnectPolicy {
			max_attempts: 3,
			base_delay: Duration::from_millis(10),
		};

		let counter = calls.clone();
		let result: Result<(), FeedError> = policy
			.retry("test", move || {
				counter.fetch_add(1, Ordering::SeqCst);
				async { Err(FeedError::Connection("refused".into())) }
			})
			.await;

		assert!(matches!(result, Err(FeedError::Connection(_))));
		assert_eq!(calls.load(Ordering::SeqCst), 4);
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<&str> = get_all_implementations().iter().map(|(n, _)| *n).collect();
		assert_eq!(names, vec!["file", "mock"]);
	}
}
