//! JSON-lines replay feed.
//!
//! Reads one `FeedMessage` per line from a file and forwards the converted
//! events, optionally pausing `interval_ms` between messages. Blank lines and
//! lines starting with `#` are skipped. A malformed line is logged and skipped
//! without stopping the replay. If the file cannot be opened, opening is
//! retried with the configured `ReconnectPolicy`.

use crate::{millis_setting, FeedError, FeedInterface, ReconnectPolicy};
use async_trait::async_trait;
use courier_types::{
	ConfigSchema, FeedMessage, Field, FieldType, ImplementationRegistry, OrderEvent, Schema,
	ValidationError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::instrument;

/// Feed that replays a recorded JSON-lines file.
pub struct FileFeed {
	path: PathBuf,
	interval: Duration,
	reconnect: ReconnectPolicy,
	shutdown_signal: Arc<Mutex<Option<mpsc::Sender<()>>>>,
}

impl FileFeed {
	pub fn new(path: impl Into<PathBuf>, interval: Duration, reconnect: ReconnectPolicy) -> Self {
		Self {
			path: path.into(),
			interval,
			reconnect,
			shutdown_signal: Arc::new(Mutex::new(None)),
		}
	}

	async fn open(path: &PathBuf, reconnect: &ReconnectPolicy) -> Result<File, FeedError> {
		let target = path.display().to_string();
		reconnect
			.retry(&target, || async move {
				File::open(path).await.map_err(|e| FeedError::Connection(e.to_string()))
			})
			.await
	}

	/// Parses one line, or `None` for blank and comment lines.
	fn parse_line(line: &str) -> Option<Result<OrderEvent, FeedError>> {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			return None;
		}
		Some(
			FeedMessage::parse(line)
				.map(|message| {
					tracing::debug!(kind = message.kind(), "Received feed message");
					OrderEvent::from(message)
				})
				.map_err(|e| FeedError::Parse(e.to_string())),
		)
	}

	#[instrument(skip_all, fields(path = %path.display()))]
	async fn replay(
		path: PathBuf,
		interval: Duration,
		reconnect: ReconnectPolicy,
		sender: mpsc::UnboundedSender<OrderEvent>,
		mut shutdown_rx: mpsc::Receiver<()>,
	) -> Result<usize, FeedError> {
		let file = tokio::select! {
			file = Self::open(&path, &reconnect) => file?,
			_ = shutdown_rx.recv() => return Ok(0),
		};
		let mut lines = BufReader::new(file).lines();
		let mut forwarded = 0;
		let mut line_number = 0;

		loop {
			let line = tokio::select! {
				line = lines.next_line() => line.map_err(|e| FeedError::Connection(e.to_string()))?,
				_ = shutdown_rx.recv() => break,
			};
			let Some(line) = line else {
				break;
			};
			line_number += 1;

			let event = match Self::parse_line(&line) {
				None => continue,
				Some(Ok(event)) => event,
				Some(Err(e)) => {
					tracing::warn!(line = line_number, error = %e, "Skipping malformed feed message");
					continue;
				},
			};

			if forwarded > 0 && !interval.is_zero() {
				tokio::select! {
					_ = tokio::time::sleep(interval) => {},
					_ = shutdown_rx.recv() => break,
				}
			}

			if sender.send(event).is_err() {
				tracing::debug!("Receiver dropped, stopping replay");
				break;
			}
			forwarded += 1;
		}

		Ok(forwarded)
	}
}

/// Configuration schema for the file feed.
pub struct FileFeedSchema;

impl ConfigSchema for FileFeedSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.trim().is_empty() => Ok(()),
					_ => Err("path must not be empty".to_string()),
				}
			})],
			vec![
				Field::new(
					"interval_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(3_600_000),
					},
				),
				Field::new(
					"reconnect_attempts",
					FieldType::Integer {
						min: Some(0),
						max: Some(20),
					},
				),
				Field::new(
					"reconnect_base_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(60_000),
					},
				),
			],
		)
		.strict();

		schema.validate(config)
	}
}

#[async_trait]
impl FeedInterface for FileFeed {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileFeedSchema)
	}

	async fn start(&self, sender: mpsc::UnboundedSender<OrderEvent>) -> Result<(), FeedError> {
		let mut signal = self.shutdown_signal.lock().await;
		if signal.as_ref().is_some_and(|tx| !tx.is_closed()) {
			return Err(FeedError::AlreadyRunning);
		}

		let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
		*signal = Some(shutdown_tx);

		let path = self.path.clone();
		let interval = self.interval;
		let reconnect = self.reconnect;
		tokio::spawn(async move {
			match Self::replay(path, interval, reconnect, sender, shutdown_rx).await {
				Ok(forwarded) => tracing::info!(forwarded, "File feed finished"),
				Err(e) => tracing::error!(error = %e, "File feed failed"),
			}
		});

		Ok(())
	}

	async fn stop(&self) -> Result<(), FeedError> {
		if let Some(shutdown_tx) = self.shutdown_signal.lock().await.take() {
			let _ = shutdown_tx.send(()).await;
		}
		Ok(())
	}
}

/// Builds a file feed from its configuration table.
///
/// ```toml
/// [feed.implementations.file]
/// path = "orders.jsonl"     # required
/// interval_ms = 500         # optional, defaults to 0
/// reconnect_attempts = 5    # optional, defaults to 5
/// reconnect_base_ms = 1000  # optional, defaults to 1000
/// ```
pub fn create_feed(config: &toml::Value) -> Result<Box<dyn FeedInterface>, FeedError> {
	FileFeedSchema
		.validate(config)
		.map_err(|e| FeedError::Configuration(format!("file feed: {}", e)))?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| FeedError::Configuration("path is required".to_string()))?;

	Ok(Box::new(FileFeed::new(
		path,
		millis_setting(config, "interval_ms", 0),
		ReconnectPolicy::from_config(config),
	)))
}

/// Registry for the file feed.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::FeedFactory;

	fn factory() -> Self::Factory {
		create_feed
	}
}

impl crate::FeedRegistry for Registry {}
