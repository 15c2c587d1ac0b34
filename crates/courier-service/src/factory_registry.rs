//! Feed factories and feed construction from configuration.

use courier_config::Config;
use courier_feed::{FeedFactory, FeedInterface, FeedService};
use std::collections::HashMap;

use crate::portal::ServiceError;

/// Factories of every built-in feed, keyed by configuration name.
pub fn feed_factories() -> HashMap<String, FeedFactory> {
	courier_feed::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

/// Builds the configured feeds.
///
/// A feed that is unknown, fails to build, or rejects its configuration is
/// skipped with an error log. At least one feed must remain.
pub fn build_feeds(
	config: &Config,
	factories: &HashMap<String, FeedFactory>,
) -> Result<FeedService, ServiceError> {
	let mut names: Vec<&String> = config.feed.implementations.keys().collect();
	names.sort();

	let mut feeds: Vec<(String, Box<dyn FeedInterface>)> = Vec::new();
	for name in names {
		let table = &config.feed.implementations[name];
		let Some(factory) = factories.get(name) else {
			tracing::error!(component = "feed", implementation = %name, "Unknown feed implementation, skipping");
			continue;
		};

		match factory(table) {
			Ok(feed) => match feed.config_schema().validate(table) {
				Ok(()) => {
					tracing::info!(component = "feed", implementation = %name, "Loaded");
					feeds.push((name.clone(), feed));
				},
				Err(e) => {
					tracing::error!(
						component = "feed",
						implementation = %name,
						error = %e,
						"Invalid configuration for feed, skipping"
					);
				},
			},
			Err(e) => {
				tracing::error!(
					component = "feed",
					implementation = %name,
					error = %e,
					"Failed to create feed, skipping"
				);
			},
		}
	}

	if feeds.is_empty() {
		return Err(ServiceError::NoFeeds);
	}
	Ok(FeedService::new(feeds))
}
