//! Main entry point for the courier portal host.
//!
//! Loads the configuration, starts the configured order feeds and keeps a
//! portal session up to date until the feeds finish or the process is
//! interrupted.

use clap::Parser;
use courier_config::Config;
use std::path::PathBuf;

mod factory_registry;
mod portal;

use portal::{Portal, ServiceError};

/// Command-line arguments for the portal host.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started courier portal");

	let config = Config::from_file(&args.config)
		.await
		.map_err(ServiceError::Config)?;
	tracing::info!(
		portal = %config.portal.id,
		feeds = config.feed.implementations.len(),
		"Loaded configuration"
	);

	let feeds = factory_registry::build_feeds(&config, &factory_registry::feed_factories())?;
	let portal = Portal::new(&config, feeds);

	let session = portal
		.run(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for Ctrl-C");
				std::future::pending::<()>().await;
			}
		})
		.await?;

	let stats = session.stats();
	tracing::info!(
		total = stats.total,
		active = stats.active,
		delivered = stats.delivered,
		failed = stats.failed,
		"Stopped courier portal"
	);
	Ok(())
}
