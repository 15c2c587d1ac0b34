//! User-visible notifications.

use serde::{Deserialize, Serialize};

use crate::Severity;

/// Title used when a notification is dispatched without one.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "SwiftLogistics";

/// A notification waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
	#[serde(default)]
	pub title: Option<String>,
	pub message: String,
	#[serde(default)]
	pub severity: Severity,
	#[serde(default = "default_auto_expire")]
	pub auto_expire: bool,
}

fn default_auto_expire() -> bool {
	true
}

impl NotificationDraft {
	/// Auto-expiring draft with the default title.
	pub fn new(message: impl Into<String>, severity: Severity) -> Self {
		Self {
			title: None,
			message: message.into(),
			severity,
			auto_expire: true,
		}
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Keeps the notification until it is dismissed.
	pub fn sticky(mut self) -> Self {
		self.auto_expire = false;
		self
	}
}

/// A dispatched notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	/// Monotonic identifier, increasing in creation order.
	pub id: u64,
	pub title: String,
	pub message: String,
	pub severity: Severity,
	pub auto_expire: bool,
	/// Creation time in milliseconds since the UNIX epoch.
	pub created_at: u64,
}
