//! Notifier adapters
//!
//! - **HttpNotifier** - Posts content to the downstream notifier service

mod http_notifier;

pub use http_notifier::{HttpNotifier, HttpNotifierConfig};
