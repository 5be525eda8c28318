//! Health check adapters
//!
//! - **HttpGtgCheck** - GETs a service's `/__gtg` endpoint
//! - **NotifierGtgCheck** - Delegates to the notifier's own probe

mod http_gtg_check;

pub use http_gtg_check::{HttpGtgCheck, NotifierGtgCheck};
