//! Notifier port - Interface to the downstream system receiving republished content.

use async_trait::async_trait;

use crate::domain::content::Content;

/// Errors returned by the notifier.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifierError {
    #[error("Notifier responded with status {status}")]
    Status { status: u16 },

    #[error("Notifier request failed: {0}")]
    Transport(String),

    #[error("Notifier request timed out")]
    Timeout,

    #[error("Notifier request could not be built: {0}")]
    InvalidRequest(String),
}

impl NotifierError {
    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NotifierError::Status { status } => *status >= 500,
            NotifierError::Transport(_) | NotifierError::Timeout => true,
            NotifierError::InvalidRequest(_) => false,
        }
    }
}

/// Port for notifying the downstream system.
///
/// Implementations must be safe to call concurrently from every cycle and
/// enforce their own request deadline.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one document.
    ///
    /// * `origin` - logical publisher identity (`X-Origin-System-Id`)
    /// * `tid` - transaction id (`X-Request-Id`)
    /// * `content` - body and `Content-Type`
    /// * `hash` - content digest (`X-Native-Hash`) used for dedupe
    async fn notify(
        &self,
        origin: &str,
        tid: &str,
        content: &Content,
        hash: &str,
    ) -> Result<(), NotifierError>;

    /// Good-to-go probe.
    async fn gtg(&self) -> Result<(), NotifierError>;
}
