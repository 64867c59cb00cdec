//! Notification sinks for matched log lines.
//!
//! [`Notifier`] is the delivery seam. [`WebhookNotifier`] posts to a
//! Discord-compatible webhook; [`StdoutNotifier`] prints, for offline scans.
//! Delivery is fire-and-forget per message — no retry or queueing; callers
//! log failures and move on to the next line.

use async_trait::async_trait;
use serde::Serialize;

/// Errors returned by notification sinks.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP transport failure.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook endpoint answered with an error status.
    #[error("webhook returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, whitespace-collapsed and truncated.
        body: String,
    },
}

/// Delivery interface for matched-line notifications.
///
/// Implementations must be `Send + Sync`; the watch loop calls them from an
/// async task.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails; the message is not
    /// retried.
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Wire payload for Discord-compatible webhooks.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts each message as JSON `{"content": ...}` to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`, with its own HTTP client.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

// Webhook URLs embed an access token; keep them out of debug output.
impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &"__REDACTED__")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()
            .await?;
        check_response(response).await
    }
}

/// Prints messages to stdout. Used by offline scans and as the second
/// implementation that keeps the [`Notifier`] seam honest.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        println!("{message}");
        Ok(())
    }
}

/// Map a non-success webhook response to [`NotifyError::HttpStatus`].
async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::HttpStatus {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

/// Collapse whitespace and cap the length of an error body for logging.
fn truncate_body(raw: &str) -> String {
    const MAX_BODY_CHARS: usize = 256;

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_BODY_CHARS {
        let shortened = collapsed.chars().take(MAX_BODY_CHARS).collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    collapsed
}
