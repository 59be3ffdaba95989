use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

/// A page-fetching session shared by all collectors during one discovery call.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` and return the page markup.
    async fn navigate(&self, url: &str) -> Result<String, AppError>;

    /// Release the session. Further navigation fails.
    async fn close(&self);
}

/// Opens a fresh session for each discovery call.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, AppError>;
}

/// Launches plain HTTP sessions with browser-like headers. No JavaScript rendering,
/// so sites that build their listings client-side come back empty.
pub struct HttpBrowser {
    user_agent: String,
    page_timeout: Duration,
}

impl HttpBrowser {
    pub fn new(user_agent: impl Into<String>, page_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            page_timeout,
        }
    }
}

#[async_trait]
impl BrowserLauncher for HttpBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.page_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!("Browser session opened");
        Ok(Box::new(HttpSession {
            client,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct HttpSession {
    client: reqwest::Client,
    closed: AtomicBool,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&self, url: &str) -> Result<String, AppError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::Internal("Browser session already closed".to_string()));
        }

        let resp = self
            .client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        if resp.status().as_u16() == 429 {
            return Err(AppError::Internal("429 Too Many Requests".to_string()));
        }

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!("{url} returned {}", resp.status())));
        }

        Ok(resp.text().await?)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Browser session closed");
        }
    }
}
