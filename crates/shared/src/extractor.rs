use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

use crate::error::{Error, Result};

/// Container holding the body of a changelog post.
pub const CONTENT_SELECTOR: &str = ".post__content";

/// Fetches a page body as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; ChangelogNotifier/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let fetch_err = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP error: {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| fetch_err(format!("failed to read response body: {e}")))
    }
}

/// Paragraph text of the first content container, separated by blank lines.
///
/// Returns an empty string when the page has no container or no paragraphs.
pub fn extract_relevant_text(html: &str) -> String {
    let (Ok(container_sel), Ok(paragraph_sel)) =
        (Selector::parse(CONTENT_SELECTOR), Selector::parse("p"))
    else {
        return String::new();
    };

    let document = Html::parse_document(html);
    let Some(container) = document.select(&container_sel).next() else {
        return String::new();
    };

    let mut extracted = String::new();
    for paragraph in container.select(&paragraph_sel) {
        let text: String = paragraph.text().collect();
        extracted.push_str(text.trim());
        extracted.push_str("\n\n");
    }

    extracted.trim().to_string()
}
