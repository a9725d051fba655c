use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::extractor::{extract_relevant_text, PageFetcher};
use crate::llm::LanguageModel;

pub const SYSTEM_PROMPT: &str = "You are a helpful Shopify Support assistant.";
pub const MAX_SUMMARY_TOKENS: u32 = 200;

/// Summarizes changelog detail pages with a language model.
pub struct Summarizer {
    fetcher: Arc<dyn PageFetcher>,
    model: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(fetcher: Arc<dyn PageFetcher>, model: Arc<dyn LanguageModel>) -> Self {
        Self { fetcher, model }
    }

    /// Summary of the page at `url`, or `None` if any step fails.
    pub async fn summarize(&self, url: &str) -> Option<String> {
        match self.try_summarize(url).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Error summarizing {}: {}", url, e);
                None
            }
        }
    }

    pub async fn try_summarize(&self, url: &str) -> Result<String> {
        let html = self.fetcher.fetch(url).await?;
        let text = extract_relevant_text(&html);
        debug!("Extracted {} chars from {}", text.len(), url);

        let prompt = format!(
            "Summarize this for me: {}. If there're any Learn More link - please include it as well at the end",
            text
        );

        let completion = self
            .model
            .complete(SYSTEM_PROMPT, &prompt, MAX_SUMMARY_TOKENS)
            .await?;

        Ok(clean_response(completion.trim()).trim().to_string())
    }
}

/// Strip bracketed placeholders such as `[Learn more about text lists]`.
pub fn clean_response(text: &str) -> String {
    static BRACKETED: OnceLock<Regex> = OnceLock::new();
    let re = BRACKETED.get_or_init(|| Regex::new(r"\[.*?\]").expect("valid regex"));
    re.replace_all(text, "").into_owned()
}
