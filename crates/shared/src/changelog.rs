use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::extractor::{PageFetcher, CONTENT_SELECTOR};
use crate::models::{ChangelogEntry, NotificationMessage, PolledUpdate};
use crate::summarizer::Summarizer;

/// Description used when the language model gives us nothing.
pub const NO_SUMMARY_FALLBACK: &str = "No OpenAi overview";

const POST_SELECTOR: &str = ".changelog-post";
const DATE_SELECTOR: &str = ".post-block__date span";
const LINK_SELECTOR: &str = ".post-block__link";
const TAG_SELECTOR: &str = ".status-tag.feature";
const TAG_MINOR_SELECTOR: &str = ".status-tag.feature + .text-minor";

const DATE_FORMATS: [&str; 4] = ["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d", "%d %B %Y"];

struct PostSelectors {
    post: Selector,
    date: Selector,
    link: Selector,
    content: Selector,
    tag: Selector,
    tag_minor: Selector,
}

impl PostSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            post: selector(POST_SELECTOR)?,
            date: selector(DATE_SELECTOR)?,
            link: selector(LINK_SELECTOR)?,
            content: selector(CONTENT_SELECTOR)?,
            tag: selector(TAG_SELECTOR)?,
            tag_minor: selector(TAG_MINOR_SELECTOR)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("bad selector {css:?}: {e}")))
}

/// Concatenated text of every match under `post`, trimmed. Empty if nothing matches.
fn select_text(post: ElementRef<'_>, sel: &Selector) -> String {
    post.select(sel)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date.trim(), fmt).ok())
}

/// Resolve a possibly relative link against the site origin.
///
/// Only `http`/`https` URLs count as absolute; anything else is treated as a
/// path on the changelog site.
pub fn absolute_link(link: &str, base_origin: &str) -> String {
    let is_web_url = Url::parse(link)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if is_web_url {
        return link.to_string();
    }

    let base = base_origin.trim_end_matches('/');
    if link.starts_with('/') || link.is_empty() {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}

/// Origin (`scheme://host[:port]`) of the changelog index URL.
pub fn base_origin(index_url: &str) -> anyhow::Result<String> {
    let url = Url::parse(index_url)
        .map_err(|e| anyhow::anyhow!("Invalid changelog URL {}: {}", index_url, e))?;
    let origin = url.origin();
    if !origin.is_tuple() {
        anyhow::bail!("Changelog URL {} has no usable origin", index_url);
    }
    Ok(origin.ascii_serialization())
}

/// Parse the newest entry out of the changelog index markup.
///
/// The site lists posts newest first, so the first post wins. When every
/// post carries a parseable date the latest date wins instead, with ties
/// going to the earlier post.
pub fn parse_latest_entry(html: &str, base_origin: &str) -> Result<ChangelogEntry> {
    let selectors = PostSelectors::new()?;
    let document = Html::parse_document(html);
    let posts: Vec<ElementRef<'_>> = document.select(&selectors.post).collect();

    let Some(first) = posts.first().copied() else {
        return Err(Error::Parse(format!("no {POST_SELECTOR} element found")));
    };

    let dated: Option<Vec<(NaiveDate, ElementRef<'_>)>> = posts
        .iter()
        .map(|post| parse_date(&select_text(*post, &selectors.date)).map(|d| (d, *post)))
        .collect();

    let latest = match dated {
        Some(dated) if dated.len() > 1 => dated
            .iter()
            .fold(None::<(NaiveDate, ElementRef<'_>)>, |best, &(date, post)| match best {
                Some((best_date, _)) if best_date >= date => best,
                _ => Some((date, post)),
            })
            .map(|(_, post)| post)
            .unwrap_or(first),
        _ => first,
    };

    Ok(entry_from_post(latest, &selectors, base_origin))
}

fn entry_from_post(post: ElementRef<'_>, sel: &PostSelectors, base_origin: &str) -> ChangelogEntry {
    let date = select_text(post, &sel.date);
    let title = select_text(post, &sel.link);
    let description = select_text(post, &sel.content);
    let kind = format!(
        "{} {}",
        select_text(post, &sel.tag),
        select_text(post, &sel.tag_minor)
    );

    let href = post
        .select(&sel.link)
        .next()
        .and_then(|el| el.value().attr("href"))
        .unwrap_or_default();

    ChangelogEntry::new(
        date,
        title,
        description,
        kind,
        absolute_link(href, base_origin),
    )
}

/// Scrapes the changelog index and prepares a notification for its newest entry.
pub struct ChangelogPoller {
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Summarizer,
    index_url: String,
    base_origin: String,
}

impl ChangelogPoller {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Summarizer,
        index_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let index_url = index_url.into();
        let base_origin = base_origin(&index_url)?;

        Ok(Self {
            fetcher,
            summarizer,
            index_url,
            base_origin,
        })
    }

    pub async fn poll_latest(&self) -> Option<PolledUpdate> {
        match self.try_poll_latest().await {
            Ok(update) => Some(update),
            Err(e) => {
                warn!("Error fetching changelog: {}", e);
                None
            }
        }
    }

    pub async fn try_poll_latest(&self) -> Result<PolledUpdate> {
        let html = self.fetcher.fetch(&self.index_url).await?;
        let entry = parse_latest_entry(&html, &self.base_origin)?;
        info!(title = %entry.title, date = %entry.date, "Latest changelog entry");

        let summary = self
            .summarizer
            .summarize(&entry.link)
            .await
            .unwrap_or_else(|| NO_SUMMARY_FALLBACK.to_string());

        let message = NotificationMessage::compose(&entry, &summary);
        Ok(PolledUpdate { entry, message })
    }
}
