//! Video metadata extraction from the watch page's Open Graph tags.

use crate::error::OutreachError;
use anyhow::Result;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

pub const TITLE_PLACEHOLDER: &str = "Title not available";
pub const DESCRIPTION_PLACEHOLDER: &str = "Description not available";

/// The subject being promoted
#[derive(Debug, Clone)]
pub struct VideoDetails {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// Fetch a video page and extract its title and description.
///
/// Pages without usable metadata yield the placeholder strings, which
/// downstream stages treat as valid input rather than an error.
pub async fn extract_video_details(
    video_url: &str,
    timeout_seconds: u64,
) -> Result<VideoDetails, OutreachError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent("Mozilla/5.0 (compatible; video-outreach/0.1)")
        .build()
        .map_err(|e| OutreachError::ExternalCall(e.into()))?;

    debug!("Fetching video page: {}", video_url);

    let html = fetch_page(&client, video_url)
        .await
        .map_err(OutreachError::ExternalCall)?;

    let (title, description) = parse_metadata(&html);

    if title.is_none() {
        warn!("No title metadata found for {}", video_url);
    }

    Ok(VideoDetails {
        url: video_url.to_string(),
        title: title.unwrap_or_else(|| TITLE_PLACEHOLDER.to_string()),
        description: description.unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string()),
    })
}

async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "video page request failed with status {}",
            response.status()
        ));
    }

    Ok(response.text().await?)
}

/// Pull title and description out of the page HTML.
///
/// Prefers `og:title`/`og:description` meta tags, falling back to the
/// document `<title>` element. Parsing happens synchronously so the
/// non-Send DOM never crosses an await point.
fn parse_metadata(html: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);

    let title = select_meta_content(&document, "og:title")
        .or_else(|| select_title_element(&document));
    let description = select_meta_content(&document, "og:description");

    (title, description)
}

fn select_meta_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_title_element(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
