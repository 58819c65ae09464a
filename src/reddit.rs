//! Reddit search provider: app-only auth, post and subreddit search.

use crate::error::OutreachError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// A discussion thread retrieved from search, candidate for engagement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub num_comments: u32,
    pub created_utc: DateTime<Utc>,
}

/// Abstract thread search capability, substitutable with a test double
#[async_trait]
pub trait ThreadSearch: Send + Sync {
    async fn search_posts(&self, keyword: &str, limit: u32) -> Result<Vec<RedditPost>>;
    async fn search_subreddits(&self, keyword: &str, limit: u32) -> Result<Vec<String>>;
}

/// Reddit API credentials, loaded from the environment
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, OutreachError> {
        let client_id = std::env::var("REDDIT_CLIENT_ID").unwrap_or_default();
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET").unwrap_or_default();
        let user_agent = std::env::var("REDDIT_USER_AGENT").unwrap_or_default();

        if client_id.is_empty() || client_secret.is_empty() || user_agent.is_empty() {
            return Err(OutreachError::Configuration(
                "missing one or more environment variables (REDDIT_CLIENT_ID, \
                 REDDIT_CLIENT_SECRET, REDDIT_USER_AGENT)"
                    .to_string(),
            ));
        }

        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    children: Vec<Child<T>>,
}

#[derive(Debug, Deserialize)]
struct Child<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    num_comments: u32,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
}

fn post_from_data(data: PostData) -> RedditPost {
    let created_utc =
        DateTime::from_timestamp(data.created_utc as i64, 0).unwrap_or(DateTime::UNIX_EPOCH);

    RedditPost {
        id: data.id,
        title: data.title,
        selftext: data.selftext,
        url: format!("https://www.reddit.com{}", data.permalink),
        num_comments: data.num_comments,
        created_utc,
    }
}

/// Thin client over the Reddit search API
pub struct RedditClient {
    client: reqwest::Client,
    token: String,
}

impl RedditClient {
    /// Build a client and obtain an application-only access token.
    pub async fn connect(
        credentials: &RedditCredentials,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        debug!("Requesting app-only Reddit access token");

        let response = client
            .post(TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Reddit token request failed {}: {}", status, text));
        }

        let token: TokenResponse = response.json().await?;
        info!("Reddit client authenticated");

        Ok(Self {
            client,
            token: token.access_token,
        })
    }

    async fn get_listing<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Listing<T>> {
        let response = self
            .client
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Reddit API error {}: {}", status, text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ThreadSearch for RedditClient {
    async fn search_posts(&self, keyword: &str, limit: u32) -> Result<Vec<RedditPost>> {
        debug!("Searching posts for keyword '{}'", keyword);

        let listing: Listing<PostData> = self
            .get_listing(
                "/search",
                &[
                    ("q", keyword.to_string()),
                    ("limit", limit.to_string()),
                    ("sort", "relevance".to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| post_from_data(child.data))
            .collect())
    }

    async fn search_subreddits(&self, keyword: &str, limit: u32) -> Result<Vec<String>> {
        debug!("Searching subreddits for keyword '{}'", keyword);

        let listing: Listing<SubredditData> = self
            .get_listing(
                "/subreddits/search",
                &[
                    ("q", keyword.to_string()),
                    ("limit", limit.to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.display_name)
            .collect())
    }
}
