//! Stage orchestration: keywords, community discovery, post search,
//! relevance classification, and comment generation.
//!
//! Stages run strictly in sequence; the relevance and generation stages
//! fan out internally under the admission gate. Each cacheable stage is
//! wrapped by the content store keyed by the video's fingerprint, so
//! re-running the pipeline for the same video short-circuits completed
//! stages.

use crate::analysis::{analyze_posts, generate_engagement_content};
use crate::cache::{fingerprint, ContentStore};
use crate::config::PipelineConfig;
use crate::error::OutreachError;
use crate::keywords::{filter_subreddits, suggest_keywords, KeywordSuggestion};
use crate::llm::TextGenerator;
use crate::reddit::{RedditPost, ThreadSearch};
use crate::video::VideoDetails;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Terminal state of a pipeline run.
///
/// The empty-result variants are recognized halts, not errors: the run
/// stopped because there was nothing left to do.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No keywords could be extracted from the video metadata
    NoKeywords,
    /// Search returned no posts, or none survived the pre-filter
    NoPosts,
    /// No post was classified as relevant
    NoRelevantPosts,
    /// Drafts were generated for every relevant post
    Completed {
        subreddits: Vec<String>,
        posts: Vec<RedditPost>,
        comments: Vec<String>,
    },
}

pub struct OutreachPipeline {
    config: PipelineConfig,
    generator: Box<dyn TextGenerator>,
    search: Box<dyn ThreadSearch>,
    store: ContentStore,
}

impl OutreachPipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Box<dyn TextGenerator>,
        search: Box<dyn ThreadSearch>,
        store: ContentStore,
    ) -> Self {
        Self {
            config,
            generator,
            search,
            store,
        }
    }

    /// Run the full pipeline for one video.
    pub async fn run(&self, video: &VideoDetails) -> Result<PipelineOutcome, OutreachError> {
        let fp = fingerprint(&video.url);
        info!("Running outreach pipeline for {} ({})", video.url, fp);

        let suggestion: KeywordSuggestion = self
            .store
            .get_or_compute(&fp, "keywords", move || async move {
                suggest_keywords(self.generator.as_ref(), &video.title, &video.description).await
            })
            .await?;

        if suggestion.keywords.is_empty() {
            return Ok(PipelineOutcome::NoKeywords);
        }
        info!("Suggested keywords: {}", suggestion.keywords.join(", "));

        // Community discovery is reported alongside the drafts; an empty
        // list does not halt the run.
        let suggestion_ref = &suggestion;
        let subreddits: Vec<String> = self
            .store
            .get_or_compute(&fp, "subreddits", move || async move {
                self.discover_subreddits(video, suggestion_ref).await
            })
            .await?;

        if !subreddits.is_empty() {
            info!("Suggested subreddits: {}", subreddits.join(", "));
        }

        let keywords = &suggestion.keywords;
        let posts: Vec<RedditPost> = self
            .store
            .get_or_compute(&fp, "posts", move || async move {
                self.search_all_keywords(keywords).await
            })
            .await?;

        if posts.is_empty() {
            return Ok(PipelineOutcome::NoPosts);
        }
        info!("Found {} candidate posts", posts.len());

        // Cost-control gate: skip crowded or stale threads before spending
        // generation calls on them.
        let candidates = self.prefilter_posts(posts);
        if candidates.is_empty() {
            return Ok(PipelineOutcome::NoPosts);
        }
        info!("{} posts remain after pre-filter", candidates.len());

        let candidates_ref = &candidates;
        let relevant: Vec<RedditPost> = self
            .store
            .get_or_compute(&fp, "relevant_posts", move || async move {
                analyze_posts(
                    self.generator.as_ref(),
                    candidates_ref,
                    &video.title,
                    &video.description,
                    self.config.max_concurrency,
                )
                .await
            })
            .await?;

        if relevant.is_empty() {
            return Ok(PipelineOutcome::NoRelevantPosts);
        }

        let relevant_ref = &relevant;
        let comments: Vec<String> = self
            .store
            .get_or_compute(&fp, "comments", move || async move {
                generate_engagement_content(
                    self.generator.as_ref(),
                    &video.url,
                    &video.title,
                    relevant_ref,
                    self.config.max_concurrency,
                )
                .await
            })
            .await?;

        Ok(PipelineOutcome::Completed {
            subreddits,
            posts: relevant,
            comments,
        })
    }

    /// Search posts for every keyword, concatenating results.
    ///
    /// Duplicates across keywords are possible and acceptable; the
    /// relevance stage judges each occurrence on its own.
    async fn search_all_keywords(
        &self,
        keywords: &[String],
    ) -> Result<Vec<RedditPost>, OutreachError> {
        let mut posts = Vec::new();
        for keyword in keywords {
            let found = self
                .search
                .search_posts(keyword, self.config.search_limit)
                .await
                .map_err(OutreachError::ExternalCall)?;
            debug!("Keyword '{}' matched {} posts", keyword, found.len());
            posts.extend(found);
        }
        Ok(posts)
    }

    /// Union LLM-suggested communities with per-keyword search results,
    /// then keep only the ones the LLM judges on-topic.
    async fn discover_subreddits(
        &self,
        video: &VideoDetails,
        suggestion: &KeywordSuggestion,
    ) -> Result<Vec<String>, OutreachError> {
        let mut names = suggestion.subreddits.clone();
        for keyword in &suggestion.keywords {
            let found = self
                .search
                .search_subreddits(keyword, self.config.subreddit_search_limit)
                .await
                .map_err(OutreachError::ExternalCall)?;
            names.extend(found);
        }

        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.to_lowercase()));

        filter_subreddits(
            self.generator.as_ref(),
            &video.title,
            &video.description,
            &names,
        )
        .await
    }

    /// Keep posts small enough and recent enough to be worth engaging:
    /// comment count within the threshold (inclusive) and created inside
    /// the recency window.
    fn prefilter_posts(&self, posts: Vec<RedditPost>) -> Vec<RedditPost> {
        let cutoff = Utc::now() - Duration::days(self.config.max_age_days);
        posts
            .into_iter()
            .filter(|post| post.num_comments <= self.config.max_comments)
            .filter(|post| post.created_utc >= cutoff)
            .collect()
    }
}
