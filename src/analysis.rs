//! Relevance classification and reply drafting for candidate posts.
//!
//! Both stages fan out one generation call per post, bounded by a counting
//! admission gate. Results are collected positionally, so stage output
//! always preserves the input order regardless of completion order. A
//! single failed call aborts the whole batch; nothing from a failed batch
//! is persisted upstream.

use crate::error::OutreachError;
use crate::llm::TextGenerator;
use crate::reddit::RedditPost;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Classify a generation response as a relevance verdict.
///
/// A post is relevant when the response contains "relevant" but not the
/// negative phrase "not relevant". The negative check must come first in
/// spirit: "not relevant" itself contains "relevant", so a plain substring
/// test alone would classify every negative as positive. Deliberate
/// heuristic, kept for behavioral parity with the prompt contract.
pub fn is_relevant(response: &str) -> bool {
    let lower = response.to_lowercase();
    lower.contains("relevant") && !lower.contains("not relevant")
}

fn relevance_prompt(video_title: &str, video_description: &str, post: &RedditPost) -> String {
    format!(
        "Given the video title '{}' and description '{}', analyze the \
         following Reddit post and determine if the video would be relevant \
         to the discussion.\n\n\
         Post Title: {}\n\
         Post Content: {}\n\n\
         Respond with 'relevant' or 'not relevant'.",
        video_title, video_description, post.title, post.selftext
    )
}

fn engagement_prompt(video_url: &str, video_title: &str, post: &RedditPost) -> String {
    format!(
        "Given the video title '{}' and the following Reddit post, generate \
         a helpful and non-spammy comment that includes a link to the \
         video.\n\n\
         Post Title: {}\n\
         Post Content: {}\n\n\
         Video URL: {}",
        video_title, post.title, post.selftext, video_url
    )
}

/// Filter posts down to the ones where the video is relevant to the
/// discussion.
///
/// All posts are dispatched concurrently, capped at `max_concurrency`
/// in-flight generation calls. The retained list preserves the input's
/// relative order.
pub async fn analyze_posts(
    generator: &dyn TextGenerator,
    posts: &[RedditPost],
    video_title: &str,
    video_description: &str,
    max_concurrency: usize,
) -> Result<Vec<RedditPost>, OutreachError> {
    let gate = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let verdicts = try_join_all(posts.iter().map(|post| {
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| OutreachError::ExternalCall(e.into()))?;
            let prompt = relevance_prompt(video_title, video_description, post);
            let response = generator
                .complete(&prompt, None)
                .await
                .map_err(OutreachError::ExternalCall)?;
            debug!("Relevance verdict for '{}': {}", post.title, response.trim());
            Ok::<bool, OutreachError>(is_relevant(&response))
        }
    }))
    .await?;

    let relevant: Vec<RedditPost> = posts
        .iter()
        .zip(verdicts)
        .filter(|(_, keep)| *keep)
        .map(|(post, _)| post.clone())
        .collect();

    info!("{}/{} posts classified as relevant", relevant.len(), posts.len());
    Ok(relevant)
}

/// Draft one reply per post, positionally aligned with the input.
///
/// For N posts this returns exactly N drafts with draft\[i\] belonging to
/// post\[i\], whatever order the underlying calls complete in.
pub async fn generate_engagement_content(
    generator: &dyn TextGenerator,
    video_url: &str,
    video_title: &str,
    posts: &[RedditPost],
    max_concurrency: usize,
) -> Result<Vec<String>, OutreachError> {
    let gate = Arc::new(Semaphore::new(max_concurrency.max(1)));

    let comments = try_join_all(posts.iter().map(|post| {
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| OutreachError::ExternalCall(e.into()))?;
            let prompt = engagement_prompt(video_url, video_title, post);
            generator
                .complete(&prompt, None)
                .await
                .map_err(OutreachError::ExternalCall)
        }
    }))
    .await?;

    info!("Generated {} engagement comments", comments.len());
    Ok(comments)
}
