//! Video Outreach
//!
//! Finds online discussion threads where a video is relevant and drafts a
//! contextual reply for each. Stage results are memoized on disk keyed by
//! a fingerprint of the video URL, so repeated runs against the same video
//! are cheap and issue no new generation calls.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod keywords;
pub mod llm;
pub mod pipeline;
pub mod reddit;
pub mod video;

// Re-export main types for easy access
pub use crate::analysis::{analyze_posts, generate_engagement_content};
pub use crate::cache::{fingerprint, ContentStore};
pub use crate::config::{Config, ConfigBuilder, PipelineConfig};
pub use crate::error::OutreachError;
pub use crate::export::save_posts_to_csv;
pub use crate::keywords::{suggest_keywords, KeywordSuggestion};
pub use crate::llm::{create_generator, GeneratorProvider, LLMConfig, TextGenerator};
pub use crate::pipeline::{OutreachPipeline, PipelineOutcome};
pub use crate::reddit::{RedditClient, RedditCredentials, RedditPost, ThreadSearch};
pub use crate::video::{extract_video_details, VideoDetails};
