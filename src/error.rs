use thiserror::Error;

/// Error kinds surfaced by the outreach pipeline.
///
/// Empty-result halts (no keywords, no posts, no relevant posts) are not
/// errors. They are reported through `PipelineOutcome` instead.
#[derive(Debug, Error)]
pub enum OutreachError {
    /// Required credentials or settings are missing. Raised before any
    /// pipeline stage runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A generation response could not be interpreted as the expected
    /// structured payload.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// A metadata, search, or generation call failed. Aborts the current
    /// stage's batch.
    #[error("external call failed: {0}")]
    ExternalCall(#[source] anyhow::Error),

    /// The content store could not read or write a cache artifact.
    #[error("cache error: {0}")]
    Cache(#[source] anyhow::Error),

    /// Filesystem failure outside the cache, such as writing the export.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
