use crate::error::OutreachError;
use crate::llm::{GeneratorProvider, LLMConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the video outreach tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Text generation settings
    pub llm: LLMConfig,

    /// Reddit API settings (credentials come from the environment)
    pub reddit: RedditConfig,

    /// Pipeline stage settings
    pub pipeline: PipelineConfig,

    /// Durable cache settings
    pub cache: CacheConfig,

    /// Export settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum simultaneous in-flight generation calls per stage
    pub max_concurrency: usize,

    /// Posts with more comments than this are skipped before relevance
    /// classification (inclusive upper bound)
    pub max_comments: u32,

    /// Posts older than this many days are skipped
    pub max_age_days: i64,

    /// Maximum posts fetched per keyword
    pub search_limit: u32,

    /// Maximum subreddits fetched per keyword
    pub subreddit_search_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            max_comments: 10,
            max_age_days: 90,
            search_limit: 100,
            subreddit_search_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root directory
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for exported CSV files
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            reddit: RedditConfig {
                request_timeout_seconds: 30,
            },
            pipeline: PipelineConfig::default(),
            cache: CacheConfig {
                cache_dir: PathBuf::from("cache"),
            },
            output: OutputConfig {
                output_dir: PathBuf::from("output"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to environment overrides
    /// on defaults.
    pub fn load() -> Self {
        let config_paths = [
            "video-outreach.toml",
            "config/video-outreach.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        return config.with_env_overrides();
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::default().with_env_overrides()
    }

    /// Overlay environment variables onto the configuration
    fn with_env_overrides(mut self) -> Self {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }

        if let Ok(concurrency) = std::env::var("VIDEO_OUTREACH_CONCURRENCY") {
            if let Ok(value) = concurrency.parse() {
                self.pipeline.max_concurrency = value;
            }
        }

        if let Ok(cache_dir) = std::env::var("VIDEO_OUTREACH_CACHE_DIR") {
            self.cache.cache_dir = PathBuf::from(cache_dir);
        }

        if let Ok(output_dir) = std::env::var("VIDEO_OUTREACH_OUTPUT_DIR") {
            self.output.output_dir = PathBuf::from(output_dir);
        }

        self
    }

    /// Validate configuration before the pipeline runs
    pub fn validate(&self) -> Result<(), OutreachError> {
        if self.pipeline.max_concurrency == 0 {
            return Err(OutreachError::Configuration(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        match self.llm.provider {
            GeneratorProvider::OpenAI => {
                if self.llm.api_key.is_none() {
                    return Err(OutreachError::Configuration(
                        "OPENAI_API_KEY is required for the OpenAI provider".to_string(),
                    ));
                }
            }
            GeneratorProvider::LMStudio => {
                if self.llm.endpoint.is_none() {
                    return Err(OutreachError::Configuration(
                        "endpoint is required for the LMStudio provider".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.pipeline.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_comments(mut self, max_comments: u32) -> Self {
        self.config.pipeline.max_comments = max_comments;
        self
    }

    pub fn with_max_age_days(mut self, max_age_days: i64) -> Self {
        self.config.pipeline.max_age_days = max_age_days;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.config.cache.cache_dir = cache_dir;
        self
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.config.output.output_dir = output_dir;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
