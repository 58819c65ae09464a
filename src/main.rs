use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{info, warn};

use video_outreach::cache::{fingerprint, ContentStore};
use video_outreach::config::Config;
use video_outreach::export::save_posts_to_csv;
use video_outreach::llm::create_generator;
use video_outreach::pipeline::{OutreachPipeline, PipelineOutcome};
use video_outreach::reddit::{RedditClient, RedditCredentials};
use video_outreach::video::extract_video_details;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("video-outreach")
        .version("0.1.0")
        .about("Finds relevant discussion threads for a video and drafts outreach replies")
        .arg(
            Arg::new("video-url")
                .value_name("URL")
                .help("URL of the video to promote")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for the exported CSV"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .help("Directory for cached stage results"),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("NUM")
                .help("Maximum simultaneous generation calls per stage"),
        )
        .arg(
            Arg::new("refresh")
                .long("refresh")
                .help("Discard cached results for this video before running")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(if verbose {
            "video_outreach=debug,info"
        } else {
            "video_outreach=info,warn"
        })
        .init();

    let video_url = matches
        .get_one::<String>("video-url")
        .expect("required argument")
        .clone();

    // Validate the reference early so a typo fails before any network call
    url::Url::parse(&video_url)
        .map_err(|e| anyhow::anyhow!("invalid video URL '{}': {}", video_url, e))?;

    let mut config = Config::load();
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.output_dir = PathBuf::from(dir);
    }
    if let Some(dir) = matches.get_one::<String>("cache-dir") {
        config.cache.cache_dir = PathBuf::from(dir);
    }
    if let Some(concurrency) = matches.get_one::<String>("concurrency") {
        config.pipeline.max_concurrency = concurrency.parse()?;
    }

    // Fatal before any stage runs
    config.validate()?;
    let credentials = RedditCredentials::from_env()?;

    let generator = create_generator(&config.llm)?;
    let reddit = RedditClient::connect(&credentials, config.reddit.request_timeout_seconds).await?;

    let video = extract_video_details(&video_url, config.reddit.request_timeout_seconds).await?;
    info!("Video title: {}", video.title);
    info!("Video description: {} chars", video.description.len());

    let store = ContentStore::new(config.cache.cache_dir.clone());
    store.initialize().await?;

    let fp = fingerprint(&video.url);
    if matches.get_flag("refresh") {
        if store.invalidate(&fp).await? {
            info!("Discarded cached results for this video");
        }
    }

    let pipeline = OutreachPipeline::new(
        config.pipeline.clone(),
        generator,
        Box::new(reddit),
        store,
    );

    match pipeline.run(&video).await? {
        PipelineOutcome::NoKeywords => {
            warn!("Unable to extract keywords from the video metadata.");
        }
        PipelineOutcome::NoPosts => {
            warn!("No matching posts found.");
        }
        PipelineOutcome::NoRelevantPosts => {
            warn!("No relevant posts found.");
        }
        PipelineOutcome::Completed {
            subreddits,
            posts,
            comments,
        } => {
            if !subreddits.is_empty() {
                info!("Suggested communities: {}", subreddits.join(", "));
            }

            for (post, comment) in posts.iter().zip(&comments) {
                println!("Post Title: {}", post.title);
                println!("Generated Comment: {}", comment);
                println!("Post URL: {}\n", post.url);
            }

            let csv_path = config
                .output
                .output_dir
                .join(format!("comments_{}.csv", fp));
            let written = save_posts_to_csv(&posts, &comments, &csv_path).await?;
            info!("Saved comments to {}", written.display());
        }
    }

    Ok(())
}
