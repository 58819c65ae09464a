use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use video_outreach::{
    ContentStore, GeneratorProvider, OutreachPipeline, PipelineConfig, PipelineOutcome,
    RedditPost, TextGenerator, ThreadSearch, VideoDetails,
};

/// Generation double scripted by prompt shape, counting calls per stage.
struct StubGenerator {
    keyword_json: String,
    relevant_marker: Option<String>,
    keyword_calls: Arc<AtomicUsize>,
    relevance_calls: Arc<AtomicUsize>,
    generation_calls: Arc<AtomicUsize>,
}

impl StubGenerator {
    fn new(keyword_json: &str, relevant_marker: Option<&str>) -> Self {
        Self {
            keyword_json: keyword_json.to_string(),
            relevant_marker: relevant_marker.map(str::to_string),
            keyword_calls: Arc::new(AtomicUsize::new(0)),
            relevance_calls: Arc::new(AtomicUsize::new(0)),
            generation_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn counters(
        &self,
    ) -> (
        Arc<AtomicUsize>,
        Arc<AtomicUsize>,
        Arc<AtomicUsize>,
    ) {
        (
            Arc::clone(&self.keyword_calls),
            Arc::clone(&self.relevance_calls),
            Arc::clone(&self.generation_calls),
        )
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<String> {
        if prompt.contains("suggest relevant keywords") {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.keyword_json.clone())
        } else if prompt.contains("select the subreddits") {
            Ok("{\"subreddits\": [\"programming\"]}".to_string())
        } else if prompt.contains("Respond with 'relevant'") {
            self.relevance_calls.fetch_add(1, Ordering::SeqCst);
            match &self.relevant_marker {
                Some(marker) if prompt.contains(marker.as_str()) => Ok("relevant".to_string()),
                _ => Ok("not relevant".to_string()),
            }
        } else {
            self.generation_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("draft reply\n\n{}", prompt))
        }
    }

    fn provider_type(&self) -> GeneratorProvider {
        GeneratorProvider::LMStudio
    }
}

/// Search double returning a fixed post list for any keyword.
struct StubSearch {
    posts: Vec<RedditPost>,
    search_calls: Arc<AtomicUsize>,
}

impl StubSearch {
    fn new(posts: Vec<RedditPost>) -> Self {
        Self {
            posts,
            search_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ThreadSearch for StubSearch {
    async fn search_posts(&self, _keyword: &str, _limit: u32) -> Result<Vec<RedditPost>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.clone())
    }

    async fn search_subreddits(&self, _keyword: &str, _limit: u32) -> Result<Vec<String>> {
        Ok(vec!["programming".to_string()])
    }
}

fn make_post(id: &str, title: &str, num_comments: u32) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        title: title.to_string(),
        selftext: format!("body of {}", id),
        url: format!("https://www.reddit.com/r/test/comments/{}/", id),
        num_comments,
        created_utc: Utc::now() - Duration::days(1),
    }
}

fn make_video() -> VideoDetails {
    VideoDetails {
        url: "https://youtu.be/cache101".to_string(),
        title: "Intro to Caching".to_string(),
        description: String::new(),
    }
}

const KEYWORD_JSON: &str =
    "{\"keywords\": [\"caching\"], \"subreddits\": [\"programming\"]}";

fn build_pipeline(
    generator: StubGenerator,
    search: StubSearch,
    temp: &TempDir,
) -> OutreachPipeline {
    OutreachPipeline::new(
        PipelineConfig::default(),
        Box::new(generator),
        Box::new(search),
        ContentStore::new(temp.path()),
    )
}

#[tokio::test]
async fn test_halts_on_empty_keywords_before_any_search() {
    let temp = TempDir::new().unwrap();
    let generator = StubGenerator::new("{\"keywords\": []}", None);
    let search = StubSearch::new(vec![make_post("a", "a post", 1)]);
    let search_calls = Arc::clone(&search.search_calls);

    let pipeline = build_pipeline(generator, search, &temp);
    let outcome = pipeline.run(&make_video()).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::NoKeywords));
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_halts_on_zero_posts_with_no_relevance_calls() {
    let temp = TempDir::new().unwrap();
    let generator = StubGenerator::new(KEYWORD_JSON, Some("caching"));
    let (_, relevance_calls, generation_calls) = generator.counters();
    let search = StubSearch::new(Vec::new());

    let pipeline = build_pipeline(generator, search, &temp);
    let outcome = pipeline.run(&make_video()).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::NoPosts));
    assert_eq!(relevance_calls.load(Ordering::SeqCst), 0);
    assert_eq!(generation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_halts_when_nothing_relevant() {
    let temp = TempDir::new().unwrap();
    let generator = StubGenerator::new(KEYWORD_JSON, None);
    let (_, _, generation_calls) = generator.counters();
    let search = StubSearch::new(vec![
        make_post("a", "gardening tips", 1),
        make_post("b", "sourdough starter", 2),
    ]);

    let pipeline = build_pipeline(generator, search, &temp);
    let outcome = pipeline.run(&make_video()).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::NoRelevantPosts));
    assert_eq!(generation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_completed_run_pairs_drafts_with_posts() {
    let temp = TempDir::new().unwrap();
    let generator = StubGenerator::new(KEYWORD_JSON, Some("caching"));
    let search = StubSearch::new(vec![
        make_post("a", "how does caching work", 1),
        make_post("b", "unrelated cooking thread", 2),
        make_post("c", "caching strategies compared", 3),
    ]);

    let pipeline = build_pipeline(generator, search, &temp);
    let outcome = pipeline.run(&make_video()).await.unwrap();

    match outcome {
        PipelineOutcome::Completed {
            subreddits,
            posts,
            comments,
        } => {
            assert_eq!(subreddits, vec!["programming"]);
            let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, vec!["a", "c"]);
            assert_eq!(comments.len(), posts.len());
            for (comment, post) in comments.iter().zip(&posts) {
                assert!(comment.contains(&post.title));
            }
        }
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prefilter_drops_crowded_posts_before_relevance() {
    let temp = TempDir::new().unwrap();
    let generator = StubGenerator::new(KEYWORD_JSON, Some("caching"));
    let (_, relevance_calls, _) = generator.counters();
    let search = StubSearch::new(vec![
        make_post("small", "caching question", 10),
        make_post("crowded", "caching megathread", 11),
    ]);

    let pipeline = build_pipeline(generator, search, &temp);
    let outcome = pipeline.run(&make_video()).await.unwrap();

    // Only the post at the inclusive boundary was classified
    assert_eq!(relevance_calls.load(Ordering::SeqCst), 1);
    match outcome {
        PipelineOutcome::Completed { posts, .. } => {
            assert_eq!(posts.len(), 1);
            assert_eq!(posts[0].id, "small");
        }
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_warm_cache_run_is_idempotent_with_zero_new_calls() {
    let temp = TempDir::new().unwrap();
    let store = ContentStore::new(temp.path());
    let posts = vec![
        make_post("a", "how does caching work", 1),
        make_post("b", "caching strategies compared", 2),
    ];
    let video = make_video();

    let first_ids;
    let first_comments;
    {
        let generator = StubGenerator::new(KEYWORD_JSON, Some("caching"));
        let pipeline = OutreachPipeline::new(
            PipelineConfig::default(),
            Box::new(generator),
            Box::new(StubSearch::new(posts.clone())),
            store.clone(),
        );
        match pipeline.run(&video).await.unwrap() {
            PipelineOutcome::Completed { posts, comments, .. } => {
                first_ids = posts.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
                first_comments = comments;
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    // Second run against the same store: every stage short-circuits.
    let generator = StubGenerator::new(KEYWORD_JSON, Some("caching"));
    let (keyword_calls, relevance_calls, generation_calls) = generator.counters();
    let search = StubSearch::new(posts);
    let search_calls = Arc::clone(&search.search_calls);

    let pipeline = OutreachPipeline::new(
        PipelineConfig::default(),
        Box::new(generator),
        Box::new(search),
        store,
    );

    match pipeline.run(&video).await.unwrap() {
        PipelineOutcome::Completed { posts, comments, .. } => {
            let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
            assert_eq!(ids, first_ids);
            assert_eq!(comments, first_comments);
        }
        other => panic!("expected Completed, got {:?}", other),
    }

    assert_eq!(keyword_calls.load(Ordering::SeqCst), 0);
    assert_eq!(relevance_calls.load(Ordering::SeqCst), 0);
    assert_eq!(generation_calls.load(Ordering::SeqCst), 0);
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_leaves_no_comments_cache() {
    struct FailingOnGeneration {
        inner: StubGenerator,
    }

    #[async_trait]
    impl TextGenerator for FailingOnGeneration {
        async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String> {
            if prompt.contains("non-spammy") {
                Err(anyhow::anyhow!("backend unavailable"))
            } else {
                self.inner.complete(prompt, system).await
            }
        }

        fn provider_type(&self) -> GeneratorProvider {
            GeneratorProvider::LMStudio
        }
    }

    let temp = TempDir::new().unwrap();
    let generator = FailingOnGeneration {
        inner: StubGenerator::new(KEYWORD_JSON, Some("caching")),
    };
    let search = StubSearch::new(vec![make_post("a", "how does caching work", 1)]);

    let pipeline = OutreachPipeline::new(
        PipelineConfig::default(),
        Box::new(generator),
        Box::new(search),
        ContentStore::new(temp.path()),
    );

    let result = pipeline.run(&make_video()).await;
    assert!(result.is_err());

    // Earlier stages were memoized; the failed stage was not.
    let fp = video_outreach::fingerprint(&make_video().url);
    let partition = temp.path().join(&fp);
    assert!(partition.join("keywords.json").exists());
    assert!(partition.join("relevant_posts.json").exists());
    assert!(!partition.join("comments.json").exists());
}
