//! Keyword and community suggestion from video metadata.

use crate::error::OutreachError;
use crate::llm::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const SUGGESTION_SYSTEM_PROMPT: &str = "You are an assistant skilled in identifying relevant \
     keywords and subreddits. Please output the result in the specified JSON format.";

/// Keywords and candidate communities suggested for a video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordSuggestion {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub subreddits: Vec<String>,
}

/// Escape line breaks so a multi-line description cannot be mistaken for a
/// payload boundary inside the delimited prompt.
pub fn escape_line_breaks(text: &str) -> String {
    text.replace('\n', "&#10;")
}

/// Extract the first parseable JSON object or array embedded in free-form
/// text.
///
/// Generation backends often wrap JSON in prose or markdown. This scans for
/// balanced brace/bracket regions and returns the first one that strictly
/// parses, or None when no region does.
pub fn extract_json_value(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' && b != b'[' {
            continue;
        }
        if let Some(end) = find_balanced_end(text, start) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(value);
            }
        }
    }
    None
}

/// Find the byte index of the delimiter closing the region opened at
/// `start`, honoring string literals and escapes.
fn find_balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &b) in text.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Suggest search keywords and candidate subreddits for a video.
///
/// Missing fields in the response JSON yield empty lists; a response with
/// no parseable JSON at all is a parse error.
pub async fn suggest_keywords(
    generator: &dyn TextGenerator,
    video_title: &str,
    video_description: &str,
) -> Result<KeywordSuggestion, OutreachError> {
    let escaped_description = escape_line_breaks(video_description);

    let prompt = format!(
        "Based on the following video title and description, suggest \
         relevant keywords and subreddits to find related posts.\n\n\
         Title: {}\n\
         <description>{}</description>\n\n\
         Output in this JSON format:\n\
         {{\n\
         \x20 \"keywords\": [\"keyword1\", \"keyword2\", ...],\n\
         \x20 \"subreddits\": [\"subreddit1\", \"subreddit2\", ...]\n\
         }}",
        video_title, escaped_description
    );

    let response = generator
        .complete(&prompt, Some(SUGGESTION_SYSTEM_PROMPT))
        .await
        .map_err(OutreachError::ExternalCall)?;

    debug!("Keyword suggestion response ({} chars)", response.len());

    let value = extract_json_value(&response).ok_or_else(|| {
        OutreachError::Parse("no JSON found in keyword suggestion response".to_string())
    })?;

    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keep only the subreddits where the video would plausibly belong.
pub async fn filter_subreddits(
    generator: &dyn TextGenerator,
    video_title: &str,
    video_description: &str,
    subreddits: &[String],
) -> Result<Vec<String>, OutreachError> {
    if subreddits.is_empty() {
        return Ok(Vec::new());
    }

    let escaped_description = escape_line_breaks(video_description);

    let prompt = format!(
        "Given the video title '{}' and description \
         <description>{}</description>, select the subreddits from the \
         following list where this video would be on-topic.\n\n\
         Subreddits: {}\n\n\
         Output in this JSON format:\n\
         {{\n\
         \x20 \"subreddits\": [\"subreddit1\", \"subreddit2\", ...]\n\
         }}",
        video_title,
        escaped_description,
        subreddits.join(", ")
    );

    let response = generator
        .complete(&prompt, Some(SUGGESTION_SYSTEM_PROMPT))
        .await
        .map_err(OutreachError::ExternalCall)?;

    let value = extract_json_value(&response).ok_or_else(|| {
        OutreachError::Parse("no JSON found in subreddit filter response".to_string())
    })?;

    #[derive(Deserialize, Default)]
    struct FilterResponse {
        #[serde(default)]
        subreddits: Vec<String>,
    }

    let filtered: FilterResponse = serde_json::from_value(value).unwrap_or_default();
    Ok(filtered.subreddits)
}
