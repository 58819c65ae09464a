//! CSV export of retained posts and their generated comments.

use crate::error::OutreachError;
use crate::reddit::RedditPost;
use std::path::{Path, PathBuf};
use tracing::info;

/// Quote a field per RFC 4180 when it contains a delimiter, quote, or
/// line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write one row per retained post, in generation order.
///
/// Only called after the generation stage completed, so a partial export
/// is never produced.
pub async fn save_posts_to_csv(
    posts: &[RedditPost],
    comments: &[String],
    path: &Path,
) -> Result<PathBuf, OutreachError> {
    let mut out = String::from("Post Title,Post URL,Generated Comment\r\n");

    for (post, comment) in posts.iter().zip(comments) {
        out.push_str(&format!(
            "{},{},{}\r\n",
            csv_field(&post.title),
            csv_field(&post.url),
            csv_field(comment)
        ));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, out).await?;

    info!("Saved {} rows to {}", posts.len().min(comments.len()), path.display());
    Ok(path.to_path_buf())
}
