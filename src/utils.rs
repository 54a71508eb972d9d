//! Utility functions for URL inspection and file handling

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Maximum length of a sanitized filename stem, in characters
const MAX_FILENAME_CHARS: usize = 100;

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
    )
    .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([a-zA-Z0-9_-]{11})",
    )
    .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\s-]").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|e| unreachable!("static regex: {e}")));

/// Check whether a string looks like a supported video URL
///
/// This is a shape check only; a matching URL may still fail to resolve.
///
/// # Examples
///
/// ```
/// use tubeproxy::utils::is_valid_video_url;
///
/// assert!(is_valid_video_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
/// assert!(is_valid_video_url("youtu.be/dQw4w9WgXcQ"));
/// assert!(!is_valid_video_url("not a url"));
/// ```
#[must_use]
pub fn is_valid_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

/// Extract the 11-character video id from a URL
///
/// Recognises `watch?v=`, `youtu.be/`, `/embed/` and `/v/` forms.
#[must_use]
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Make a title safe to use as a filename stem
///
/// Drops everything except ASCII word characters, whitespace and `-`,
/// turns whitespace runs into `_`, and truncates to 100 characters. An
/// input with nothing usable yields `video`.
///
/// # Examples
///
/// ```
/// use tubeproxy::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Never Gonna Give You Up (Official)"), "Never_Gonna_Give_You_Up_Official");
/// assert_eq!(sanitize_filename("???"), "video");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let kept = UNSAFE_FILENAME_CHARS.replace_all(name, "");
    let joined = WHITESPACE_RUN.replace_all(&kept, "_");
    let truncated: String = joined.chars().take(MAX_FILENAME_CHARS).collect();

    if truncated.trim_matches('_').is_empty() {
        "video".to_string()
    } else {
        truncated
    }
}

/// Delete a file, treating an already-missing file as success
///
/// Returns `true` if this call removed the file.
pub async fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
