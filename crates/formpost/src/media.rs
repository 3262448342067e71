//! Media link handling.
//!
//! Posts reference media hosted on a file-sharing service. Sharing links come
//! in several shapes; they are rewritten to the canonical
//! `<origin>/file/d/<file id>/view` form before being written to a row.

use std::sync::LazyLock;

use regex::Regex;

/// Origin used when a recognized link carries no scheme and host.
pub const DEFAULT_MEDIA_ORIGIN: &str = "https://drive.google.com";

/// File extensions treated as still images.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

static FILE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("valid file path pattern"));
static ID_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]id=([A-Za-z0-9_-]+)").expect("valid id parameter pattern"));
static ORIGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*://[^/?#]+)").expect("valid origin pattern")
});

/// Extracts the hosted file id from a sharing link.
///
/// Recognizes `/file/d/<id>`, `/open?id=<id>` and any `?id=<id>` or `&id=<id>`
/// query parameter, in that order.
pub fn extract_file_id(url: &str) -> Option<&str> {
    [&*FILE_PATH, &*ID_PARAM]
        .into_iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Rewrites a sharing link to its canonical `.../file/d/<id>/view` form.
///
/// The origin of the input is kept. Empty input yields an empty string and
/// unrecognized input is returned unchanged, so the rewrite is idempotent.
///
/// # Example
///
/// ```
/// use formpost::normalize_media_url;
///
/// assert_eq!(
///     normalize_media_url("https://drive.example.com/file/d/ABC123/view?x=1"),
///     "https://drive.example.com/file/d/ABC123/view"
/// );
/// assert_eq!(
///     normalize_media_url("https://drive.google.com/open?id=XYZ"),
///     "https://drive.google.com/file/d/XYZ/view"
/// );
/// assert_eq!(normalize_media_url("https://cdn.example/a.png"), "https://cdn.example/a.png");
/// ```
pub fn normalize_media_url(url: &str) -> String {
    if url.trim().is_empty() {
        return String::new();
    }
    let Some(file_id) = extract_file_id(url) else {
        return url.to_string();
    };
    let origin = ORIGIN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map_or(DEFAULT_MEDIA_ORIGIN, |m| m.as_str());
    format!("{origin}/file/d/{file_id}/view")
}

/// Returns `true` when the media must be converted to video by the scheduled
/// transcoding job: still images, and hosted files whose type cannot be seen
/// from the link.
pub fn needs_transcoding(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext)) || FILE_PATH.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_known_link_shapes() {
        assert_eq!(
            normalize_media_url("https://drive.google.com/file/d/1abc-_Z/edit?usp=sharing"),
            "https://drive.google.com/file/d/1abc-_Z/view"
        );
        assert_eq!(
            normalize_media_url("https://drive.google.com/uc?export=view&id=Q9"),
            "https://drive.google.com/file/d/Q9/view"
        );
        assert_eq!(
            normalize_media_url("open?id=bare"),
            "https://drive.google.com/file/d/bare/view"
        );
    }

    #[test]
    fn leaves_other_input_alone() {
        assert_eq!(normalize_media_url(""), "");
        assert_eq!(normalize_media_url("   "), "");
        assert_eq!(normalize_media_url("not a link"), "not a link");
        assert_eq!(
            normalize_media_url("https://example.com/video?vid=3"),
            "https://example.com/video?vid=3"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "",
            "plain",
            "https://drive.example.com/file/d/ABC123/view?x=1",
            "https://drive.google.com/open?id=XYZ",
            "https://h/path?a=1&id=abc",
            "file/d/nohost",
            "https://cdn.example/img.PNG",
        ];
        for input in inputs {
            let once = normalize_media_url(input);
            assert_eq!(normalize_media_url(&once), once, "{input}");
        }
    }

    #[test]
    fn classifies_transcoding_candidates() {
        assert!(needs_transcoding("https://cdn.example/photo.JPG"));
        assert!(needs_transcoding("https://drive.google.com/file/d/abc/view"));
        assert!(!needs_transcoding("https://cdn.example/clip.mp4"));
        assert!(!needs_transcoding(""));
    }
}
