//! Media path resolution and classification.

use strum_macros::Display;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// What kind of embed a file path should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    /// Unrecognized extension; rendered as the plain path.
    Unknown,
}

/// A resolved media reference: the original path, the URL to fetch it from,
/// and its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    /// The path as it appeared in the message.
    pub label: String,
    /// Fetchable URL.
    pub url: String,
    pub kind: MediaKind,
}

/// Resolves a file path against the static-file base location.
///
/// Absolute URLs pass through untouched; anything else is joined onto
/// `static_base`.
pub fn resolve(path: &str, static_base: &str) -> MediaSource {
    let url = if path.starts_with("http") {
        path.to_string()
    } else {
        format!("{}{}", static_base, path)
    };
    MediaSource {
        label: path.to_string(),
        url,
        kind: classify(path),
    }
}

/// Classifies a path by its file extension.
pub fn classify(path: &str) -> MediaKind {
    let extension = path
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let extension = extension.as_str();

    if IMAGE_EXTENSIONS.contains(&extension) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        MediaKind::Video
    } else if AUDIO_EXTENSIONS.contains(&extension) {
        MediaKind::Audio
    } else {
        MediaKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000/static/";

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("plot.png"), MediaKind::Image);
        assert_eq!(classify("shots/CLIP.JPG"), MediaKind::Image);
        assert_eq!(classify("demo.webm"), MediaKind::Video);
        assert_eq!(classify("voice.wav"), MediaKind::Audio);
        assert_eq!(classify("report.pdf"), MediaKind::Unknown);
        assert_eq!(classify("no-extension"), MediaKind::Unknown);
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let media = resolve("out/plot.png", BASE);
        assert_eq!(media.url, "http://localhost:8000/static/out/plot.png");
        assert_eq!(media.label, "out/plot.png");
        assert_eq!(media.kind, MediaKind::Image);
    }

    #[test]
    fn test_absolute_urls_pass_through() {
        let media = resolve("https://example.com/clip.mp4", BASE);
        assert_eq!(media.url, "https://example.com/clip.mp4");
        assert_eq!(media.kind, MediaKind::Video);
    }
}
