//! Slide key parsing and numeric ordering.
//!
//! Slide assets are named `slide_<n>` with a fixed-width numeric suffix
//! on disk (`slide_003.png`) and an unpadded key in narration manifests
//! (`slide_3`). Ordering authority everywhere is the parsed integer:
//! "slide_10" sorts after "slide_2", never lexically.

use std::path::{Path, PathBuf};

/// Parse the slide index out of a key or file stem.
///
/// Accepts `slide_2`, `slide_002`, and longer stems such as
/// `slide_002_001_speaker1` (the numeric segment right after the prefix
/// wins). Returns `None` for anything else.
pub fn slide_index(name: &str) -> Option<u64> {
    let mut parts = name.split('_');
    if parts.next() != Some("slide") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Canonical narration key for a slide index (unpadded).
pub fn slide_key(index: u64) -> String {
    format!("slide_{}", index)
}

/// Parse the slide index from an image path's file stem.
pub fn image_slide_index(path: &Path) -> Option<u64> {
    path.file_stem()
        .and_then(|stem| slide_index(&stem.to_string_lossy()))
}

/// Sort image paths by parsed slide index.
///
/// Paths without a parsable index sort last, keeping their relative
/// order (stable sort).
pub fn sort_images_by_index(paths: &mut [PathBuf]) {
    paths.sort_by_key(|p| image_slide_index(p).unwrap_or(u64::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded() {
        assert_eq!(slide_index("slide_2"), Some(2));
        assert_eq!(slide_index("slide_002"), Some(2));
        assert_eq!(slide_index("slide_010"), Some(10));
    }

    #[test]
    fn parses_audio_style_stems() {
        assert_eq!(slide_index("slide_003_001_speaker1"), Some(3));
    }

    #[test]
    fn rejects_non_slide_names() {
        assert_eq!(slide_index("cover"), None);
        assert_eq!(slide_index("slide_abc"), None);
        assert_eq!(slide_index("deck_1"), None);
    }

    #[test]
    fn numeric_order_beats_lexical() {
        let mut paths = vec![
            PathBuf::from("slides/slide_010.png"),
            PathBuf::from("slides/slide_002.png"),
            PathBuf::from("slides/slide_001.png"),
        ];
        sort_images_by_index(&mut paths);

        let indices: Vec<u64> = paths.iter().filter_map(|p| image_slide_index(p)).collect();
        assert_eq!(indices, vec![1, 2, 10]);
    }

    #[test]
    fn key_is_unpadded() {
        assert_eq!(slide_key(3), "slide_3");
        assert_eq!(slide_key(42), "slide_42");
    }
}
