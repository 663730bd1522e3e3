//! Card preview derived from a note body.
//!
//! # Invariants
//! - Previews are computed on read and never stored.
//! - `text` holds at most `PREVIEW_MAX_CHARS` characters.

use once_cell::sync::Lazy;
use regex::Regex;

pub const PREVIEW_MAX_CHARS: usize = 100;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

// `![alt](path "title")` -> path
static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"!\[[^\]]*\]\(\s*([^)\s]+)[^)]*\)"#).expect("image regex"));
// `[label](target)` -> label
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link regex"));
static SYNTAX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_`#>~|\[\]()!]+|(?m)^\s*[-+]\s+").expect("syntax regex"));

/// What a note card shows besides title and course.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotePreview {
    /// Plain text with markdown removed and whitespace collapsed.
    pub text: Option<String>,
    /// First embedded image, else the attached file when it is an image.
    pub thumbnail: Option<String>,
}

impl NotePreview {
    pub fn derive(content: Option<&str>, file_ref: Option<&str>) -> Self {
        let content = content.unwrap_or_default();
        let thumbnail = first_image(content).or_else(|| {
            file_ref
                .filter(|path| looks_like_image(path))
                .map(str::to_string)
        });
        Self {
            text: plain_text(content),
            thumbnail,
        }
    }
}

fn first_image(markdown: &str) -> Option<String> {
    IMAGE_RE
        .captures(markdown)
        .and_then(|caps| caps.get(1))
        .map(|path| path.as_str().to_string())
}

fn plain_text(markdown: &str) -> Option<String> {
    let stripped = IMAGE_RE.replace_all(markdown, " ");
    let stripped = LINK_RE.replace_all(&stripped, "$1");
    let stripped = SYNTAX_RE.replace_all(&stripped, "");

    let words: Vec<&str> = stripped.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" ").chars().take(PREVIEW_MAX_CHARS).collect())
}

fn looks_like_image(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

#[cfg(test)]
mod tests {
    use super::{NotePreview, PREVIEW_MAX_CHARS};

    #[test]
    fn thumbnail_prefers_first_embedded_image() {
        let preview = NotePreview::derive(
            Some("x ![a](one.png \"cover\") y ![b](two.png)"),
            Some("scan.jpg"),
        );
        assert_eq!(preview.thumbnail.as_deref(), Some("one.png"));
    }

    #[test]
    fn thumbnail_falls_back_to_image_attachment_only() {
        let image = NotePreview::derive(None, Some("uploads/board.JPG"));
        assert_eq!(image.thumbnail.as_deref(), Some("uploads/board.JPG"));

        let pdf = NotePreview::derive(None, Some("uploads/lecture.pdf"));
        assert_eq!(pdf.thumbnail, None);
    }

    #[test]
    fn text_strips_markdown_and_is_capped() {
        let preview = NotePreview::derive(
            Some("# Sorting\n\n- **Stable**: [merge sort](https://example.com)\n> quote"),
            None,
        );
        assert_eq!(
            preview.text.as_deref(),
            Some("Sorting Stable: merge sort quote")
        );

        let long = "word ".repeat(80);
        let capped = NotePreview::derive(Some(&long), None).text.unwrap();
        assert_eq!(capped.chars().count(), PREVIEW_MAX_CHARS);
    }

    #[test]
    fn blank_body_has_no_text() {
        assert_eq!(NotePreview::derive(Some(" \n "), None).text, None);
        assert_eq!(NotePreview::derive(None, None), NotePreview::default());
    }
}
