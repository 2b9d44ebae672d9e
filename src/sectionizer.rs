//! Splits raw documentation text into ordered sections.
//!
//! A document is expected to carry an optional YAML-style front-matter block
//! (enclosed by `---` marker lines) followed by a body whose sections are
//! separated by a repeated-character delimiter such as markdown headings.
//! The sectionizer removes the front matter and splits the body, nothing
//! more: no trimming or filtering happens here, so downstream consumers can
//! reassemble the body (modulo delimiters) from the returned sections.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::IngestError;

/// Leading front-matter block: an opening `---` line, optional content,
/// and a closing `---` line.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---\r?\n(?:.*?\r?\n)?---(?:\r?\n|\z)")
        .expect("front matter pattern is valid")
});

/// Reusable section splitter for one delimiter token.
#[derive(Clone, Debug)]
pub struct Sectionizer {
    splitter: Regex,
}

impl Sectionizer {
    /// Compiles the splitting pattern for `delimiter`: one or more newlines,
    /// one or more repetitions of the token, then required whitespace.
    pub fn new(delimiter: &str) -> Result<Self, IngestError> {
        let pattern = format!(r"\n+(?:{})+\s", regex::escape(delimiter));
        let splitter = Regex::new(&pattern)
            .map_err(|err| IngestError::InvalidDocument(err.to_string()))?;
        Ok(Self { splitter })
    }

    /// Strips a well-formed front-matter block, then splits the remainder
    /// into ordered sections. A body without delimiter occurrences yields
    /// exactly one section.
    pub fn sectionize(&self, text: &str) -> Vec<String> {
        let body = strip_front_matter(text);
        self.splitter
            .split(body)
            .map(|section| section.to_string())
            .collect()
    }
}

/// Removes a leading front-matter block, delimiters included. Text without
/// a well-formed block passes through untouched.
pub fn strip_front_matter(text: &str) -> &str {
    match FRONT_MATTER.find(text) {
        Some(found) => &text[found.end()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sectionizer() -> Sectionizer {
        Sectionizer::new("#").unwrap()
    }

    #[test]
    fn strips_front_matter_block() {
        let text = "---\ntitle: Guide\ntags: [a, b]\n---\nBody starts here";
        assert_eq!(strip_front_matter(text), "Body starts here");
    }

    #[test]
    fn strips_empty_front_matter_block() {
        assert_eq!(strip_front_matter("---\n---\nBody"), "Body");
        assert_eq!(strip_front_matter("---\r\n---\r\nBody"), "Body");
    }

    #[test]
    fn text_without_front_matter_is_untouched() {
        let text = "No metadata here\n---\nnot a leading block";
        assert_eq!(strip_front_matter(text), text);
    }

    #[test]
    fn no_delimiter_yields_single_section() {
        let sections = sectionizer().sectionize("just one body, no headings");
        assert_eq!(sections, vec!["just one body, no headings".to_string()]);
    }

    #[test]
    fn splits_on_repeated_delimiter_runs() {
        let text = "intro text\n# First\ncontent one\n\n## Second\ncontent two";
        let sections = sectionizer().sectionize(text);
        assert_eq!(
            sections,
            vec![
                "intro text".to_string(),
                "First\ncontent one".to_string(),
                "Second\ncontent two".to_string(),
            ]
        );
    }

    #[test]
    fn sections_preserve_bytes_outside_front_matter() {
        let text = "---\nmeta: 1\n---\nlead  \n# One\n  padded content  \n# Two\ntail\n";
        let sections = sectionizer().sectionize(text);
        // No trimming: whitespace inside sections survives verbatim.
        assert_eq!(
            sections,
            vec![
                "lead  ".to_string(),
                "One\n  padded content  ".to_string(),
                "Two\ntail\n".to_string(),
            ]
        );
    }

    #[test]
    fn front_matter_and_split_compose() {
        let text = "---\ntitle: x\n---\nbody only";
        let sections = sectionizer().sectionize(text);
        assert_eq!(sections, vec!["body only".to_string()]);
    }

    #[test]
    fn custom_delimiter_token() {
        let sectionizer = Sectionizer::new("=").unwrap();
        let sections = sectionizer.sectionize("part a\n== part b\npart b body");
        assert_eq!(
            sections,
            vec!["part a".to_string(), "part b\npart b body".to_string()]
        );
    }
}
