//! Free-text notes normalization.
use lazy_static::lazy_static;
use regex::Regex;

/// Decorative runs the legacy UI let editors type into notes.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"[*~=_#]{2,}",
    r"!{2,}",
    r"\[/?(?:b|i|u|s|color[^\]]*)\]",
    r"</?[a-zA-Z][^>]*>",
    r"[\x{1F300}-\x{1FAFF}\x{2600}-\x{27BF}]",
];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref SPACE_BEFORE_SEPARATOR: Regex = Regex::new(r"\s+([,;])").unwrap();
    static ref DELIMITER_RUN: Regex = Regex::new(r"\s*([,;|/\-])(?:\s*[,;|/\-])+\s*").unwrap();
    static ref LEADING_DELIMITERS: Regex = Regex::new(r"^[\s,;|/\-]+").unwrap();
    static ref TRAILING_DELIMITERS: Regex = Regex::new(r"[\s,;|/\-]+$").unwrap();
}

/// Strips decorative substrings from notes and tidies what they leave behind.
#[derive(Debug, Clone)]
pub struct NotesCleaner {
    patterns: Vec<Regex>,
}

impl Default for NotesCleaner {
    fn default() -> Self {
        // Default patterns are known to compile.
        Self::new(DEFAULT_PATTERNS).unwrap()
    }
}

impl NotesCleaner {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Cleans a note. Returns `None` when nothing meaningful is left.
    pub fn clean(&self, text: &str) -> Option<String> {
        let mut cleaned = text.to_string();
        for pattern in &self.patterns {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }

        let cleaned = DELIMITER_RUN.replace_all(&cleaned, " $1 ");
        let cleaned = WHITESPACE.replace_all(&cleaned, " ");
        let cleaned = SPACE_BEFORE_SEPARATOR.replace_all(&cleaned, "$1");
        let cleaned = LEADING_DELIMITERS.replace(&cleaned, "");
        let cleaned = TRAILING_DELIMITERS.replace(&cleaned, "");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }
}
