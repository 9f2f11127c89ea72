//! Input Sanitizer: bounds and cleans untrusted resume text before it is
//! embedded in a prompt.
//!
//! Order of operations: presence/type → trim → minimum → maximum →
//! markup stripping → hard truncation. All lengths are counted in `char`s.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Matches an opening or closing tag, or an unterminated `<...` run at end of input.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+(>|$)").unwrap());

const CODE_FENCE: &str = "```";

/// Target role hints longer than this are cut.
pub const MAX_ROLE_CHARS: usize = 120;

/// Size bounds for resume text, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            min_chars: 100,
            max_chars: 15_000,
        }
    }
}

/// Resume text that passed every sanitizer step. Only constructible here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Resume text is required")]
    Missing,

    #[error("Resume is too short. Please provide at least {min} characters of content.")]
    TooShort { min: usize, actual: usize },

    #[error("Resume is too long. Please shorten to under {max} characters.")]
    TooLong { max: usize, actual: usize },

    #[error("Missing required data: {0}")]
    MissingField(&'static str),

    #[error("Prior analysis result is invalid at '{0}'")]
    InvalidPriorResult(String),
}

/// Validates and sanitizes raw resume text.
///
/// `None` covers both an absent field and a non-string JSON value; the
/// caller decides which inputs collapse to `None`.
pub fn validate(raw: Option<&str>, limits: TextLimits) -> Result<SanitizedText, ValidationError> {
    let raw = raw.ok_or(ValidationError::Missing)?;
    let trimmed = raw.trim();
    let actual = trimmed.chars().count();

    if actual == 0 {
        return Err(ValidationError::Missing);
    }
    if actual < limits.min_chars {
        return Err(ValidationError::TooShort {
            min: limits.min_chars,
            actual,
        });
    }
    if actual > limits.max_chars {
        return Err(ValidationError::TooLong {
            max: limits.max_chars,
            actual,
        });
    }

    let cleaned = truncate_chars(&strip_markup(trimmed), limits.max_chars);

    // Stripping can shrink a borderline input under the floor.
    let remaining = cleaned.chars().count();
    if remaining < limits.min_chars {
        return Err(ValidationError::TooShort {
            min: limits.min_chars,
            actual: remaining,
        });
    }

    Ok(SanitizedText(cleaned))
}

/// Cleans an optional target-role hint. Empty results collapse to `None`.
pub fn sanitize_role(raw: Option<&str>) -> Option<String> {
    let cleaned = strip_markup(raw?.trim());
    let cleaned = truncate_chars(cleaned.trim(), MAX_ROLE_CHARS);
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Removes code-fence delimiters and tag-like spans.
///
/// Runs to a fixed point: removing a tag can splice two backtick runs into
/// a new fence, and the output must contain neither construct.
pub fn strip_markup(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = TAG_RE
            .replace_all(&current.replace(CODE_FENCE, ""), "")
            .into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Cuts `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
