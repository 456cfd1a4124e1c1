//! Trimmed, non-empty free text used for names, titles and bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text that is guaranteed to be non-empty after trimming.
///
/// Surrounding whitespace is removed on construction.
///
/// # Examples
/// ```
/// use tracker::domain::RequiredText;
///
/// assert_eq!(RequiredText::new("  Alpha ").unwrap().as_str(), "Alpha");
/// assert!(RequiredText::new("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequiredText(String);

impl RequiredText {
    /// Trim `raw` and wrap it, or return `None` when nothing remains.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for RequiredText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RequiredText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RequiredText> for String {
    fn from(value: RequiredText) -> Self {
        value.0
    }
}

impl TryFrom<String> for RequiredText {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("text must not be blank")
    }
}
