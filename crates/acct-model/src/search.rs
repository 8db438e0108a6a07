//! Validated list filter.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a search prefix.
pub const MAX_SEARCH_LEN: usize = 50;

static SEARCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9@._+-]{1,50}$").expect("SEARCH_RE is a valid regex pattern")
});

/// An email prefix that is safe to embed in a provider filter expression.
///
/// The only way to build one is [`SearchPrefix::parse`], which accepts
/// 1 to 50 characters from `[a-z0-9@._+-]` after trimming and lower-casing.
/// Wildcards, quotes and whitespace never reach the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPrefix(String);

impl SearchPrefix {
    /// Validates raw caller input. Returns `None` when the input must be
    /// dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let candidate = raw.trim().to_lowercase();
        SEARCH_RE.is_match(&candidate).then_some(Self(candidate))
    }

    /// Returns the prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `value` starts with this prefix.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        value.starts_with(self.0.as_str())
    }
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
