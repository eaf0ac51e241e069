//! Compilation of step pattern text into regular expressions.
//!
//! A step's name doubles as its pattern. How much of a phrase the pattern has
//! to cover is governed by [`MatchMode`]: `Search` finds the pattern anywhere
//! in the phrase and leaves anchoring to the author (`^...$`), whilst
//! `Anchored` wraps the pattern so it must span the whole phrase.

use crate::errors::{MatchModeParseError, PatternError};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// How a compiled step pattern is applied to a phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Unanchored search; the pattern may match any substring of the phrase.
    #[default]
    Search,
    /// The pattern must match the entire phrase.
    Anchored,
}

impl MatchMode {
    /// Return the canonical lowercase name of the mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise_patterns::MatchMode;
    ///
    /// assert_eq!(MatchMode::Anchored.as_str(), "anchored");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Anchored => "anchored",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = MatchModeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("search") {
            Ok(Self::Search)
        } else if trimmed.eq_ignore_ascii_case("anchored") {
            Ok(Self::Anchored)
        } else {
            Err(MatchModeParseError(trimmed.to_string()))
        }
    }
}

/// Build the regular expression source for `pattern` under `mode`.
///
/// # Examples
///
/// ```
/// use stepwise_patterns::{MatchMode, build_regex_source};
///
/// assert_eq!(build_regex_source(r"a (\d+)", MatchMode::Search), r"a (\d+)");
/// assert_eq!(
///     build_regex_source(r"a (\d+)", MatchMode::Anchored),
///     r"^(?:a (\d+))$"
/// );
/// ```
#[must_use]
pub fn build_regex_source(pattern: &str, mode: MatchMode) -> String {
    match mode {
        MatchMode::Search => pattern.to_string(),
        MatchMode::Anchored => format!("^(?:{pattern})$"),
    }
}

/// Compile `pattern` into a [`Regex`] under `mode`.
///
/// # Errors
/// Returns [`PatternError::Regex`] when the pattern text is not a valid
/// regular expression.
pub fn compile_pattern(pattern: &str, mode: MatchMode) -> Result<Regex, PatternError> {
    Regex::new(&build_regex_source(pattern, mode)).map_err(|source| PatternError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn compiled(pattern: &str, mode: MatchMode) -> Regex {
        match compile_pattern(pattern, mode) {
            Ok(regex) => regex,
            Err(err) => panic!("pattern `{pattern}` should compile: {err}"),
        }
    }

    #[rstest]
    #[case("search", MatchMode::Search)]
    #[case(" Anchored ", MatchMode::Anchored)]
    #[case("SEARCH", MatchMode::Search)]
    fn parses_mode_case_insensitively(#[case] input: &str, #[case] expected: MatchMode) {
        assert_eq!(input.parse::<MatchMode>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert_eq!(
            "strict".parse::<MatchMode>(),
            Err(MatchModeParseError("strict".into()))
        );
    }

    #[test]
    fn search_mode_matches_embedded_text() {
        let regex = compiled("b = 4", MatchMode::Search);
        assert!(regex.is_match("a + b = 4"));
    }

    #[test]
    fn anchored_mode_requires_the_whole_phrase() {
        let regex = compiled("b = 4", MatchMode::Anchored);
        assert!(!regex.is_match("a + b = 4"));
        assert!(regex.is_match("b = 4"));
    }

    #[test]
    fn anchored_mode_keeps_alternation_inside_the_anchors() {
        let regex = compiled("cat|dog", MatchMode::Anchored);
        assert!(regex.is_match("dog"));
        assert!(!regex.is_match("catalogue"));
    }

    #[test]
    fn surfaces_regex_compilation_errors() {
        let Err(err) = compile_pattern("broken (", MatchMode::Search) else {
            panic!("unbalanced group should not compile");
        };
        assert!(matches!(err, PatternError::Regex { ref pattern, .. } if pattern == "broken ("));
    }
}
