//! Error types shared by the pattern modules.

use thiserror::Error;

/// Errors surfaced while turning step pattern text into a regular expression.
///
/// # Examples
/// ```
/// use stepwise_patterns::{MatchMode, PatternError, compile_pattern};
///
/// let err = compile_pattern("a (broken step", MatchMode::Search)
///     .expect_err("unbalanced group must not compile");
/// assert!(matches!(err, PatternError::Regex { .. }));
/// assert!(err.to_string().starts_with("invalid step pattern `a (broken step`"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The pattern text is not a valid regular expression.
    #[error("invalid step pattern `{pattern}`: {source}")]
    Regex {
        /// Pattern text as supplied at registration.
        pattern: String,
        /// Underlying compilation failure.
        #[source]
        source: regex::Error,
    },
}

/// Error returned when a [`MatchMode`](crate::MatchMode) name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid match mode: {0} (expected `search` or `anchored`)")]
pub struct MatchModeParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_error_names_the_pattern() {
        let err = PatternError::Regex {
            pattern: "a (".into(),
            source: regex::Error::Syntax("unclosed group".into()),
        };
        assert_eq!(
            err.to_string(),
            "invalid step pattern `a (`: unclosed group"
        );
    }

    #[test]
    fn match_mode_error_lists_accepted_values() {
        let err = MatchModeParseError("strict".into());
        assert_eq!(
            err.to_string(),
            "invalid match mode: strict (expected `search` or `anchored`)"
        );
    }
}
