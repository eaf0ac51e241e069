//! Captured phrase fragments awaiting coercion.

use derive_more::{Deref, From};

/// Text captured by one group of a step pattern.
///
/// A `Param` only exists between matching a phrase and binding the step
/// body's arguments; explicit values supplied by the caller are never wrapped
/// in one, which is how the binder knows to coerce only captured text.
///
/// # Examples
///
/// ```
/// use stepwise::Param;
///
/// let param = Param::new("Batman");
/// assert_eq!(param.as_str(), "Batman");
/// assert_eq!(param.len(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deref, From)]
pub struct Param(String);

impl Param {
    /// Wrap captured text.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The captured text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the param, returning the captured text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
