//! Failures detected while driving a phrase through the invoker.

use thiserror::Error;

use crate::binding::BindError;
use crate::context::InjectionError;
use crate::func::CallError;
use crate::registry::ShapeError;

/// Why a phrase, handler or injected callback did not run.
///
/// Every variant is reported through `Testing::fatalf` using its `Display`
/// form, prefixed with the phrase where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvokeError {
    /// No registry has a step matching the phrase.
    #[error("`{phrase}`: step not found")]
    StepNotFound {
        /// Phrase as given.
        phrase: String,
    },
    /// A directly invoked handler does not have the shape of a step.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// The handler failed to produce a step body.
    #[error("`{phrase}`: {source}")]
    Handler {
        /// Phrase being run.
        phrase: String,
        /// Underlying failure.
        #[source]
        source: CallError,
    },
    /// The step body's arguments could not be bound.
    #[error("`{phrase}`: {source}")]
    Bind {
        /// Phrase being run.
        phrase: String,
        /// Underlying failure.
        #[source]
        source: BindError,
    },
    /// The step body itself failed.
    #[error("`{phrase}`: {source}")]
    Call {
        /// Phrase being run.
        phrase: String,
        /// Underlying failure.
        #[source]
        source: CallError,
    },
    /// A callback parameter could not be resolved from the context.
    #[error(transparent)]
    Injection(#[from] InjectionError),
    /// An injected callback failed.
    #[error("injected callback: {0}")]
    Callback(#[source] CallError),
}

impl InvokeError {
    /// Whether the error means no step matched the phrase.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StepNotFound { .. })
    }
}
