//! Shared step-pattern utilities for stepwise.
//!
//! The crate owns the pieces of phrase matching that do not depend on the
//! runtime: compiling a step's pattern text into a regular expression under a
//! [`MatchMode`], pulling capture groups out of a matched phrase, and the
//! [`StepKeyword`] type used by Given/When/Then style entry points.

mod capture;
mod errors;
mod keyword;
mod pattern;

pub use capture::extract_captured_values;
pub use errors::{MatchModeParseError, PatternError};
pub use keyword::{StepKeyword, StepKeywordParseError};
pub use pattern::{MatchMode, build_regex_source, compile_pattern};
