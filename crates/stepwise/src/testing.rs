//! The reporting capability supplied by the surrounding test framework.
//!
//! Every failure the engine detects, and every assertion a step body makes,
//! goes through [`Testing`]. The engine itself never panics at invocation time
//! and never exits; whether a fatal report stops the test is the
//! implementation's business.

use std::fmt;
use std::rc::Rc;

/// Minimal test-result interface driven by the engine and by step bodies.
///
/// Implementors record failures through `&self`, so they typically keep their
/// state in `Cell`/`RefCell`. The `*f` variants take pre-built
/// [`fmt::Arguments`] and forward to their plain counterparts by default.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use stepwise::Testing;
/// use stepwise::test_support::Recorder;
///
/// let recorder = Recorder::shared();
/// let t: Rc<dyn Testing> = recorder.clone();
/// t.errorf(format_args!("{} != {}", 1, 2));
/// assert!(t.failed());
/// assert_eq!(recorder.errors(), ["1 != 2"]);
/// ```
pub trait Testing {
    /// Record a non-fatal failure and continue.
    fn error(&self, message: &str);

    /// Formatted form of [`error`](Self::error).
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.error(&args.to_string());
    }

    /// Record a fatal failure.
    fn fatal(&self, message: &str);

    /// Formatted form of [`fatal`](Self::fatal).
    fn fatalf(&self, args: fmt::Arguments<'_>) {
        self.fatal(&args.to_string());
    }

    /// Record diagnostic output that does not fail the test.
    fn log(&self, message: &str);

    /// Formatted form of [`log`](Self::log).
    fn logf(&self, args: fmt::Arguments<'_>) {
        self.log(&args.to_string());
    }

    /// Log `message` and mark the test as skipped.
    fn skip(&self, message: &str);

    /// Mark the test as skipped without a message.
    fn skip_now(&self);

    /// Formatted form of [`skip`](Self::skip).
    fn skipf(&self, args: fmt::Arguments<'_>) {
        self.skip(&args.to_string());
    }

    /// Whether any failure has been recorded.
    fn failed(&self) -> bool;

    /// Whether the test has been marked as skipped.
    fn skipped(&self) -> bool;
}

/// Capability that ignores every report.
///
/// Only used as the exemplar passed to handlers while their shape is checked
/// at registration.
#[derive(Debug, Default)]
struct Exemplar;

impl Testing for Exemplar {
    fn error(&self, _: &str) {}
    fn fatal(&self, _: &str) {}
    fn log(&self, _: &str) {}
    fn skip(&self, _: &str) {}
    fn skip_now(&self) {}
    fn failed(&self) -> bool {
        false
    }
    fn skipped(&self) -> bool {
        false
    }
}

thread_local! {
    static EXEMPLAR: Rc<dyn Testing> = Rc::new(Exemplar);
}

/// The read-only capability used to instantiate handlers during shape checks.
#[must_use]
pub fn reference() -> Rc<dyn Testing> {
    EXEMPLAR.with(Rc::clone)
}
