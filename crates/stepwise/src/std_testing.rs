//! A [`Testing`] for plain `#[test]` functions.
//!
//! `error` records a failure and keeps going. `fatal` and the `skip` family
//! stop the test by unwinding with a private payload that
//! [`StdTesting::run`] recognises, in the same way the skip helpers of
//! behaviour-test harnesses unwind out of a step. Recorded errors turn into a
//! single panic once the body has finished.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::testing::Testing;

/// Unwinding payload raised by `fatal` and `skip`.
#[derive(Debug)]
struct Halt;

/// How a body run under [`StdTesting::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The body completed without recording a failure.
    Passed,
    /// The body was skipped, with the message given to `skip`, if any.
    Skipped(Option<String>),
}

/// `Testing` backed by panics and the `log` facade.
#[derive(Debug, Default)]
pub struct StdTesting {
    failures: RefCell<Vec<String>>,
    skip_message: RefCell<Option<String>>,
    skipped: Cell<bool>,
}

impl StdTesting {
    /// Run `body` with a fresh capability and settle the outcome.
    ///
    /// # Panics
    ///
    /// Panics when the body recorded any failure, listing every message, and
    /// re-raises panics that did not come from `fatal` or `skip`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepwise::{Outcome, StdTesting, Testing};
    ///
    /// let outcome = StdTesting::run(|t| {
    ///     t.log("nothing to see");
    ///     t.skip("not today");
    ///     unreachable!("skip stops the body");
    /// });
    /// assert_eq!(outcome, Outcome::Skipped(Some("not today".into())));
    /// ```
    pub fn run<F>(body: F) -> Outcome
    where
        F: FnOnce(Rc<Self>),
    {
        let testing = Rc::new(Self::default());
        let handle = Rc::clone(&testing);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || body(handle))) {
            if !is_halt(payload.as_ref()) {
                panic::resume_unwind(payload);
            }
        }
        testing.finish()
    }

    /// Settle the outcome of a body that ran without [`run`](Self::run).
    ///
    /// # Panics
    ///
    /// Panics when any failure has been recorded.
    #[must_use]
    pub fn finish(&self) -> Outcome {
        let failures = self.failures.borrow();
        if !failures.is_empty() {
            let mut report = format!("{} failure(s):", failures.len());
            for failure in failures.iter() {
                let _ = write!(report, "\n  {failure}");
            }
            panic!("{report}");
        }
        if self.skipped.get() {
            Outcome::Skipped(self.skip_message.borrow().clone())
        } else {
            Outcome::Passed
        }
    }
}

fn halt() -> ! {
    panic::resume_unwind(Box::new(Halt))
}

fn is_halt(payload: &(dyn Any + Send)) -> bool {
    payload.is::<Halt>()
}

impl Testing for StdTesting {
    fn error(&self, message: &str) {
        log::error!("{message}");
        self.failures.borrow_mut().push(message.to_string());
    }

    fn fatal(&self, message: &str) {
        self.error(message);
        halt();
    }

    fn log(&self, message: &str) {
        log::info!("{message}");
    }

    fn skip(&self, message: &str) {
        log::info!("skipped: {message}");
        self.skip_message.replace(Some(message.to_string()));
        self.skip_now();
    }

    fn skip_now(&self) {
        self.skipped.set(true);
        halt();
    }

    fn failed(&self) -> bool {
        !self.failures.borrow().is_empty()
    }

    fn skipped(&self) -> bool {
        self.skipped.get()
    }
}
