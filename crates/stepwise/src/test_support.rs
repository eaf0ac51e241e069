//! Recording implementation of [`Testing`] for exercising steps in tests.
//!
//! [`Recorder`] keeps every report in order instead of acting on it, so a
//! test can assert on exactly which failures, logs and skips a phrase
//! produced. Fatal reports are recorded like any other; the engine stops the
//! current invocation on its own after reporting one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::testing::Testing;

/// Which [`Testing`] method produced a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// [`Testing::error`] and [`Testing::errorf`].
    Error,
    /// [`Testing::fatal`] and [`Testing::fatalf`].
    Fatal,
    /// [`Testing::log`] and [`Testing::logf`].
    Log,
    /// [`Testing::skip`] and [`Testing::skipf`].
    Skip,
}

/// One recorded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Reporting method.
    pub kind: ReportKind,
    /// Message as passed in.
    pub message: String,
}

/// A [`Testing`] that records reports in order.
///
/// # Examples
///
/// ```
/// use stepwise::Testing;
/// use stepwise::test_support::Recorder;
///
/// let recorder = Recorder::default();
/// recorder.log("setting up");
/// recorder.fatal("boom");
/// assert!(recorder.failed());
/// assert_eq!(recorder.fatals(), ["boom"]);
/// assert_eq!(recorder.events().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    events: RefCell<Vec<Report>>,
    failed: Cell<bool>,
    skipped: Cell<bool>,
}

impl Recorder {
    /// A fresh recorder behind an `Rc`, ready to coerce into
    /// `Rc<dyn Testing>`.
    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Every report so far.
    #[must_use]
    pub fn events(&self) -> Vec<Report> {
        self.events.borrow().clone()
    }

    /// Messages of the reports of `kind`, in order.
    #[must_use]
    pub fn messages(&self, kind: ReportKind) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|report| report.kind == kind)
            .map(|report| report.message.clone())
            .collect()
    }

    /// Messages passed to `error`.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages(ReportKind::Error)
    }

    /// Messages passed to `fatal`.
    #[must_use]
    pub fn fatals(&self) -> Vec<String> {
        self.messages(ReportKind::Fatal)
    }

    /// Messages passed to `log`.
    #[must_use]
    pub fn logs(&self) -> Vec<String> {
        self.messages(ReportKind::Log)
    }

    /// Messages passed to `skip`.
    #[must_use]
    pub fn skips(&self) -> Vec<String> {
        self.messages(ReportKind::Skip)
    }

    /// Forget every report and reset the failure and skip flags.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.failed.set(false);
        self.skipped.set(false);
    }

    fn push(&self, kind: ReportKind, message: &str) {
        self.events.borrow_mut().push(Report {
            kind,
            message: message.to_string(),
        });
    }
}

impl Testing for Recorder {
    fn error(&self, message: &str) {
        self.failed.set(true);
        self.push(ReportKind::Error, message);
    }

    fn fatal(&self, message: &str) {
        self.failed.set(true);
        self.push(ReportKind::Fatal, message);
    }

    fn log(&self, message: &str) {
        self.push(ReportKind::Log, message);
    }

    fn skip(&self, message: &str) {
        self.skipped.set(true);
        self.push(ReportKind::Skip, message);
    }

    fn skip_now(&self) {
        self.skipped.set(true);
    }

    fn failed(&self) -> bool {
        self.failed.get()
    }

    fn skipped(&self) -> bool {
        self.skipped.get()
    }
}
