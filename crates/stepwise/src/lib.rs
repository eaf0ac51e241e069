//! Core library for `stepwise`.
//!
//! Test authors register named, pattern-matched steps in a [`Steps`]
//! registry, then drive a [`Feature`] with free-text phrases. Text captured by
//! a step's pattern is coerced to the types the step body declares, explicit
//! values follow the captures, and values stored in the feature's
//! [`Context`] can be injected into any callback by type or by key.
//!
//! Every failure the engine detects is reported through the caller's
//! [`Testing`] capability rather than returned, so a step runner reads like
//! the test it drives:
//!
//! ```
//! use std::rc::Rc;
//! use stepwise::{Feature, Steps, Testing};
//! use stepwise::test_support::Recorder;
//!
//! let mut steps = Steps::new();
//! steps.define(r"^I login as (\w+) (\d) times$", |t: Rc<dyn Testing>| {
//!     move |name: String, times: u8| t.logf(format_args!("{name} logged in {times}x"))
//! });
//!
//! let recorder = Recorder::shared();
//! let feature = Feature::new(recorder.clone(), [steps]);
//! feature.when("I login as Batman 2 times");
//! feature.then("something nobody defined");
//! assert_eq!(recorder.logs(), ["Batman logged in 2x"]);
//! assert_eq!(recorder.fatals(), ["`something nobody defined`: step not found"]);
//! ```
//!
//! The engine is single-threaded: handles share state through `Rc` and
//! `RefCell` and are neither `Send` nor `Sync`.

mod binding;
mod coerce;
pub mod config;
mod context;
mod feature;
mod func;
mod lifecycle;
mod macros;
mod param;
mod registry;
mod std_testing;
pub mod test_support;
mod testing;
mod value;

pub use binding::BindError;
pub use coerce::{CoercionError, coerce};
pub use context::{Context, InjectionError};
pub use feature::{Feature, InvokeError, Step};
pub use func::{Args, CallError, Func, FuncBuilder, IntoFunc, IntoReturns, Signature};
pub use lifecycle::{SetupFn, Teardown, TeardownFn, setup_fn, setup_only};
pub use param::Param;
pub use registry::{RegistrationError, ShapeError, StepDef, Steps, handler};
pub use std_testing::{Outcome, StdTesting};
pub use stepwise_patterns::{MatchMode, PatternError, StepKeyword, StepKeywordParseError};
pub use testing::{Testing, reference};
pub use value::{ParseFn, TypeTag, Value, ZeroFn};
