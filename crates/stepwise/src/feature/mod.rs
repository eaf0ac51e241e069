//! Execution handles: phrase invocation, context injection and lifecycle.
//!
//! A [`Feature`] ties together the reporting capability, an ordered list of
//! registries and the [`Context`]. Driving it with a phrase runs the
//! invocation pipeline:
//!
//! 1. find the first matching step across the registries, in order;
//! 2. call its handler with the capability to obtain the step body;
//! 3. bind the body's parameters (step handle, captures, explicit values,
//!    zero values);
//! 4. call the body.
//!
//! Any failure along the way is reported once through
//! [`Testing::fatalf`] and stops that phrase only. Step bodies receive an
//! `Rc<Step>` that dereferences to the owning `Feature`, so steps can run
//! further phrases and inject context values themselves.

mod error;

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use derive_more::Deref;
use stepwise_patterns::StepKeyword;

use crate::binding::{self, Arg};
use crate::context::Context;
use crate::func::{Func, IntoFunc};
use crate::lifecycle::{SetupFn, Teardown};
use crate::param::Param;
use crate::registry::{self, ShapeError, Steps};
use crate::testing::Testing;
use crate::value::{TypeTag, Value};

pub use error::InvokeError;

struct Inner {
    testing: Rc<dyn Testing>,
    registries: Vec<Rc<Steps>>,
    context: RefCell<Context>,
}

/// Handle for running phrases against a set of registries.
///
/// Cloning is cheap; clones share the capability, registries and context.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use stepwise::{Feature, Steps, Testing};
/// use stepwise::test_support::Recorder;
///
/// let mut steps = Steps::new();
/// steps.define(r"^(\d+) \+ (\d+) = (\d+)$", |t: Rc<dyn Testing>| {
///     move |a: i64, b: i64, sum: i64| {
///         if a + b != sum {
///             t.errorf(format_args!("{a} + {b} != {sum}"));
///         }
///     }
/// });
///
/// let recorder = Recorder::shared();
/// let feature = Feature::new(recorder.clone(), [steps]);
/// feature.then("2 + 2 = 4");
/// feature.then("2 + 2 = 5");
/// assert_eq!(recorder.errors(), ["2 + 2 != 5"]);
/// ```
#[derive(Clone)]
pub struct Feature {
    inner: Rc<Inner>,
}

impl Feature {
    /// Create a handle reporting through `testing` and searching `steps` in
    /// order.
    pub fn new<I, S>(testing: Rc<dyn Testing>, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Rc<Steps>>,
    {
        Self {
            inner: Rc::new(Inner {
                testing,
                registries: steps.into_iter().map(Into::into).collect(),
                context: RefCell::new(Context::new()),
            }),
        }
    }

    /// Replace the context, returning the handle.
    #[must_use]
    pub fn with_context(self, context: Context) -> Self {
        self.replace_context(context);
        self
    }

    /// The reporting capability.
    #[must_use]
    pub fn testing(&self) -> Rc<dyn Testing> {
        Rc::clone(&self.inner.testing)
    }

    /// Registries in search order.
    #[must_use]
    pub fn registries(&self) -> &[Rc<Steps>] {
        &self.inner.registries
    }

    /// Borrow the context.
    ///
    /// # Panics
    ///
    /// Panics if the context is mutably borrowed through
    /// [`context_mut`](Self::context_mut).
    #[must_use]
    pub fn context(&self) -> Ref<'_, Context> {
        self.inner.context.borrow()
    }

    /// Borrow the context mutably.
    ///
    /// Do not hold the guard while running phrases; steps that touch the
    /// context would find it borrowed.
    ///
    /// # Panics
    ///
    /// Panics if the context is already borrowed.
    #[must_use]
    pub fn context_mut(&self) -> RefMut<'_, Context> {
        self.inner.context.borrow_mut()
    }

    /// Merge `entries` into the context, overwriting existing keys.
    pub fn set_context<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.context_mut().extend(entries);
    }

    /// Store one value in the context, returning the value it replaces.
    pub fn set_context_value<T: Any>(&self, key: impl Into<String>, value: T) -> Option<Value> {
        self.context_mut().set(key, value)
    }

    /// Replace the whole context, returning the previous one.
    pub fn replace_context(&self, context: Context) -> Context {
        self.context_mut().replace(context)
    }

    /// The context value under `key`, cloned out as `T`.
    #[must_use]
    pub fn context_value<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.context().get_as::<T>(key)
    }

    /// Run `phrase` with no explicit values.
    pub fn step(&self, phrase: &str) {
        self.step_with(phrase, Vec::new());
    }

    /// Run `phrase`, passing `values` after the captured text.
    ///
    /// Failures are reported through [`Testing::fatalf`].
    pub fn step_with(&self, phrase: &str, values: Vec<Value>) {
        if let Err(err) = self.try_step_with(phrase, values) {
            self.report(&err);
        }
    }

    /// Run `phrase` with no explicit values, returning failures instead of
    /// reporting them.
    ///
    /// # Errors
    ///
    /// As for [`try_step_with`](Self::try_step_with).
    pub fn try_step(&self, phrase: &str) -> Result<(), InvokeError> {
        self.try_step_with(phrase, Vec::new())
    }

    /// Run `phrase`, passing `values` after the captured text, returning
    /// failures instead of reporting them.
    ///
    /// Failures inside steps that the body runs itself are still reported
    /// by those steps.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::StepNotFound`] when no step matches, and the
    /// handler, binding or call error otherwise.
    pub fn try_step_with(&self, phrase: &str, values: Vec<Value>) -> Result<(), InvokeError> {
        let Some((handler, params)) = self.lookup(phrase) else {
            return Err(InvokeError::StepNotFound {
                phrase: phrase.to_string(),
            });
        };
        let args = params
            .into_iter()
            .map(Arg::Param)
            .chain(values.into_iter().map(Arg::Value));
        self.run_handler(phrase, &handler, args)
    }

    /// Run a `Given` phrase.
    pub fn given(&self, phrase: &str) {
        self.keyword_step(StepKeyword::Given, phrase, Vec::new());
    }

    /// Run a `Given` phrase with explicit values.
    pub fn given_with(&self, phrase: &str, values: Vec<Value>) {
        self.keyword_step(StepKeyword::Given, phrase, values);
    }

    /// Run a `When` phrase.
    pub fn when(&self, phrase: &str) {
        self.keyword_step(StepKeyword::When, phrase, Vec::new());
    }

    /// Run a `When` phrase with explicit values.
    pub fn when_with(&self, phrase: &str, values: Vec<Value>) {
        self.keyword_step(StepKeyword::When, phrase, values);
    }

    /// Run a `Then` phrase.
    pub fn then(&self, phrase: &str) {
        self.keyword_step(StepKeyword::Then, phrase, Vec::new());
    }

    /// Run a `Then` phrase with explicit values.
    pub fn then_with(&self, phrase: &str, values: Vec<Value>) {
        self.keyword_step(StepKeyword::Then, phrase, values);
    }

    /// Run an `And` phrase.
    pub fn and(&self, phrase: &str) {
        self.keyword_step(StepKeyword::And, phrase, Vec::new());
    }

    /// Run an `And` phrase with explicit values.
    pub fn and_with(&self, phrase: &str, values: Vec<Value>) {
        self.keyword_step(StepKeyword::And, phrase, values);
    }

    /// Run a `But` phrase.
    pub fn but(&self, phrase: &str) {
        self.keyword_step(StepKeyword::But, phrase, Vec::new());
    }

    /// Run a `But` phrase with explicit values.
    pub fn but_with(&self, phrase: &str, values: Vec<Value>) {
        self.keyword_step(StepKeyword::But, phrase, values);
    }

    /// Call a step handler directly, without registering it.
    ///
    /// The handler's shape is checked first, as registration would, and a
    /// bad shape is reported through [`Testing::fatal`]. The body sees an
    /// empty phrase and receives `values` as its arguments.
    pub fn invoke<M>(&self, handler: impl IntoFunc<M>, values: Vec<Value>) {
        let handler = handler.into_func();
        if let Err(err) = registry::validate(&handler) {
            log::warn!("{err}");
            self.inner.testing.fatal(&err.to_string());
            return;
        }
        if let Err(err) = self.run_handler("", &handler, values.into_iter().map(Arg::Value)) {
            self.report(&err);
        }
    }

    /// Call `callback` with every parameter resolved from the context.
    ///
    /// `keys[i]`, when present and non-empty, selects the entry for
    /// parameter `i` by key; otherwise the earliest entry of the parameter's
    /// type is used. Nothing is called unless every parameter resolves.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use stepwise::{Feature, Steps, Testing};
    /// use stepwise::test_support::Recorder;
    ///
    /// let recorder = Recorder::shared();
    /// let feature = Feature::new(recorder.clone(), Vec::<Steps>::new());
    /// feature.set_context_value("hero", String::from("Batman"));
    /// feature.set_context_value("logins", 2_u8);
    ///
    /// let t = feature.testing();
    /// feature.inject(&[], move |name: String, times: u8| {
    ///     t.logf(format_args!("{name} x{times}"));
    /// });
    /// feature.inject(&["wrongkey"], |_: String| {});
    /// assert_eq!(recorder.logs(), ["Batman x2"]);
    /// assert_eq!(recorder.fatals(), ["wrongkey: invalid context injection key"]);
    /// ```
    pub fn inject<M>(&self, keys: &[&str], callback: impl IntoFunc<M>) {
        if let Err(err) = self.try_inject(keys, callback) {
            self.report(&err);
        }
    }

    /// Call `callback` with context-resolved parameters, returning its
    /// results instead of reporting failures.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Injection`] when a parameter cannot be resolved
    /// and [`InvokeError::Callback`] when the callback fails.
    pub fn try_inject<M>(
        &self,
        keys: &[&str],
        callback: impl IntoFunc<M>,
    ) -> Result<Vec<Value>, InvokeError> {
        let callback = callback.into_func();
        let args = {
            let context = self.context();
            callback
                .params()
                .iter()
                .enumerate()
                .map(|(index, tag)| context.resolve(tag, keys.get(index).copied()))
                .collect::<Result<Vec<_>, _>>()?
        };
        callback.call(args).map_err(InvokeError::Callback)
    }

    /// Run setup `routines` in order and collect their teardowns.
    pub fn setup<I>(&self, routines: I) -> Teardown
    where
        I: IntoIterator<Item = SetupFn>,
    {
        Teardown::collect(self, routines)
    }

    fn lookup(&self, phrase: &str) -> Option<(Func, Vec<Param>)> {
        self.inner
            .registries
            .iter()
            .find_map(|steps| steps.find(phrase))
    }

    /// Zero value for a parameter nobody supplied: the tag's own hook, then
    /// the first registry that knows the type, then the built-in table.
    fn zero_value(&self, tag: &TypeTag) -> Option<Value> {
        tag.zero_hook()
            .or_else(|| {
                self.inner
                    .registries
                    .iter()
                    .find_map(|steps| steps.zero_for(tag))
            })
            .map(|zero| zero())
            .or_else(|| tag.zero_value())
    }

    fn keyword_step(&self, keyword: StepKeyword, phrase: &str, values: Vec<Value>) {
        log::debug!("{keyword} {phrase}");
        self.step_with(phrase, values);
    }

    fn run_handler<I>(&self, phrase: &str, handler: &Func, args: I) -> Result<(), InvokeError>
    where
        I: IntoIterator<Item = Arg>,
    {
        let body = handler
            .call(vec![Value::new(self.testing())])
            .map_err(|source| InvokeError::Handler {
                phrase: phrase.to_string(),
                source,
            })?
            .first()
            .and_then(Value::get::<Func>)
            .ok_or(InvokeError::Shape(ShapeError::NotSingleFunc))?;
        let handle = || {
            Rc::new(Step {
                feature: self.clone(),
                phrase: phrase.to_string(),
            })
        };
        let zero = |tag: &TypeTag| self.zero_value(tag);
        let bound = binding::bind(body.params(), handle, zero, args).map_err(|source| {
            InvokeError::Bind {
                phrase: phrase.to_string(),
                source,
            }
        })?;
        body.call(bound).map_err(|source| InvokeError::Call {
            phrase: phrase.to_string(),
            source,
        })?;
        Ok(())
    }

    fn report(&self, err: &InvokeError) {
        log::warn!("{err}");
        self.inner.testing.fatalf(format_args!("{err}"));
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("registries", &self.inner.registries.len())
            .field("context", &self.inner.context)
            .finish()
    }
}

/// The handle a step body receives as its first parameter.
///
/// Taken as `Rc<Step>`, it names the phrase being run and dereferences to
/// the owning [`Feature`], so a body can run nested phrases, read the context
/// and inject values.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use stepwise::{Feature, Step, Steps, Testing};
/// use stepwise::test_support::Recorder;
///
/// let mut steps = Steps::new();
/// steps
///     .define("inner", |t: Rc<dyn Testing>| move || t.log("inner"))
///     .define("outer", |t: Rc<dyn Testing>| {
///         move |step: Rc<Step>| {
///             t.logf(format_args!("enter {}", step.name()));
///             step.step("inner");
///             t.log("leave outer");
///         }
///     });
///
/// let recorder = Recorder::shared();
/// Feature::new(recorder.clone(), [steps]).step("outer");
/// assert_eq!(recorder.logs(), ["enter outer", "inner", "leave outer"]);
/// ```
#[derive(Debug, Deref)]
pub struct Step {
    #[deref]
    feature: Feature,
    phrase: String,
}

impl Step {
    /// The phrase this invocation is running; empty for direct invocations.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.phrase
    }

    /// The owning feature.
    #[must_use]
    pub fn feature(&self) -> &Feature {
        &self.feature
    }
}
