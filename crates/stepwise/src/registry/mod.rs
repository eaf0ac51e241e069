//! Step registration and lookup.
//!
//! A [`Steps`] registry owns an insertion-ordered set of [`StepDef`]s keyed by
//! their pattern text. Handlers are checked once, when they are added, so a
//! registry only ever holds definitions the invoker can call. Registries are
//! plain values: build one, wrap it in an `Rc` and share it between as many
//! features as needed.

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::rc::Rc;

use hashbrown::HashMap;
use indexmap::IndexMap;
use regex::Regex;
use stepwise_patterns::{MatchMode, PatternError, compile_pattern, extract_captured_values};
use thiserror::Error;

use crate::config;
use crate::func::{Func, IntoFunc};
use crate::param::Param;
use crate::testing::Testing;
use crate::value::{TypeTag, Value, ZeroFn, zero_of};

#[cfg(feature = "diagnostics")]
mod diagnostics;
mod shape;

pub(crate) use shape::validate;
pub use shape::ShapeError;

/// Failure to add a step to a registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    /// A step with the same pattern text is already registered.
    #[error("step `{name}` already exists")]
    Duplicate {
        /// Pattern text of the rejected step.
        name: String,
    },
    /// The handler does not have the shape of a step.
    #[error("step `{name}`: {source}")]
    Shape {
        /// Pattern text of the rejected step.
        name: String,
        /// What is wrong with the handler.
        #[source]
        source: ShapeError,
    },
    /// The pattern text is not a valid regular expression.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A registered step.
#[derive(Debug)]
pub struct StepDef {
    pattern: String,
    regex: Regex,
    handler: Func,
    calls: Cell<usize>,
}

impl StepDef {
    /// Pattern text the step was registered under.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled pattern.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The handler, of shape `fn(Rc<dyn Testing>) -> Func`.
    #[must_use]
    pub fn handler(&self) -> &Func {
        &self.handler
    }

    /// How many phrases have selected this step so far.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.calls.get()
    }

    fn matches(&self, phrase: &str) -> Option<Vec<Param>> {
        if let Some(captures) = extract_captured_values(&self.regex, phrase) {
            return Some(captures.into_iter().map(Param::from).collect());
        }
        (self.pattern == phrase).then(Vec::new)
    }
}

/// Wrap a closure from the reporting capability to a step body as a step
/// handler.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use stepwise::{Testing, TypeTag, handler};
///
/// let handler = handler(|t: Rc<dyn Testing>| move |n: u8| t.logf(format_args!("{n}")));
/// assert_eq!(handler.params(), [TypeTag::of::<Rc<dyn Testing>>()]);
/// ```
pub fn handler<F, B, M>(f: F) -> Func
where
    F: Fn(Rc<dyn Testing>) -> B + 'static,
    B: IntoFunc<M>,
{
    Func::builder()
        .param::<Rc<dyn Testing>>()
        .returns::<Func>()
        .build(move |args| {
            let testing = args.get::<Rc<dyn Testing>>(0)?;
            Ok(vec![Value::new(f(testing).into_func())])
        })
}

/// Insertion-ordered collection of step definitions.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use stepwise::{Steps, Testing};
///
/// let mut steps = Steps::new();
/// steps.define(r"^I login as (\w+) (\d) times$", |t: Rc<dyn Testing>| {
///     move |name: String, times: u8| t.logf(format_args!("{name} x{times}"))
/// });
/// assert_eq!(steps.len(), 1);
/// assert_eq!(steps.unused(), [r"^I login as (\w+) (\d) times$"]);
/// ```
#[derive(Debug)]
pub struct Steps {
    defs: IndexMap<String, StepDef>,
    zeros: HashMap<TypeId, ZeroFn>,
    mode: MatchMode,
}

impl Default for Steps {
    fn default() -> Self {
        Self::new()
    }
}

impl Steps {
    /// An empty registry using the process-wide [`config::match_mode`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_match_mode(config::match_mode())
    }

    /// An empty registry whose patterns are compiled under `mode`.
    #[must_use]
    pub fn with_match_mode(mode: MatchMode) -> Self {
        Self {
            defs: IndexMap::new(),
            zeros: HashMap::new(),
            mode,
        }
    }

    /// How this registry's patterns are matched.
    #[must_use]
    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Register `handler` under the pattern `name`.
    ///
    /// # Panics
    ///
    /// Panics when [`try_add`](Self::try_add) would return an error. A bad
    /// step definition is a programming error in the test suite.
    pub fn add<M>(&mut self, name: impl Into<String>, handler: impl IntoFunc<M>) -> &mut Self {
        self.try_add(name, handler)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Register `handler` under the pattern `name`, reporting problems
    /// instead of panicking.
    ///
    /// The handler must take exactly one `Rc<dyn Testing>` and return exactly
    /// one [`Func`], the step body. The body is produced once, with an inert
    /// capability, to check that it takes a step handle only as
    /// `Rc<Step>` in first position. Earlier definitions are left untouched
    /// when registration fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when `name` is already registered, the
    /// handler or its body has the wrong shape, or `name` is not a valid
    /// regular expression.
    pub fn try_add<M>(
        &mut self,
        name: impl Into<String>,
        handler: impl IntoFunc<M>,
    ) -> Result<&mut Self, RegistrationError> {
        let name = name.into();
        if self.defs.contains_key(&name) {
            return Err(RegistrationError::Duplicate { name });
        }
        let handler = handler.into_func();
        if let Err(source) = validate(&handler) {
            return Err(RegistrationError::Shape { name, source });
        }
        let regex = compile_pattern(&name, self.mode)?;
        log::debug!("registered step `{name}` ({})", self.mode);
        self.defs.insert(
            name.clone(),
            StepDef {
                pattern: name,
                regex,
                handler,
                calls: Cell::new(0),
            },
        );
        Ok(self)
    }

    /// Register a closure from the reporting capability to a step body.
    ///
    /// Shorthand for `add(name, handler(f))`.
    ///
    /// # Panics
    ///
    /// As for [`add`](Self::add).
    pub fn define<F, B, M>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Rc<dyn Testing>) -> B + 'static,
        B: IntoFunc<M>,
    {
        self.add(name, handler(f))
    }

    /// Fill missing arguments of type `T` with `T::default()`.
    ///
    /// Primitives and `String` are zero-filled without registration. Any
    /// other parameter type a body may be left without, such as `Option<_>`
    /// or `Vec<_>`, needs a zero value here or on its [`TypeTag`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::rc::Rc;
    /// use stepwise::{Feature, Steps, Testing};
    /// use stepwise::test_support::Recorder;
    ///
    /// let mut steps = Steps::new();
    /// steps.register_zero::<Option<String>>();
    /// steps.define("^greet$", |t: Rc<dyn Testing>| {
    ///     move |name: Option<String>| t.log(name.as_deref().unwrap_or("nobody"))
    /// });
    ///
    /// let recorder = Recorder::shared();
    /// Feature::new(recorder.clone(), [steps]).step("greet");
    /// assert_eq!(recorder.logs(), ["nobody"]);
    /// ```
    pub fn register_zero<T: Any + Default>(&mut self) -> &mut Self {
        self.zeros.insert(TypeId::of::<T>(), zero_of::<T>);
        self
    }

    pub(crate) fn zero_for(&self, tag: &TypeTag) -> Option<ZeroFn> {
        self.zeros.get(&tag.id()).copied()
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// The definition registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StepDef> {
        self.defs.get(name)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &StepDef> {
        self.defs.values()
    }

    /// Pattern texts in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Patterns of steps no phrase has selected yet.
    #[must_use]
    pub fn unused(&self) -> Vec<&str> {
        self.iter()
            .filter(|def| def.invocations() == 0)
            .map(StepDef::pattern)
            .collect()
    }

    /// Select the first definition matching `phrase`, with its captures.
    ///
    /// A phrase equal to a definition's pattern text selects it even when the
    /// pattern does not match itself as a regular expression.
    pub(crate) fn find(&self, phrase: &str) -> Option<(Func, Vec<Param>)> {
        self.defs.values().find_map(|def| {
            let params = def.matches(phrase)?;
            def.calls.set(def.calls.get() + 1);
            log::debug!(
                "`{phrase}` matched step `{}` with {} captures",
                def.pattern,
                params.len()
            );
            Some((def.handler.clone(), params))
        })
    }
}

impl<'a> IntoIterator for &'a Steps {
    type Item = &'a StepDef;
    type IntoIter = indexmap::map::Values<'a, String, StepDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.defs.values()
    }
}

#[cfg(test)]
mod tests;
