//! Callables with an explicit runtime signature.
//!
//! Step handlers, step bodies and injected callbacks are all [`Func`]s: a
//! shared closure over [`Args`] paired with the [`Signature`] that lists its
//! parameter and return types. The engine binds arguments against the
//! signature and never needs to know the closure's static type.
//!
//! Typed closures of up to six arguments convert into a `Func` through
//! [`IntoFunc`]; [`Func::builder`] covers everything else, including
//! parameters whose tags carry custom zero or parse hooks.

use std::any::{Any, type_name};
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::value::{TypeTag, Value};

/// Failure raised while calling a [`Func`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CallError {
    /// The number of arguments differs from the signature.
    #[error("expected {expected} arguments, got {got}")]
    Arity {
        /// Parameters in the signature.
        expected: usize,
        /// Arguments supplied.
        got: usize,
    },
    /// An argument's type differs from the declared parameter.
    #[error("argument {index}: expected {expected}, got {got}")]
    ArgumentType {
        /// Zero-based argument position.
        index: usize,
        /// Declared parameter type.
        expected: &'static str,
        /// Supplied value type.
        got: &'static str,
    },
    /// The body returned a different number of values than declared.
    #[error("expected {expected} return values, got {got}")]
    ReturnCount {
        /// Declared return values.
        expected: usize,
        /// Values returned.
        got: usize,
    },
    /// A returned value's type differs from the declaration.
    #[error("return value {index}: expected {expected}, got {got}")]
    ReturnType {
        /// Zero-based return position.
        index: usize,
        /// Declared return type.
        expected: &'static str,
        /// Returned value type.
        got: &'static str,
    },
    /// The body asked for an argument beyond those supplied.
    #[error("argument {index} is missing")]
    MissingArgument {
        /// Zero-based argument position.
        index: usize,
    },
}

/// Parameter and return types of a [`Func`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<TypeTag>,
    returns: Vec<TypeTag>,
}

impl Signature {
    /// Describe a callable taking `params` and returning `returns`.
    #[must_use]
    pub fn new(params: Vec<TypeTag>, returns: Vec<TypeTag>) -> Self {
        Self { params, returns }
    }

    /// Declared parameter types, in order.
    #[must_use]
    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }

    /// Declared return types, in order.
    #[must_use]
    pub fn returns(&self) -> &[TypeTag] {
        &self.returns
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;
        write_tags(f, &self.params)?;
        f.write_str(")")?;
        match self.returns.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {single}"),
            many => {
                f.write_str(" -> (")?;
                write_tags(f, many)?;
                f.write_str(")")
            }
        }
    }
}

fn write_tags(f: &mut fmt::Formatter<'_>, tags: &[TypeTag]) -> fmt::Result {
    for (index, tag) in tags.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{tag}")?;
    }
    Ok(())
}

/// Arguments handed to a [`Func`] body, already checked against its
/// signature.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    /// Wrap `values` for a body call.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, untyped.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Borrow the argument at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::MissingArgument`] when `index` is out of range and
    /// [`CallError::ArgumentType`] when the argument is not a `T`.
    pub fn get_ref<T: Any>(&self, index: usize) -> Result<&T, CallError> {
        let value = self
            .value(index)
            .ok_or(CallError::MissingArgument { index })?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| CallError::ArgumentType {
                index,
                expected: type_name::<T>(),
                got: value.type_name(),
            })
    }

    /// Clone the argument at `index` out as `T`.
    ///
    /// # Errors
    ///
    /// As for [`get_ref`](Self::get_ref).
    pub fn get<T: Any + Clone>(&self, index: usize) -> Result<T, CallError> {
        self.get_ref::<T>(index).cloned()
    }

    /// Consume the arguments.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

type Body = dyn Fn(Args) -> Result<Vec<Value>, CallError>;

/// A shared callable with a runtime [`Signature`].
///
/// Cloning shares the closure.
///
/// # Examples
///
/// ```
/// use stepwise::{Func, Value};
///
/// let add = Func::from_fn(|a: i64, b: i64| a + b);
/// assert_eq!(add.signature().to_string(), "fn(i64, i64) -> i64");
/// let sum = add
///     .call(vec![Value::new(1_i64), Value::new(2_i64)])
///     .expect("arguments match the signature");
/// assert_eq!(sum.first().and_then(Value::get::<i64>), Some(3));
/// ```
#[derive(Clone)]
pub struct Func {
    signature: Rc<Signature>,
    body: Rc<Body>,
}

impl Func {
    /// Pair `signature` with a body over untyped [`Args`].
    ///
    /// [`call`](Self::call) checks arguments and returned values against the
    /// signature, so the body may assume both are well typed.
    pub fn new<B>(signature: Signature, body: B) -> Self
    where
        B: Fn(Args) -> Result<Vec<Value>, CallError> + 'static,
    {
        Self {
            signature: Rc::new(signature),
            body: Rc::new(body),
        }
    }

    /// Start describing a `Func` parameter by parameter.
    #[must_use]
    pub fn builder() -> FuncBuilder {
        FuncBuilder::default()
    }

    /// Convert a typed closure.
    pub fn from_fn<M>(f: impl IntoFunc<M>) -> Self {
        f.into_func()
    }

    /// The declared signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Declared parameter types, in order.
    #[must_use]
    pub fn params(&self) -> &[TypeTag] {
        self.signature.params()
    }

    /// Declared return types, in order.
    #[must_use]
    pub fn returns(&self) -> &[TypeTag] {
        self.signature.returns()
    }

    /// Call the body with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] when `args` do not match the parameter list, when
    /// the body fails, or when the body returns values that do not match the
    /// declared return types.
    pub fn call(&self, args: Vec<Value>) -> Result<Vec<Value>, CallError> {
        check_values(self.params(), &args).map_err(|mismatch| match mismatch {
            Mismatch::Count { expected, got } => CallError::Arity { expected, got },
            Mismatch::Type {
                index,
                expected,
                got,
            } => CallError::ArgumentType {
                index,
                expected,
                got,
            },
        })?;
        let returned = (self.body)(Args::new(args))?;
        check_values(self.returns(), &returned).map_err(|mismatch| match mismatch {
            Mismatch::Count { expected, got } => CallError::ReturnCount { expected, got },
            Mismatch::Type {
                index,
                expected,
                got,
            } => CallError::ReturnType {
                index,
                expected,
                got,
            },
        })?;
        Ok(returned)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func({})", self.signature)
    }
}

enum Mismatch {
    Count {
        expected: usize,
        got: usize,
    },
    Type {
        index: usize,
        expected: &'static str,
        got: &'static str,
    },
}

fn check_values(tags: &[TypeTag], values: &[Value]) -> Result<(), Mismatch> {
    if tags.len() != values.len() {
        return Err(Mismatch::Count {
            expected: tags.len(),
            got: values.len(),
        });
    }
    let Some(index) = tags
        .iter()
        .zip(values)
        .position(|(tag, value)| value.tag() != *tag)
    else {
        return Ok(());
    };
    Err(Mismatch::Type {
        index,
        expected: tags.get(index).map_or("?", TypeTag::name),
        got: values.get(index).map_or("?", Value::type_name),
    })
}

/// Incremental description of a [`Func`].
///
/// # Examples
///
/// ```
/// use stepwise::{Func, TypeTag, Value};
///
/// #[derive(Clone, Default)]
/// struct Budget(u32);
///
/// let spend = Func::builder()
///     .param_tag(TypeTag::defaulted::<Budget>())
///     .param::<u32>()
///     .returns::<u32>()
///     .build(|args| {
///         let Budget(total) = args.get::<Budget>(0)?;
///         let cost = args.get::<u32>(1)?;
///         Ok(vec![Value::new(total.saturating_sub(cost))])
///     });
/// let left = spend.call(vec![Value::new(Budget(10)), Value::new(3_u32)]);
/// assert_eq!(left.ok().and_then(|values| values.first()?.get::<u32>()), Some(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FuncBuilder {
    params: Vec<TypeTag>,
    returns: Vec<TypeTag>,
}

impl FuncBuilder {
    /// Append a parameter of type `T`.
    #[must_use]
    pub fn param<T: Any>(self) -> Self {
        self.param_tag(TypeTag::of::<T>())
    }

    /// Append a parameter described by `tag`.
    #[must_use]
    pub fn param_tag(mut self, tag: TypeTag) -> Self {
        self.params.push(tag);
        self
    }

    /// Append a return value of type `T`.
    #[must_use]
    pub fn returns<T: Any>(self) -> Self {
        self.returns_tag(TypeTag::of::<T>())
    }

    /// Append a return value described by `tag`.
    #[must_use]
    pub fn returns_tag(mut self, tag: TypeTag) -> Self {
        self.returns.push(tag);
        self
    }

    /// Finish with `body`.
    pub fn build<B>(self, body: B) -> Func
    where
        B: Fn(Args) -> Result<Vec<Value>, CallError> + 'static,
    {
        Func::new(Signature::new(self.params, self.returns), body)
    }
}

/// Values a typed closure may return.
pub trait IntoReturns: 'static {
    /// Tags of the returned values, in order.
    fn tags() -> Vec<TypeTag>;

    /// Split `self` into type-erased values.
    fn into_values(self) -> Vec<Value>;
}

impl IntoReturns for () {
    fn tags() -> Vec<TypeTag> {
        Vec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! single_returns {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoReturns for $ty {
            fn tags() -> Vec<TypeTag> {
                vec![TypeTag::of::<$ty>()]
            }

            fn into_values(self) -> Vec<Value> {
                vec![Value::new(self)]
            }
        }
    )*};
}

single_returns!(
    Func,
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);

impl<A: IntoReturns, B: IntoReturns> IntoReturns for (A, B) {
    fn tags() -> Vec<TypeTag> {
        let mut tags = A::tags();
        tags.extend(B::tags());
        tags
    }

    fn into_values(self) -> Vec<Value> {
        let mut values = self.0.into_values();
        values.extend(self.1.into_values());
        values
    }
}

/// Conversion of typed closures into [`Func`]s.
///
/// `Marker` is the closure's `fn` pointer type and only serves to keep the
/// per-arity implementations apart. Arguments must be `Clone` because the
/// body receives them from shared [`Value`]s.
pub trait IntoFunc<Marker> {
    /// Perform the conversion.
    fn into_func(self) -> Func;
}

impl IntoFunc<Func> for Func {
    fn into_func(self) -> Func {
        self
    }
}

impl<F, R> IntoFunc<fn() -> R> for F
where
    F: Fn() -> R + 'static,
    R: IntoReturns,
{
    fn into_func(self) -> Func {
        Func::new(Signature::new(Vec::new(), R::tags()), move |_| {
            Ok((self)().into_values())
        })
    }
}

macro_rules! typed_closures {
    ($($arg:ident $index:tt),+) => {
        impl<F, R, $($arg),+> IntoFunc<fn($($arg),+) -> R> for F
        where
            F: Fn($($arg),+) -> R + 'static,
            R: IntoReturns,
            $($arg: Any + Clone,)+
        {
            fn into_func(self) -> Func {
                let params = vec![$(TypeTag::of::<$arg>()),+];
                Func::new(Signature::new(params, R::tags()), move |args| {
                    Ok((self)($(args.get::<$arg>($index)?),+).into_values())
                })
            }
        }
    };
}

typed_closures!(A 0);
typed_closures!(A 0, B 1);
typed_closures!(A 0, B 1, C 2);
typed_closures!(A 0, B 1, C 2, D 3);
typed_closures!(A 0, B 1, C 2, D 3, E 4);
typed_closures!(A 0, B 1, C 2, D 3, E 4, G 5);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    fn first_i64(values: &[Value]) -> Option<i64> {
        values.first().and_then(Value::get::<i64>)
    }

    #[test]
    fn typed_closure_records_signature() {
        let func = Func::from_fn(|name: String, times: u8| format!("{name}{times}"));
        assert_eq!(
            func.params(),
            [TypeTag::of::<String>(), TypeTag::of::<u8>()]
        );
        assert_eq!(func.returns(), [TypeTag::of::<String>()]);
    }

    #[test]
    fn nullary_closure_runs() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let func = Func::from_fn(move || counter.set(counter.get() + 1));
        assert!(func.params().is_empty());
        assert_eq!(func.call(Vec::new()).map(|values| values.len()), Ok(0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn call_checks_arity() {
        let func = Func::from_fn(|a: i64, b: i64| a + b);
        assert_eq!(
            func.call(vec![Value::new(1_i64)]).map(|v| v.len()),
            Err(CallError::Arity {
                expected: 2,
                got: 1,
            })
        );
    }

    #[rstest]
    #[case(vec![Value::new(1_i64), Value::new(2_i64)], Some(3))]
    #[case(vec![Value::new(-4_i64), Value::new(4_i64)], Some(0))]
    fn call_returns_body_values(#[case] args: Vec<Value>, #[case] expected: Option<i64>) {
        let func = Func::from_fn(|a: i64, b: i64| a + b);
        let returned = func
            .call(args)
            .unwrap_or_else(|err| panic!("call should succeed: {err}"));
        assert_eq!(first_i64(&returned), expected);
    }

    #[test]
    fn call_rejects_mistyped_arguments() {
        let func = Func::from_fn(|a: i64| a);
        assert_eq!(
            func.call(vec![Value::new("1")]).map(|v| v.len()),
            Err(CallError::ArgumentType {
                index: 0,
                expected: "i64",
                got: "&str",
            })
        );
    }

    #[test]
    fn call_rejects_undeclared_returns() {
        let func = Func::builder()
            .returns::<i64>()
            .build(|_| Ok(vec![Value::new(1_u8)]));
        assert!(matches!(
            func.call(Vec::new()),
            Err(CallError::ReturnType { index: 0, .. })
        ));
        let silent = Func::builder().returns::<i64>().build(|_| Ok(Vec::new()));
        assert_eq!(
            silent.call(Vec::new()).map(|v| v.len()),
            Err(CallError::ReturnCount {
                expected: 1,
                got: 0,
            })
        );
    }

    #[test]
    fn args_report_missing_positions() {
        let args = Args::new(vec![Value::new(1_u8)]);
        assert_eq!(args.get::<u8>(0), Ok(1));
        assert_eq!(
            args.get::<u8>(3),
            Err(CallError::MissingArgument { index: 3 })
        );
        assert!(matches!(
            args.get::<String>(0),
            Err(CallError::ArgumentType { index: 0, .. })
        ));
    }

    #[test]
    fn tuple_returns_flatten() {
        let func = Func::from_fn(|a: i64| (a, a.to_string()));
        assert_eq!(func.signature().to_string(), "fn(i64) -> (i64, alloc::string::String)");
    }

    #[test]
    fn closures_returning_funcs_are_handlers() {
        let outer = Func::from_fn(|base: i64| Func::from_fn(move |x: i64| x + base));
        assert_eq!(outer.returns(), [TypeTag::of::<Func>()]);
        let inner = outer
            .call(vec![Value::new(10_i64)])
            .ok()
            .and_then(|values| values.first()?.get::<Func>());
        let Some(inner) = inner else {
            panic!("handler should return a Func");
        };
        let sum = inner.call(vec![Value::new(5_i64)]).ok();
        assert_eq!(sum.as_deref().and_then(first_i64), Some(15));
    }
}
