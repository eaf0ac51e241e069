//! Binding of captured text and explicit values to a step body's parameters.
//!
//! A body may start with an `Rc<Step>` handle, which is always supplied by
//! the invoker. Every other parameter takes the next argument in order:
//! captured [`Param`]s are coerced to the parameter's type, explicit values
//! must already have it. Parameters left over once the arguments run out get
//! a zero value from the caller's lookup; surplus arguments are dropped.

use std::rc::Rc;

use thiserror::Error;

use crate::coerce::{CoercionError, coerce};
use crate::feature::Step;
use crate::param::Param;
use crate::value::{TypeTag, Value};

/// Failure to bind an argument to a step body parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindError {
    /// Captured text could not be converted to the parameter type.
    #[error("argument {index}: {source}")]
    Coercion {
        /// Zero-based parameter position.
        index: usize,
        /// Conversion failure.
        #[source]
        source: CoercionError,
    },
    /// An explicit value has a different type than the parameter.
    #[error("argument {index}: expected {expected}, got {got}")]
    Mismatch {
        /// Zero-based parameter position.
        index: usize,
        /// Parameter type.
        expected: &'static str,
        /// Supplied value type.
        got: &'static str,
    },
    /// No argument was supplied and the parameter type has no zero value.
    #[error("argument {index}: nothing supplied and {ty} has no zero value")]
    Missing {
        /// Zero-based parameter position.
        index: usize,
        /// Parameter type.
        ty: &'static str,
    },
}

/// One argument awaiting binding.
#[derive(Debug, Clone)]
pub(crate) enum Arg {
    /// Captured by the step pattern; coerced on binding.
    Param(Param),
    /// Supplied by the caller; bound as is.
    Value(Value),
}

/// Bind `args` to `params`, producing the handle with `handle` if the first
/// parameter asks for one and filling unsupplied parameters with `zero`.
pub(crate) fn bind<I, H, Z>(
    params: &[TypeTag],
    handle: H,
    zero: Z,
    args: I,
) -> Result<Vec<Value>, BindError>
where
    I: IntoIterator<Item = Arg>,
    H: FnOnce() -> Rc<Step>,
    Z: Fn(&TypeTag) -> Option<Value>,
{
    let mut bound = Vec::with_capacity(params.len());
    let wants_handle = params.first() == Some(&TypeTag::of::<Rc<Step>>());
    if wants_handle {
        bound.push(Value::new(handle()));
    }
    let mut args = args.into_iter();
    for (index, tag) in params.iter().enumerate().skip(usize::from(wants_handle)) {
        let value = match args.next() {
            Some(Arg::Param(param)) => {
                coerce(&param, tag).map_err(|source| BindError::Coercion { index, source })?
            }
            Some(Arg::Value(value)) if value.tag() == *tag => value,
            Some(Arg::Value(value)) => {
                return Err(BindError::Mismatch {
                    index,
                    expected: tag.name(),
                    got: value.type_name(),
                });
            }
            None => zero(tag).ok_or(BindError::Missing {
                index,
                ty: tag.name(),
            })?,
        };
        log::trace!("bound argument {index} as {tag}");
        bound.push(value);
    }
    Ok(bound)
}
