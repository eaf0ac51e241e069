//! Handler shape validation.

use std::rc::Rc;

use thiserror::Error;

use crate::feature::Step;
use crate::func::{CallError, Func};
use crate::testing::{self, Testing};
use crate::value::{TypeTag, Value};

/// Why a handler cannot be used as a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ShapeError {
    /// The handler does not take exactly one `Rc<dyn Testing>`.
    #[error("steps must implement fn(Rc<dyn Testing>) -> Func")]
    NotTestingFunc,
    /// The handler does not return exactly one `Func`.
    #[error("steps must return a single Func")]
    NotSingleFunc,
    /// The step body takes the step handle by value.
    #[error("Step must be taken as Rc<Step>")]
    StepByValue,
    /// The step body takes the step handle after other parameters.
    #[error("Rc<Step> must be the first argument (found at position {index})")]
    StepNotFirst {
        /// Zero-based parameter position of the handle.
        index: usize,
    },
    /// Producing the step body failed.
    #[error("handler failed: {0}")]
    Handler(#[from] CallError),
}

/// Check `handler` and return the body it produces for the inert capability.
pub(crate) fn validate(handler: &Func) -> Result<Func, ShapeError> {
    if handler.params() != [TypeTag::of::<Rc<dyn Testing>>()] {
        return Err(ShapeError::NotTestingFunc);
    }
    if handler.returns() != [TypeTag::of::<Func>()] {
        return Err(ShapeError::NotSingleFunc);
    }
    let body = handler
        .call(vec![Value::new(testing::reference())])?
        .first()
        .and_then(Value::get::<Func>)
        .ok_or(ShapeError::NotSingleFunc)?;
    check_body(body.params())?;
    Ok(body)
}

fn check_body(params: &[TypeTag]) -> Result<(), ShapeError> {
    let by_value = TypeTag::of::<Step>();
    let handle = TypeTag::of::<Rc<Step>>();
    for (index, tag) in params.iter().enumerate() {
        if index == 0 && *tag == by_value {
            return Err(ShapeError::StepByValue);
        }
        if index > 0 && (*tag == handle || *tag == by_value) {
            return Err(ShapeError::StepNotFirst { index });
        }
    }
    Ok(())
}
