//! Setup routines and the teardowns they leave behind.
//!
//! Setup routines run in order against a [`Feature`]; each may hand back a
//! teardown. [`Teardown::run`] executes the collected teardowns in the same
//! order their setups ran. Failures go through the feature's capability, so
//! there is no error channel here.

use std::fmt;

use crate::feature::Feature;

/// Undo work done by a setup routine.
pub type TeardownFn = Box<dyn FnOnce()>;

/// Prepare a feature, optionally returning the matching teardown.
pub type SetupFn = Box<dyn FnOnce(&Feature) -> Option<TeardownFn>>;

/// Box a setup routine that always returns a teardown.
///
/// # Examples
///
/// ```
/// use stepwise::{Feature, Steps, setup_fn, setup_only};
/// use stepwise::test_support::Recorder;
///
/// let recorder = Recorder::shared();
/// let feature = Feature::new(recorder.clone(), Vec::<Steps>::new());
/// let teardown = feature.setup([
///     setup_fn(|feature: &Feature| {
///         feature.set_context_value("db", String::from("open"));
///         let feature = feature.clone();
///         move || {
///             feature.set_context_value("db", String::from("closed"));
///         }
///     }),
///     setup_only(|feature: &Feature| {
///         feature.set_context_value("seeded", true);
///     }),
/// ]);
/// assert_eq!(teardown.len(), 1);
/// teardown.run();
/// assert_eq!(feature.context_value::<String>("db").as_deref(), Some("closed"));
/// ```
pub fn setup_fn<F, T>(setup: F) -> SetupFn
where
    F: FnOnce(&Feature) -> T + 'static,
    T: FnOnce() + 'static,
{
    Box::new(move |feature: &Feature| Some(Box::new(setup(feature)) as TeardownFn))
}

/// Box a setup routine that needs no teardown.
pub fn setup_only<F>(setup: F) -> SetupFn
where
    F: FnOnce(&Feature) + 'static,
{
    Box::new(move |feature: &Feature| {
        setup(feature);
        None
    })
}

/// Teardowns collected by [`Feature::setup`], pending execution.
#[must_use = "teardowns only run when `run` is called"]
#[derive(Default)]
pub struct Teardown {
    routines: Vec<TeardownFn>,
}

impl Teardown {
    pub(crate) fn collect<I>(feature: &Feature, routines: I) -> Self
    where
        I: IntoIterator<Item = SetupFn>,
    {
        let routines: Vec<_> = routines
            .into_iter()
            .filter_map(|setup| setup(feature))
            .collect();
        log::debug!("setup complete with {} teardown(s)", routines.len());
        Self { routines }
    }

    /// Number of pending teardowns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Whether there is nothing to tear down.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Run every teardown in setup order.
    pub fn run(self) {
        for teardown in self.routines {
            teardown();
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("pending", &self.routines.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Steps;
    use crate::test_support::Recorder;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn feature() -> Feature {
        Feature::new(Recorder::shared(), Vec::<Steps>::new())
    }

    #[test]
    fn setups_run_in_order_and_teardowns_fifo() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let routines = (1..=3).map(|n| {
            let order = Rc::clone(&order);
            setup_fn(move |_: &Feature| {
                order.borrow_mut().push(format!("setup {n}"));
                move || order.borrow_mut().push(format!("teardown {n}"))
            })
        });
        let teardown = feature().setup(routines);
        assert_eq!(teardown.len(), 3);
        teardown.run();
        assert_eq!(
            *order.borrow(),
            [
                "setup 1",
                "setup 2",
                "setup 3",
                "teardown 1",
                "teardown 2",
                "teardown 3",
            ]
        );
    }

    #[test]
    fn routines_without_teardown_are_skipped() {
        let ran = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&ran);
        let teardown = feature().setup([setup_only(move |_: &Feature| {
            *counter.borrow_mut() += 1;
        })]);
        assert!(teardown.is_empty());
        teardown.run();
        assert_eq!(*ran.borrow(), 1);
    }

    #[test]
    fn setups_see_the_feature() {
        let feature = feature();
        let teardown = feature.setup([setup_only(|feature: &Feature| {
            feature.set_context_value("ready", true);
        })]);
        teardown.run();
        assert_eq!(feature.context_value::<bool>("ready"), Some(true));
    }
}
