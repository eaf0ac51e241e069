//! Tests for step registration and lookup.

use super::*;
use crate::feature::Step;
use crate::value::TypeTag;
use rstest::{fixture, rstest};

fn noop_handler() -> Func {
    handler(|_t: Rc<dyn Testing>| || ())
}

#[fixture]
fn steps() -> Steps {
    let mut steps = Steps::with_match_mode(MatchMode::Search);
    steps
        .define(r"^I login as (\w+) (\d) times$", |_t: Rc<dyn Testing>| {
            |_: String, _: u8| ()
        })
        .define("a + b = 4", |_t: Rc<dyn Testing>| |_: i64, _: i64| ())
        .define(r"I wait( patiently)?", |_t: Rc<dyn Testing>| |_: String| ());
    steps
}

fn captures(steps: &Steps, phrase: &str) -> Option<Vec<String>> {
    steps
        .find(phrase)
        .map(|(_, params)| params.into_iter().map(Param::into_inner).collect())
}

#[rstest]
fn captures_groups_in_order(steps: Steps) {
    assert_eq!(
        captures(&steps, "I login as Batman 2 times"),
        Some(vec!["Batman".to_string(), "2".to_string()])
    );
}

#[rstest]
fn literal_pattern_text_selects_its_step(steps: Steps) {
    assert_eq!(captures(&steps, "a + b = 4"), Some(Vec::new()));
    assert_eq!(captures(&steps, "a + b = 5"), None);
}

#[rstest]
#[case("I wait patiently", " patiently")]
#[case("I wait", "")]
#[case("then I wait a bit", "")]
fn optional_groups_capture_empty_text(
    steps: Steps,
    #[case] phrase: &str,
    #[case] expected: &str,
) {
    assert_eq!(captures(&steps, phrase), Some(vec![expected.to_string()]));
}

fn body_params(handler: &Func) -> Vec<TypeTag> {
    validate(handler)
        .map(|body| body.params().to_vec())
        .unwrap_or_default()
}

#[rstest]
fn first_definition_wins(steps: Steps) {
    let mut steps = steps;
    steps.define(r"I wait", |_t: Rc<dyn Testing>| || ());
    let Some((handler, _)) = steps.find("I wait") else {
        panic!("a step should match");
    };
    assert_eq!(body_params(&handler), [TypeTag::of::<String>()]);
}

#[rstest]
fn find_counts_invocations(steps: Steps) {
    assert_eq!(steps.unused().len(), 3);
    let _ = steps.find("I wait");
    let _ = steps.find("I wait patiently");
    let _ = steps.find("nothing matches this");
    assert_eq!(
        steps.get(r"I wait( patiently)?").map(StepDef::invocations),
        Some(2)
    );
    assert_eq!(steps.unused(), [r"^I login as (\w+) (\d) times$", "a + b = 4"]);
}

#[rstest]
fn duplicates_are_rejected_and_original_kept(steps: Steps) {
    let mut steps = steps;
    let result = steps.try_add("a + b = 4", noop_handler());
    assert!(matches!(
        result,
        Err(RegistrationError::Duplicate { ref name }) if name == "a + b = 4"
    ));
    let params = steps.get("a + b = 4").map(|def| body_params(def.handler()));
    assert_eq!(
        params,
        Some(vec![TypeTag::of::<i64>(), TypeTag::of::<i64>()])
    );
}

#[test]
#[should_panic(expected = "step `twice` already exists")]
fn add_panics_on_duplicates() {
    let mut steps = Steps::new();
    steps.add("twice", noop_handler()).add("twice", noop_handler());
}

#[test]
#[should_panic(expected = "steps must implement fn(Rc<dyn Testing>) -> Func")]
fn add_panics_on_plain_functions() {
    Steps::new().add("plain", |_: u8| ());
}

#[test]
#[should_panic(expected = "Rc<Step> must be the first argument")]
fn add_panics_on_late_step_handle() {
    Steps::new().define("late", |_t: Rc<dyn Testing>| |_: u8, _: Rc<Step>| ());
}

#[test]
fn invalid_patterns_are_reported() {
    let mut steps = Steps::new();
    let result = steps.try_add("unclosed (", noop_handler());
    assert!(matches!(result, Err(RegistrationError::Pattern(_))));
    assert!(steps.is_empty());
}

#[test]
fn anchored_registries_need_whole_phrases() {
    let mut steps = Steps::with_match_mode(MatchMode::Anchored);
    steps.add("I wait", noop_handler());
    assert!(steps.find("I wait").is_some());
    assert!(steps.find("then I wait").is_none());
    assert_eq!(steps.match_mode(), MatchMode::Anchored);
}

#[rstest]
fn patterns_keep_registration_order(steps: Steps) {
    let patterns: Vec<_> = steps.patterns().collect();
    assert_eq!(
        patterns,
        [r"^I login as (\w+) (\d) times$", "a + b = 4", r"I wait( patiently)?"]
    );
    assert_eq!((&steps).into_iter().count(), 3);
}

#[test]
fn registered_zero_values_are_found_by_tag() {
    let mut steps = Steps::new();
    steps.register_zero::<Vec<u8>>();
    let zero = steps.zero_for(&TypeTag::of::<Vec<u8>>()).map(|zero| zero());
    assert_eq!(zero.and_then(|value| value.get::<Vec<u8>>()), Some(Vec::new()));
    assert!(steps.zero_for(&TypeTag::of::<Option<u8>>()).is_none());
}
