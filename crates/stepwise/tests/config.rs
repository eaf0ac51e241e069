//! Tests for the process-wide match mode default.

use std::rc::Rc;

use serial_test::serial;
use stepwise::config::{clear_match_mode_override, match_mode, set_match_mode};
use stepwise::test_support::Recorder;
use stepwise::{Feature, MatchMode, Steps, Testing};

fn greeting_steps() -> Steps {
    let mut steps = Steps::new();
    steps.define("hello", |t: Rc<dyn Testing>| move || t.log("hi"));
    steps
}

#[test]
#[serial]
fn anchored_override_applies_to_new_registries() {
    set_match_mode(MatchMode::Anchored);
    let steps = greeting_steps();
    clear_match_mode_override();
    assert_eq!(steps.match_mode(), MatchMode::Anchored);

    let recorder = Recorder::shared();
    let feature = Feature::new(recorder.clone(), [steps]);
    feature.step("hello");
    feature.step("say hello");
    assert_eq!(recorder.logs(), ["hi"]);
    assert_eq!(recorder.fatals(), ["`say hello`: step not found"]);
}

#[test]
#[serial]
fn search_override_matches_substrings() {
    set_match_mode(MatchMode::Search);
    assert_eq!(match_mode(), MatchMode::Search);
    let recorder = Recorder::shared();
    let feature = Feature::new(recorder.clone(), [greeting_steps()]);
    clear_match_mode_override();
    feature.step("say hello there");
    assert_eq!(recorder.logs(), ["hi"]);
}
