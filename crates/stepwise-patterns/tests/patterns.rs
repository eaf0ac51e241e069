//! Behavioural tests for pattern compilation and capture extraction.

use rstest::rstest;
use stepwise_patterns::{MatchMode, compile_pattern, extract_captured_values};

fn captures(pattern: &str, mode: MatchMode, phrase: &str) -> Option<Vec<String>> {
    let regex = compile_pattern(pattern, mode)
        .unwrap_or_else(|err| panic!("pattern `{pattern}` should compile: {err}"));
    extract_captured_values(&regex, phrase)
}

#[rstest]
#[case(MatchMode::Search, Some(vec!["Batman".to_string(), "2".to_string()]))]
#[case(MatchMode::Anchored, None)]
fn trailing_text_depends_on_mode(#[case] mode: MatchMode, #[case] expected: Option<Vec<String>>) {
    let phrase = "I login as Batman 2 times today";
    assert_eq!(
        captures(r"^I login as (\w+) (\d) times", mode, phrase),
        expected
    );
}

#[test]
fn short_pattern_shadows_longer_phrase_when_searching() {
    assert_eq!(
        captures("step", MatchMode::Search, "a longer step phrase"),
        Some(Vec::new())
    );
    assert_eq!(
        captures("step", MatchMode::Anchored, "a longer step phrase"),
        None
    );
}
