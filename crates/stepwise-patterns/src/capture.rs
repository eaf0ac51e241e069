//! Capture-group extraction for matched phrases.

use regex::Regex;

/// Return the capture groups of the first match of `re` in `text`, or `None`
/// when the phrase does not match.
///
/// Group 0 (the whole match) is dropped so the result lines up with the
/// pattern's own groups. A group that does not take part in the match yields
/// an empty string, keeping later groups at their positions.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use stepwise_patterns::extract_captured_values;
/// let regex = Regex::new(r"^I login as (\w+) (\d) times").expect("valid regex");
/// let values = extract_captured_values(&regex, "I login as Batman 2 times");
/// assert_eq!(values, Some(vec!["Batman".to_string(), "2".to_string()]));
/// assert_eq!(extract_captured_values(&regex, "I log out"), None);
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}
