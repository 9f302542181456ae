//! Locate a JSON object inside free-form model output.
//!
//! Models like to wrap their answer in prose or Markdown fences.  This is a
//! heuristic, not a parser: it takes everything from the first `{` to the
//! last `}` and leaves validation to [`parse_command`][crate::command_parser::parse_command].

/// Return the substring from the first `{` to the last `}` inclusive.
///
/// Returns `None` when either brace is missing or the last `}` comes before
/// the first `{`.
///
/// ```rust
/// use aerollm_runtime::extract::extract_json_object;
///
/// assert_eq!(extract_json_object(r#"blah {"a":1} blah"#), Some(r#"{"a":1}"#));
/// assert_eq!(extract_json_object("no braces here"), None);
/// ```
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    // Both braces are single-byte, so the slice is on char boundaries.
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        assert_eq!(
            extract_json_object("blah {\"a\":1} blah"),
            Some("{\"a\":1}")
        );
    }

    #[test]
    fn no_braces_yields_none() {
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn reversed_braces_yield_none() {
        assert_eq!(extract_json_object("} then {"), None);
    }

    #[test]
    fn single_brace_yields_none() {
        assert_eq!(extract_json_object("only an opening {"), None);
        assert_eq!(extract_json_object("only a closing }"), None);
    }

    #[test]
    fn spans_first_open_to_last_close() {
        let text = "x {\"a\":{\"b\":2}} y } z";
        assert_eq!(extract_json_object(text), Some("{\"a\":{\"b\":2}} y }"));
    }

    #[test]
    fn strips_markdown_code_fence() {
        let reply = "Sure!\n```json\n{\"throttle\": 0.7}\n```\nGood luck.";
        assert_eq!(extract_json_object(reply), Some("{\"throttle\": 0.7}"));
    }

    #[test]
    fn handles_multibyte_text_around_object() {
        let reply = "→ réponse: {\"rudder\": -0.1} ✓";
        assert_eq!(extract_json_object(reply), Some("{\"rudder\": -0.1}"));
    }
}
