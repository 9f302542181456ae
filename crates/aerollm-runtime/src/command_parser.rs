//! Decode model output into a clamped [`ActuatorCommand`].
//!
//! The decoder is deliberately lenient about content and strict only about
//! syntax:
//!
//! - `//` line comments are stripped before parsing.
//! - Missing or unknown fields are ignored; missing fields read as `0`.
//! - A field with a non-numeric value reads as `0`; numeric strings such as
//!   `"0.5"` are accepted.
//! - Every field is clamped into its range (NaN becomes `0`).
//!
//! Only text that is not valid JSON, or JSON whose top level is not an
//! object, is rejected with [`PilotError::Parse`].

use aerollm_types::{ActuatorCommand, PilotError};
use serde_json::{Map, Value};

use crate::extract::extract_json_object;

/// Run the full reply pipeline: extract the JSON object, then parse it.
///
/// # Errors
///
/// [`PilotError::Extraction`] when the reply contains no `{ … }` candidate,
/// [`PilotError::Parse`] when the candidate is not a JSON object.
pub fn parse_reply(reply: &str) -> Result<ActuatorCommand, PilotError> {
    let candidate = extract_json_object(reply).ok_or(PilotError::Extraction)?;
    parse_command(candidate)
}

/// Parse a JSON object text into a clamped [`ActuatorCommand`].
///
/// # Errors
///
/// Returns [`PilotError::Parse`] when the text (after comment stripping) is
/// not syntactically valid JSON or is not an object.
pub fn parse_command(json_text: &str) -> Result<ActuatorCommand, PilotError> {
    let cleaned = strip_line_comments(json_text);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| PilotError::Parse(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(PilotError::Parse(format!(
            "expected a JSON object, found {}",
            kind_of(&value)
        )));
    };

    let command = ActuatorCommand {
        aileron: read_field(&fields, "aileron"),
        elevator: read_field(&fields, "elevator"),
        rudder: read_field(&fields, "rudder"),
        throttle: read_field(&fields, "throttle"),
        airbrake: read_field(&fields, "airbrake"),
        wheel_brakes: read_field(&fields, "wheelBrakes"),
    };
    Ok(command.clamped())
}

/// Truncate every line at its first `//` that is not inside a string
/// literal.
pub fn strip_line_comments(text: &str) -> String {
    text.lines()
        .map(|line| &line[..comment_start(line).unwrap_or(line.len())])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte offset of the first `//` outside a JSON string on this line.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            return Some(i);
        }
    }
    None
}

fn read_field(fields: &Map<String, Value>, name: &str) -> f32 {
    match fields.get(name) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
        Some(Value::String(s)) => s.trim().parse::<f32>().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_zero_command() {
        assert_eq!(parse_command("{}").unwrap(), ActuatorCommand::ZERO);
    }

    #[test]
    fn parses_all_fields() {
        let cmd = parse_command(
            r#"{"aileron":0.1,"elevator":-0.2,"rudder":0.3,"throttle":0.4,"airbrake":0.5,"wheelBrakes":0.6}"#,
        )
        .unwrap();
        assert!((cmd.aileron - 0.1).abs() < 1e-6);
        assert!((cmd.elevator + 0.2).abs() < 1e-6);
        assert!((cmd.rudder - 0.3).abs() < 1e-6);
        assert!((cmd.throttle - 0.4).abs() < 1e-6);
        assert!((cmd.airbrake - 0.5).abs() < 1e-6);
        assert!((cmd.wheel_brakes - 0.6).abs() < 1e-6);
    }

    #[test]
    fn inline_comment_is_ignored() {
        let cmd = parse_command("{\n\"aileron\": 0.5 // comment\n}").unwrap();
        assert_eq!(cmd.aileron, 0.5);
        assert_eq!(cmd.throttle, 0.0);
    }

    #[test]
    fn whole_line_comments_are_ignored() {
        let text = "{\n// bank left a little\n\"aileron\": -0.25,\n\"throttle\": 1 // full power\n}";
        let cmd = parse_command(text).unwrap();
        assert_eq!(cmd.aileron, -0.25);
        assert_eq!(cmd.throttle, 1.0);
    }

    #[test]
    fn slashes_inside_strings_are_not_comments() {
        assert_eq!(
            strip_line_comments(r#"{"note": "see http://x", "a": 1} // tail"#),
            r#"{"note": "see http://x", "a": 1} "#
        );
        assert_eq!(
            strip_line_comments(r#"{"q": "say \"//\" twice"} // c"#),
            r#"{"q": "say \"//\" twice"} "#
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cmd = parse_command(r#"{"aileron": 2.0, "elevator": -2.0, "throttle": -0.5}"#).unwrap();
        assert_eq!(cmd.aileron, 1.0);
        assert_eq!(cmd.elevator, -1.0);
        assert_eq!(cmd.throttle, 0.0);
    }

    #[test]
    fn huge_numbers_saturate() {
        let cmd = parse_command(r#"{"rudder": -1e300, "airbrake": 1e300}"#).unwrap();
        assert_eq!(cmd.rudder, -1.0);
        assert_eq!(cmd.airbrake, 1.0);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cmd = parse_command(r#"{"flaps": 0.9, "throttle": 0.3, "reason": "climb"}"#).unwrap();
        assert!((cmd.throttle - 0.3).abs() < 1e-6);
        assert_eq!(cmd.aileron, 0.0);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let cmd = parse_command(r#"{"throttle": " 0.75 "}"#).unwrap();
        assert_eq!(cmd.throttle, 0.75);
    }

    #[test]
    fn non_numeric_values_read_as_zero() {
        let cmd = parse_command(
            r#"{"aileron": "left", "elevator": true, "rudder": null, "throttle": [1], "airbrake": {"x": 1}}"#,
        )
        .unwrap();
        assert_eq!(cmd, ActuatorCommand::ZERO);
    }

    #[test]
    fn nan_string_reads_as_zero() {
        let cmd = parse_command(r#"{"aileron": "NaN", "throttle": "inf"}"#).unwrap();
        assert_eq!(cmd.aileron, 0.0);
        assert_eq!(cmd.throttle, 1.0);
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let cmd = parse_command(r#"{"Throttle": 0.9, "wheel_brakes": 0.9}"#).unwrap();
        assert_eq!(cmd, ActuatorCommand::ZERO);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(parse_command("{aileron: }"), Err(PilotError::Parse(_))));
        assert!(matches!(parse_command("{\"a\": 1,}"), Err(PilotError::Parse(_))));
    }

    #[test]
    fn non_object_is_a_parse_error() {
        let err = parse_command("[1, 2]").unwrap_err();
        assert!(matches!(&err, PilotError::Parse(msg) if msg.contains("array")));
    }

    #[test]
    fn parse_reply_extracts_then_parses() {
        let reply = "Pulling up now.\n```json\n{\"elevator\": 0.4, // nose up\n\"throttle\": 0.9}\n```";
        let cmd = parse_reply(reply).unwrap();
        assert!((cmd.elevator - 0.4).abs() < 1e-6);
        assert!((cmd.throttle - 0.9).abs() < 1e-6);
    }

    #[test]
    fn parse_reply_without_object_is_extraction_error() {
        assert!(matches!(
            parse_reply("I am unable to help with that."),
            Err(PilotError::Extraction)
        ));
    }

    #[test]
    fn parse_reply_with_broken_object_is_parse_error() {
        assert!(matches!(
            parse_reply("here: {\"throttle\": } done"),
            Err(PilotError::Parse(_))
        ));
    }
}
