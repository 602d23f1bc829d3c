//! Clean-up of model replies before they are trusted as JSON or HTML.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{BriefError, Result};

fn whole_reply_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A\s*```(?:json)?[ \t]*\n?(.*?)\n?```\s*\z")
            .expect("whole reply fence pattern is valid")
    })
}

// Fence lines must start a line, so backticks inside a JSON string never match
fn line_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ms)^```(?:json)?[ \t]*\n(.*?)\n```[ \t]*$")
            .expect("line fence pattern is valid")
    })
}

fn html_fence_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```(?:html)?\s*\n?").expect("html fence pattern is valid"))
}

fn html_fence_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\s*$").expect("html fence pattern is valid"))
}

/// Return the interior of the fenced code block wrapping the reply, or of
/// the first fenced block after a preamble. Text with no fence comes back
/// unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    whole_reply_fence()
        .captures(text)
        .or_else(|| line_fence().captures(text))
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

/// Remove a leading ```` ```html ```` and trailing ```` ``` ```` from a full
/// document reply. Replies that do not open with a fence are returned as-is.
pub fn strip_html_fence(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }
    let opened = html_fence_open().replace(text, "");
    html_fence_close().replace(&opened, "").into_owned()
}

/// Decode `payload` as `T`.
///
/// Text that is not JSON at all is `MalformedJson`; JSON of the wrong shape
/// is `SchemaMismatch`.
pub fn decode_json<T: DeserializeOwned>(stage: &'static str, payload: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|source| BriefError::MalformedJson { stage, source })?;
    serde_json::from_value(value).map_err(|e| BriefError::SchemaMismatch {
        stage,
        detail: e.to_string(),
    })
}

/// Fence-strip a model reply and decode it as `T`.
pub fn parse_json_reply<T: DeserializeOwned>(stage: &'static str, text: &str) -> Result<T> {
    decode_json(stage, strip_code_fence(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let reply = "```json\n{\"summary\": \"x\"}\n```";
        assert_eq!(strip_code_fence(reply), "{\"summary\": \"x\"}");
    }

    #[test]
    fn test_strip_bare_fence() {
        let reply = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fence(reply), "[1, 2]");
    }

    #[test]
    fn test_fence_with_preamble() {
        let reply = "Here is the brief:\n\n```json\n{\"a\": 1}\n```\nEnjoy.";
        assert_eq!(strip_code_fence(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_no_fence_is_unchanged() {
        let reply = "  {\"a\": 1}\n";
        assert_eq!(strip_code_fence(reply), reply);
    }

    #[test]
    fn test_one_line_fence() {
        assert_eq!(strip_code_fence("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_backticks_inside_unfenced_json_are_kept() {
        let reply = r#"{"summary": "Devs debate ```json``` fences"}"#;
        assert_eq!(strip_code_fence(reply), reply);
    }

    #[test]
    fn test_backticks_inside_fenced_json_are_kept() {
        let reply = "```json\n{\"summary\": \"Use ```rust``` blocks\"}\n```";
        assert_eq!(
            strip_code_fence(reply),
            "{\"summary\": \"Use ```rust``` blocks\"}"
        );
    }

    #[test]
    fn test_preamble_fence_with_inline_backticks() {
        let reply = "Here you go:\n```json\n{\"a\": \"x ```y``` z\"}\n```\nDone.";
        assert_eq!(strip_code_fence(reply), "{\"a\": \"x ```y``` z\"}");
    }

    #[test]
    fn test_decode_json_does_not_strip() {
        let err = decode_json::<Vec<u32>>("saved brief", "```json\n[1]\n```").unwrap_err();
        assert!(matches!(err, BriefError::MalformedJson { stage: "saved brief", .. }));
    }

    #[test]
    fn test_strip_html_fence() {
        let reply = "```html\n<!DOCTYPE html>\n<html></html>\n```";
        assert_eq!(strip_html_fence(reply), "<!DOCTYPE html>\n<html></html>");
    }

    #[test]
    fn test_html_without_fence_is_unchanged() {
        let reply = "<!DOCTYPE html>\n<html></html>";
        assert_eq!(strip_html_fence(reply), reply);
    }

    #[test]
    fn test_parse_reply_malformed() {
        let err = parse_json_reply::<Vec<u32>>("brief", "```json\n{not json\n```").unwrap_err();
        assert!(matches!(err, BriefError::MalformedJson { stage: "brief", .. }));
    }

    #[test]
    fn test_parse_reply_schema_mismatch() {
        let err = parse_json_reply::<Vec<u32>>("brief", "{\"a\": 1}").unwrap_err();
        assert!(matches!(err, BriefError::SchemaMismatch { stage: "brief", .. }));
    }

    #[test]
    fn test_parse_reply_ok() {
        let values: Vec<u32> = parse_json_reply("narration", "```json\n[1, 2, 3]\n```").unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
