//! Structured references and their display rendering.
//!
//! A reference is an ordered path of typed segments naming a location in a
//! nested document, in the same `{"type": ..., "value": ...}` term encoding
//! the OPA AST uses. Rendering produces the dotted/bracketed form shown in
//! UI pick-lists, for example `input.a["b-c"][0]`.

use serde::{Deserialize, Serialize};

/// Errors from rendering a reference.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    #[error("cannot format an empty reference")]
    Empty,
}

/// One segment of a reference path.
///
/// Deserializes directly from an OPA AST term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RefSegment {
    Var(String),
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
}

impl RefSegment {
    // Verbatim rendering for the root position; never quoted.
    fn root_text(&self) -> String {
        match self {
            RefSegment::Var(value) | RefSegment::String(value) => value.clone(),
            RefSegment::Number(value) => value.to_string(),
            RefSegment::Boolean(value) => value.to_string(),
            RefSegment::Null => "null".to_string(),
        }
    }

    // JSON-encoded rendering for the bracketed position.
    fn bracket_text(&self) -> String {
        match self {
            RefSegment::Var(value) | RefSegment::String(value) => {
                serde_json::Value::String(value.clone()).to_string()
            }
            RefSegment::Number(value) => value.to_string(),
            RefSegment::Boolean(value) => value.to_string(),
            RefSegment::Null => "null".to_string(),
        }
    }
}

/// Render a reference as a display string.
///
/// The first segment is rendered verbatim. Each later segment renders as
/// `.name` when it is an identifier-safe string (`[A-Za-z_][A-Za-z0-9_]*`)
/// and as a bracketed JSON-encoded value otherwise. An empty reference is
/// rejected.
pub fn format_ref(segments: &[RefSegment]) -> Result<String, RefError> {
    let (head, tail) = segments.split_first().ok_or(RefError::Empty)?;
    let mut out = head.root_text();
    for segment in tail {
        match segment {
            RefSegment::String(value) if is_identifier(value) => {
                out.push('.');
                out.push_str(value);
            }
            other => {
                out.push('[');
                out.push_str(&other.bracket_text());
                out.push(']');
            }
        }
    }
    Ok(out)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: u64) -> RefSegment {
        RefSegment::Number(serde_json::Number::from(n))
    }

    #[test]
    fn dotted_and_bracketed_segments() {
        let segments = [
            RefSegment::Var("input".to_string()),
            RefSegment::String("a".to_string()),
            RefSegment::String("b-c".to_string()),
            num(0),
        ];
        assert_eq!(format_ref(&segments).unwrap(), "input.a[\"b-c\"][0]");
    }

    #[test]
    fn root_is_rendered_verbatim() {
        // Even an identifier-unsafe root is not quoted.
        let segments = [
            RefSegment::String("b-c".to_string()),
            RefSegment::String("x".to_string()),
        ];
        assert_eq!(format_ref(&segments).unwrap(), "b-c.x");
    }

    #[test]
    fn only_string_segments_take_dot_form() {
        let segments = [
            RefSegment::Var("data".to_string()),
            RefSegment::Var("x".to_string()),
            RefSegment::Boolean(true),
            RefSegment::Null,
        ];
        assert_eq!(format_ref(&segments).unwrap(), "data[\"x\"][true][null]");
    }

    #[test]
    fn underscore_leading_identifier_is_dot_safe() {
        let segments = [
            RefSegment::Var("input".to_string()),
            RefSegment::String("_x1".to_string()),
            RefSegment::String("1x".to_string()),
        ];
        assert_eq!(format_ref(&segments).unwrap(), "input._x1[\"1x\"]");
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert!(matches!(format_ref(&[]), Err(RefError::Empty)));
    }

    #[test]
    fn segments_deserialize_from_ast_terms() {
        let raw = r#"[
            {"type": "var", "value": "input"},
            {"type": "string", "value": "user"},
            {"type": "number", "value": 3}
        ]"#;
        let segments: Vec<RefSegment> = serde_json::from_str(raw).unwrap();
        assert_eq!(format_ref(&segments).unwrap(), "input.user[3]");
    }
}
