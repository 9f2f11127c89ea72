//! Response Extractor: pulls a JSON object out of a free-text model reply
//! and checks it against a [`ResultSchema`] before handing back a typed value.
//!
//! Span detection is the first `{` to the last `}`. This tolerates prose the
//! model adds before or after the object, but will mis-bracket a reply that
//! contains two separate JSON fragments; such replies fail to parse and are
//! reported as `NoJsonFound` rather than guessed at.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::roast::schema::{Field, FieldKind, ResultSchema};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No JSON object found in model reply")]
    NoJsonFound,

    #[error("Model reply violates {schema} at '{field}': {reason}")]
    SchemaViolation {
        schema: &'static str,
        field: String,
        reason: String,
    },
}

impl ExtractionError {
    /// Offending field path for schema violations.
    pub fn field(&self) -> Option<&str> {
        match self {
            ExtractionError::NoJsonFound => None,
            ExtractionError::SchemaViolation { field, .. } => Some(field),
        }
    }
}

/// Returns the candidate span from the first `{` to the last `}` inclusive.
pub fn locate_json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

/// Locates, parses and validates the JSON payload in `reply` as `T`.
///
/// Missing fields are never defaulted: absence is a violation.
pub fn extract_and_validate<T: ResultSchema>(reply: &str) -> Result<T, ExtractionError> {
    let span = locate_json_span(reply).ok_or(ExtractionError::NoJsonFound)?;
    let value: Value = serde_json::from_str(span).map_err(|_| ExtractionError::NoJsonFound)?;
    validate_value(value)
}

/// Checks an already-parsed value against `T`'s schema and converts it.
pub fn validate_value<T: ResultSchema>(value: Value) -> Result<T, ExtractionError> {
    let object = value.as_object().ok_or(ExtractionError::NoJsonFound)?;

    check_fields(object, T::FIELDS, "").map_err(|(field, reason)| {
        ExtractionError::SchemaViolation {
            schema: T::NAME,
            field,
            reason,
        }
    })?;

    serde_json::from_value(value).map_err(|e| ExtractionError::SchemaViolation {
        schema: T::NAME,
        field: "<root>".to_string(),
        reason: e.to_string(),
    })
}

type Violation = (String, String);

fn check_fields(object: &Map<String, Value>, fields: &[Field], prefix: &str) -> Result<(), Violation> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        match object.get(field.name) {
            None if matches!(field.kind, FieldKind::OptionalText) => {}
            None => return Err((path, "required field is missing".to_string())),
            Some(value) => check_value(value, field.kind, &path)?,
        }
    }
    Ok(())
}

fn check_value(value: &Value, kind: FieldKind, path: &str) -> Result<(), Violation> {
    let fail = |reason: &str| -> Result<(), Violation> { Err((path.to_string(), reason.to_string())) };

    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                return fail("expected a string");
            }
        }
        FieldKind::OptionalText => {
            if !(value.is_string() || value.is_null()) {
                return fail("expected a string or null");
            }
        }
        FieldKind::Score => match value {
            Value::Number(n) => match n.as_u64() {
                Some(score) if score <= 100 => {}
                Some(_) => return fail("score must be between 0 and 100"),
                None if n.is_i64() => return fail("score must be between 0 and 100"),
                None => return fail("score must be an integer"),
            },
            _ => return fail("expected a numeric score"),
        },
        FieldKind::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => {}
            Some(_) => return Err((path.to_string(), format!("expected one of {}", allowed.join("|")))),
            None => return fail("expected a string"),
        },
        FieldKind::TextList => {
            let items = match value.as_array() {
                Some(items) => items,
                None => return fail("expected an array of strings"),
            };
            if let Some(idx) = items.iter().position(|item| !item.is_string()) {
                return Err((format!("{path}[{idx}]"), "expected a string".to_string()));
            }
        }
        FieldKind::Object(fields) => match value.as_object() {
            Some(object) => check_fields(object, fields, path)?,
            None => return fail("expected an object"),
        },
        FieldKind::ObjectList { fields, min_items } => {
            let items = match value.as_array() {
                Some(items) => items,
                None => return fail("expected an array"),
            };
            if items.len() < min_items {
                return Err((
                    path.to_string(),
                    format!("expected at least {min_items} item(s)"),
                ));
            }
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{idx}]");
                match item.as_object() {
                    Some(object) => check_fields(object, fields, &item_path)?,
                    None => return Err((item_path, "expected an object".to_string())),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::{AnalysisResult, Severity};
    use crate::models::rebuild::RebuiltDocument;
    use crate::test_support::{analysis_json, rebuild_json};

    fn violation_field<T: ResultSchema + std::fmt::Debug>(reply: &str) -> String {
        match extract_and_validate::<T>(reply) {
            Err(ExtractionError::SchemaViolation { field, .. }) => field,
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    fn analysis_without(key: &str) -> String {
        let mut value = analysis_json();
        value.as_object_mut().unwrap().remove(key);
        value.to_string()
    }

    fn analysis_with(key: &str, replacement: Value) -> String {
        let mut value = analysis_json();
        value[key] = replacement;
        value.to_string()
    }

    #[test]
    fn test_locate_span_ignores_surrounding_prose() {
        let reply = "Sure! Here it is: {\"a\": {\"b\": 1}} Hope this helps!";
        assert_eq!(locate_json_span(reply), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_locate_span_requires_open_before_close() {
        assert_eq!(locate_json_span("} nothing {"), None);
        assert_eq!(locate_json_span("no braces here"), None);
        assert_eq!(locate_json_span("{"), None);
    }

    #[test]
    fn test_extracts_analysis_wrapped_in_prose() {
        let reply = format!("Sure! {} Hope this helps!", analysis_json());
        let result: AnalysisResult = extract_and_validate(&reply).unwrap();
        assert_eq!(result.overall_score, 72);
        assert_eq!(result.roasts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_extracts_analysis_inside_code_fence() {
        let reply = format!("```json\n{}\n```", analysis_json());
        assert!(extract_and_validate::<AnalysisResult>(&reply).is_ok());
    }

    #[test]
    fn test_reply_without_brace_is_no_json_found() {
        let err = extract_and_validate::<AnalysisResult>("I cannot review this resume.").unwrap_err();
        assert_eq!(err, ExtractionError::NoJsonFound);
    }

    #[test]
    fn test_unparseable_span_is_no_json_found() {
        let err = extract_and_validate::<AnalysisResult>("{overallScore: 72,}").unwrap_err();
        assert_eq!(err, ExtractionError::NoJsonFound);
    }

    #[test]
    fn test_two_fragments_mis_bracket_and_fail() {
        let reply = r#"{"draft": true} and then {"overallScore": 72}"#;
        assert_eq!(
            extract_and_validate::<AnalysisResult>(reply).unwrap_err(),
            ExtractionError::NoJsonFound
        );
    }

    #[test]
    fn test_wrong_score_type_is_schema_violation() {
        let field = violation_field::<AnalysisResult>(r#"{"overallScore": "high"}"#);
        assert_eq!(field, "overallScore");
    }

    #[test]
    fn test_missing_roasts_is_schema_violation() {
        let field = violation_field::<AnalysisResult>(&analysis_without("roasts"));
        assert_eq!(field, "roasts");
    }

    #[test]
    fn test_empty_roasts_is_schema_violation() {
        let field = violation_field::<AnalysisResult>(&analysis_with("roasts", serde_json::json!([])));
        assert_eq!(field, "roasts");
    }

    #[test]
    fn test_score_out_of_range_is_schema_violation() {
        assert_eq!(
            violation_field::<AnalysisResult>(&analysis_with("atsScore", serde_json::json!(101))),
            "atsScore"
        );
        assert_eq!(
            violation_field::<AnalysisResult>(&analysis_with("overallScore", serde_json::json!(-3))),
            "overallScore"
        );
    }

    #[test]
    fn test_fractional_score_is_schema_violation() {
        let field = violation_field::<AnalysisResult>(&analysis_with("overallScore", serde_json::json!(72.5)));
        assert_eq!(field, "overallScore");
    }

    #[test]
    fn test_boundary_scores_are_accepted() {
        let mut value = analysis_json();
        value["overallScore"] = serde_json::json!(0);
        value["atsScore"] = serde_json::json!(100);
        let result: AnalysisResult = extract_and_validate(&value.to_string()).unwrap();
        assert_eq!((result.overall_score, result.ats_score), (0, 100));
    }

    #[test]
    fn test_unknown_severity_names_nested_path() {
        let mut value = analysis_json();
        value["roasts"][1]["severity"] = serde_json::json!("catastrophic");
        let field = violation_field::<AnalysisResult>(&value.to_string());
        assert_eq!(field, "roasts[1].severity");
    }

    #[test]
    fn test_non_string_list_item_names_index() {
        let field = violation_field::<AnalysisResult>(&analysis_with(
            "strengths",
            serde_json::json!(["Clear layout", 7]),
        ));
        assert_eq!(field, "strengths[1]");
    }

    #[test]
    fn test_null_required_text_is_not_defaulted() {
        let field = violation_field::<AnalysisResult>(&analysis_with("verdict", Value::Null));
        assert_eq!(field, "verdict");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let reply = analysis_with("confidence", serde_json::json!("high"));
        assert!(extract_and_validate::<AnalysisResult>(&reply).is_ok());
    }

    #[test]
    fn test_extracts_rebuilt_document() {
        let reply = format!("Here is the rewrite:\n{}", rebuild_json());
        let doc: RebuiltDocument = extract_and_validate(&reply).unwrap();
        assert_eq!(doc.name, "Jane Doe");
        assert_eq!(doc.contact.linkedin, None);
        assert_eq!(doc.experience[0].bullets.len(), 2);
    }

    #[test]
    fn test_rebuild_contact_fields_may_be_absent() {
        let mut value = rebuild_json();
        value["contact"] = serde_json::json!({});
        assert!(extract_and_validate::<RebuiltDocument>(&value.to_string()).is_ok());
    }

    #[test]
    fn test_rebuild_missing_contact_is_violation() {
        let mut value = rebuild_json();
        value.as_object_mut().unwrap().remove("contact");
        assert_eq!(violation_field::<RebuiltDocument>(&value.to_string()), "contact");
    }

    #[test]
    fn test_rebuild_contact_wrong_type_names_nested_path() {
        let mut value = rebuild_json();
        value["contact"]["phone"] = serde_json::json!(5551234);
        assert_eq!(violation_field::<RebuiltDocument>(&value.to_string()), "contact.phone");
    }

    #[test]
    fn test_validate_value_rejects_non_object() {
        let err = validate_value::<AnalysisResult>(serde_json::json!([1, 2])).unwrap_err();
        assert_eq!(err, ExtractionError::NoJsonFound);
    }

    #[test]
    fn test_error_field_accessor() {
        assert_eq!(ExtractionError::NoJsonFound.field(), None);
        let err = ExtractionError::SchemaViolation {
            schema: "AnalysisResult",
            field: "roasts".to_string(),
            reason: "required field is missing".to_string(),
        };
        assert_eq!(err.field(), Some("roasts"));
        assert!(err.to_string().contains("roasts"));
    }
}
