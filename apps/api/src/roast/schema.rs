//! Schema descriptors for the structured results the model is asked to produce.
//!
//! A descriptor is a static field table checked against the parsed reply
//! before typed deserialization, so a violation names the exact field path
//! instead of surfacing as an opaque serde message.

use serde::de::DeserializeOwned;

use crate::models::analysis::{AnalysisResult, Severity};
use crate::models::rebuild::RebuiltDocument;

/// Expected shape of one JSON value.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Required string.
    Text,
    /// String, `null`, or absent.
    OptionalText,
    /// Integer in 0–100.
    Score,
    /// String drawn from a closed set.
    OneOf(&'static [&'static str]),
    /// Array of strings (may be empty).
    TextList,
    /// Nested object.
    Object(&'static [Field]),
    /// Array of objects with at least `min_items` elements.
    ObjectList {
        fields: &'static [Field],
        min_items: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// A result type the extractor can produce from a free-text model reply.
pub trait ResultSchema: DeserializeOwned {
    /// Human-readable schema name used in error messages and logs.
    const NAME: &'static str;
    /// Top-level field table, checked in order.
    const FIELDS: &'static [Field];
}

const FINDING_FIELDS: &[Field] = &[
    field("severity", FieldKind::OneOf(&Severity::ALL)),
    field("title", FieldKind::Text),
    field("issue", FieldKind::Text),
    field("fix", FieldKind::Text),
];

const BULLET_REWRITE_FIELDS: &[Field] = &[
    field("original", FieldKind::Text),
    field("improved", FieldKind::Text),
];

impl ResultSchema for AnalysisResult {
    const NAME: &'static str = "AnalysisResult";
    const FIELDS: &'static [Field] = &[
        field("overallScore", FieldKind::Score),
        field("verdict", FieldKind::Text),
        field("summary", FieldKind::Text),
        field(
            "roasts",
            FieldKind::ObjectList {
                fields: FINDING_FIELDS,
                min_items: 1,
            },
        ),
        field("strengths", FieldKind::TextList),
        field("missingKeywords", FieldKind::TextList),
        field("atsScore", FieldKind::Score),
        field("atsIssues", FieldKind::TextList),
        field(
            "rewrittenBullets",
            FieldKind::ObjectList {
                fields: BULLET_REWRITE_FIELDS,
                min_items: 0,
            },
        ),
    ];
}

const CONTACT_FIELDS: &[Field] = &[
    field("email", FieldKind::OptionalText),
    field("phone", FieldKind::OptionalText),
    field("linkedin", FieldKind::OptionalText),
    field("location", FieldKind::OptionalText),
];

const EXPERIENCE_FIELDS: &[Field] = &[
    field("company", FieldKind::Text),
    field("title", FieldKind::Text),
    field("dates", FieldKind::Text),
    field("bullets", FieldKind::TextList),
];

const EDUCATION_FIELDS: &[Field] = &[
    field("school", FieldKind::Text),
    field("degree", FieldKind::Text),
    field("year", FieldKind::OptionalText),
];

impl ResultSchema for RebuiltDocument {
    const NAME: &'static str = "RebuiltDocument";
    const FIELDS: &'static [Field] = &[
        field("name", FieldKind::Text),
        field("title", FieldKind::Text),
        field("contact", FieldKind::Object(CONTACT_FIELDS)),
        field("summary", FieldKind::Text),
        field(
            "experience",
            FieldKind::ObjectList {
                fields: EXPERIENCE_FIELDS,
                min_items: 0,
            },
        ),
        field(
            "education",
            FieldKind::ObjectList {
                fields: EDUCATION_FIELDS,
                min_items: 0,
            },
        ),
        field("skills", FieldKind::TextList),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_fields_cover_every_struct_key() {
        let names: Vec<_> = AnalysisResult::FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "overallScore",
                "verdict",
                "summary",
                "roasts",
                "strengths",
                "missingKeywords",
                "atsScore",
                "atsIssues",
                "rewrittenBullets"
            ]
        );
    }

    #[test]
    fn test_roasts_must_be_non_empty() {
        let roasts = AnalysisResult::FIELDS
            .iter()
            .find(|f| f.name == "roasts")
            .unwrap();
        assert!(matches!(roasts.kind, FieldKind::ObjectList { min_items: 1, .. }));
    }

    #[test]
    fn test_rebuild_contact_is_a_required_object() {
        let contact = RebuiltDocument::FIELDS
            .iter()
            .find(|f| f.name == "contact")
            .unwrap();
        assert!(matches!(contact.kind, FieldKind::Object(_)));
    }
}
