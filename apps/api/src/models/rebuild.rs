use serde::{Deserialize, Serialize};

/// Contact block of a rebuilt resume. The object is always present; each
/// field is only filled when the source resume carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub company: String,
    pub title: String,
    pub dates: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub school: String,
    pub degree: String,
    #[serde(default)]
    pub year: Option<String>,
}

/// A rewritten resume. Structure only: factual fidelity to the source is
/// asked of the model in the prompt and cannot be checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuiltDocument {
    pub name: String,
    /// Professional headline.
    pub title: String,
    pub contact: Contact,
    pub summary: String,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub skills: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_fields_default_to_none() {
        let contact: Contact = serde_json::from_str(r#"{"email": "jane@example.com"}"#).unwrap();
        assert_eq!(contact.email.as_deref(), Some("jane@example.com"));
        assert!(contact.phone.is_none());
        assert!(contact.linkedin.is_none());
    }

    #[test]
    fn test_rebuilt_document_requires_contact_object() {
        let json = r#"{
            "name": "Jane Doe",
            "title": "Backend Engineer",
            "summary": "Builds payment systems.",
            "experience": [],
            "education": [],
            "skills": []
        }"#;
        assert!(serde_json::from_str::<RebuiltDocument>(json).is_err());
    }
}
