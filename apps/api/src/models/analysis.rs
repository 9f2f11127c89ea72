use serde::{Deserialize, Serialize};

/// Severity of a single finding, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Suggestion,
}

impl Severity {
    pub const ALL: [&'static str; 4] = ["critical", "major", "minor", "suggestion"];
}

/// One critique item ("roast").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub title: String,
    pub issue: String,
    pub fix: String,
}

/// A weak bullet from the source and its stronger rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletRewrite {
    pub original: String,
    pub improved: String,
}

/// Structured critique of a resume.
///
/// Scores are integers in 0–100 and `roasts` is never empty once this value
/// has passed the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: u8,
    pub verdict: String,
    pub summary: String,
    pub roasts: Vec<Finding>,
    pub strengths: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub ats_score: u8,
    pub ats_issues: Vec<String>,
    pub rewritten_bullets: Vec<BulletRewrite>,
}
