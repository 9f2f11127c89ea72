//! Fixtures shared by unit tests across modules.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm_client::{InvocationError, ModelInvoker};
use crate::models::analysis::AnalysisResult;

pub const SAMPLE_RESUME: &str = "Jane Doe | jane@example.com | Austin, TX\n\
    Backend Engineer, Acme Payments (2019-2024)\n\
    - Worked on the payment processing service\n\
    - Helped migrate batch jobs to Kubernetes\n\
    Education: B.S. Computer Science, University of Texas, 2019\n\
    Skills: Rust, Go, PostgreSQL, Kafka";

/// A complete, valid analysis reply body.
pub fn analysis_json() -> Value {
    json!({
        "overallScore": 72,
        "verdict": "Strong Foundation",
        "summary": "Relevant experience undersold by vague bullets. Quantify outcomes.",
        "roasts": [
            {
                "severity": "critical",
                "title": "Zero measurable outcomes",
                "issue": "No bullet states a result.",
                "fix": "Add throughput, latency, or cost numbers."
            },
            {
                "severity": "major",
                "title": "Passive verbs everywhere",
                "issue": "'Worked on' and 'Helped' hide ownership.",
                "fix": "Lead with what you built or changed."
            },
            {
                "severity": "minor",
                "title": "Missing summary line",
                "issue": "Recruiters get no headline.",
                "fix": "Add a two-line professional summary."
            },
            {
                "severity": "suggestion",
                "title": "Skills list lacks grouping",
                "issue": "Languages and tools are mixed.",
                "fix": "Split into Languages and Infrastructure."
            }
        ],
        "strengths": ["Relevant stack", "Clear chronology"],
        "missingKeywords": ["distributed systems", "observability", "CI/CD"],
        "atsScore": 65,
        "atsIssues": ["Pipe-separated contact line"],
        "rewrittenBullets": [
            {
                "original": "Worked on the payment processing service",
                "improved": "Built idempotent retry handling for the payment processing service"
            }
        ]
    })
}

pub fn sample_analysis() -> AnalysisResult {
    serde_json::from_value(analysis_json()).unwrap()
}

/// A complete, valid rebuild reply body.
pub fn rebuild_json() -> Value {
    json!({
        "name": "Jane Doe",
        "title": "Backend Engineer",
        "contact": {
            "email": "jane@example.com",
            "phone": null,
            "linkedin": null,
            "location": "Austin, TX"
        },
        "summary": "Backend engineer with five years on payment infrastructure.",
        "experience": [
            {
                "company": "Acme Payments",
                "title": "Backend Engineer",
                "dates": "2019-2024",
                "bullets": [
                    "Built core components of the payment processing service",
                    "Led migration of batch jobs to Kubernetes"
                ]
            }
        ],
        "education": [
            {
                "school": "University of Texas",
                "degree": "B.S. Computer Science",
                "year": "2019"
            }
        ],
        "skills": ["Rust", "Go", "PostgreSQL", "Kafka"]
    })
}

/// Canned generation backend that records every prompt it receives.
pub struct StubInvoker {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubInvoker {
    pub fn replying(reply: String) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as if the backend were down.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelInvoker for StubInvoker {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or_else(|| InvocationError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }
}
