//! Roast pipeline: orchestrates the analyze and rebuild flows.
//!
//! Analyze: admission → validate → compose → invoke → extract.
//! Rebuild: compose → invoke → extract (admission is paid by the analyze call
//! that produced the prior result).
//!
//! Every stage short-circuits with an error tagged by its [`Stage`]; nothing
//! downstream ever sees a partially validated result.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::admission::{Admission, AdmissionController, StoreError};
use crate::llm_client::{InvocationError, ModelInvoker};
use crate::models::analysis::AnalysisResult;
use crate::models::rebuild::RebuiltDocument;
use crate::roast::extractor::{extract_and_validate, validate_value, ExtractionError};
use crate::roast::prompts::{
    compose_analysis_prompt, compose_rebuild_prompt, REBUILD_SOURCE_MAX_CHARS,
};
use crate::roast::sanitizer::{
    sanitize_role, strip_markup, truncate_chars, validate, TextLimits, ValidationError,
};
use crate::roast::schema::ResultSchema;

/// Raw replies are cut to this many characters before they are logged.
const LOGGED_REPLY_CHARS: usize = 2_000;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Admission,
    Validation,
    Invocation,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Admission => "admission",
            Stage::Validation => "validation",
            Stage::Invocation => "invocation",
            Stage::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Too many requests; retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Admission store unavailable: {0}")]
    AdmissionUnavailable(#[from] StoreError),

    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    #[error("Model invocation failed: {0}")]
    InvocationFailed(#[from] InvocationError),

    #[error("Model reply unusable: {0}")]
    ExtractionFailed(#[from] ExtractionError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::RateLimited { .. } | PipelineError::AdmissionUnavailable(_) => {
                Stage::Admission
            }
            PipelineError::ValidationFailed(_) => Stage::Validation,
            PipelineError::InvocationFailed(_) => Stage::Invocation,
            PipelineError::ExtractionFailed(_) => Stage::Extraction,
        }
    }
}

/// Caller input for one analysis. Consumed once.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    /// `None` when the field was absent or not a string.
    pub text: Option<String>,
    pub target_role: Option<String>,
}

/// Caller input for one rebuild.
#[derive(Debug, Clone)]
pub struct RebuildRequest {
    /// Markup-free and capped when built through [`RebuildRequest::from_parts`].
    pub text: String,
    pub prior: AnalysisResult,
}

impl RebuildRequest {
    /// Builds a request from untrusted body fields.
    ///
    /// The source text is stripped of markup and capped; text that is empty
    /// afterwards counts as missing. The prior result comes back from the
    /// client, so it is held to the same schema the extractor enforces on
    /// model output.
    pub fn from_parts(text: Option<String>, prior: Option<Value>) -> Result<Self, ValidationError> {
        let text = text
            .map(|t| truncate_chars(strip_markup(&t).trim(), REBUILD_SOURCE_MAX_CHARS))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::MissingField("text"))?;
        let prior = prior
            .filter(|p| !p.is_null())
            .ok_or(ValidationError::MissingField("priorResult"))?;
        let prior = validate_value::<AnalysisResult>(prior).map_err(|e| {
            ValidationError::InvalidPriorResult(e.field().unwrap_or("<root>").to_string())
        })?;
        Ok(Self { text, prior })
    }
}

pub struct RoastPipeline {
    admission: AdmissionController,
    invoker: Arc<dyn ModelInvoker>,
    limits: TextLimits,
}

impl RoastPipeline {
    pub fn new(
        admission: AdmissionController,
        invoker: Arc<dyn ModelInvoker>,
        limits: TextLimits,
    ) -> Self {
        Self {
            admission,
            invoker,
            limits,
        }
    }

    /// Runs the full analyze flow for one client request.
    pub async fn analyze(
        &self,
        client_id: &str,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, PipelineError> {
        let request_id = Uuid::new_v4();

        // Stage 1: admission. Counted before any work and never refunded.
        if let Admission::Refused { retry_after } =
            self.admission.check_and_admit(client_id).await?
        {
            return Err(PipelineError::RateLimited { retry_after });
        }

        // Stage 2: validation
        let text = validate(request.text.as_deref(), self.limits)?;
        let target_role = sanitize_role(request.target_role.as_deref());
        info!(
            "[{request_id}] Analyzing {} chars for client {client_id} (target role: {})",
            text.char_len(),
            target_role.as_deref().unwrap_or("none")
        );

        // Stage 3: compose
        let prompt = compose_analysis_prompt(&text, target_role.as_deref());

        // Stages 4-5: invoke + extract
        let result: AnalysisResult = self.invoke_and_extract(request_id, &prompt).await?;
        info!(
            "[{request_id}] Analysis complete: score={}/100, ats={}/100, {} findings",
            result.overall_score,
            result.ats_score,
            result.roasts.len()
        );
        Ok(result)
    }

    /// Rewrites the original text using a prior analysis.
    pub async fn rebuild(&self, request: RebuildRequest) -> Result<RebuiltDocument, PipelineError> {
        let request_id = Uuid::new_v4();
        info!(
            "[{request_id}] Rebuilding resume from prior score {}/100",
            request.prior.overall_score
        );

        let prompt = compose_rebuild_prompt(&request.text, &request.prior);
        let document: RebuiltDocument = self.invoke_and_extract(request_id, &prompt).await?;
        info!(
            "[{request_id}] Rebuild complete: {} experience entries, {} skills",
            document.experience.len(),
            document.skills.len()
        );
        Ok(document)
    }

    /// Shared tail of both flows: one model call, then schema-checked extraction.
    async fn invoke_and_extract<T: ResultSchema>(
        &self,
        request_id: Uuid,
        prompt: &str,
    ) -> Result<T, PipelineError> {
        let reply = self.invoker.invoke(prompt).await.map_err(|e| {
            let err = PipelineError::InvocationFailed(e);
            warn!("[{request_id}] {} stage failed: {err}", err.stage());
            err
        })?;

        extract_and_validate::<T>(&reply).map_err(|e| {
            let err = PipelineError::ExtractionFailed(e);
            warn!(
                "[{request_id}] {} stage failed for {}: {err}. Raw reply: {}",
                err.stage(),
                T::NAME,
                truncate_chars(&reply, LOGGED_REPLY_CHARS)
            );
            err
        })
    }
}
