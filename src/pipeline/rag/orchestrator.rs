use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::context::{collect_sources, render_context};
use super::prompt::build_prompt;
use super::types::{GenerationParams, ProtocolRetriever, TextGenerator};
use super::RagError;
use crate::audit::event::preview;
use crate::audit::{AuditEvent, AuditSink};
use crate::config::AssistantConfig;
use crate::models::PatientRecord;
use crate::pipeline::safety::{GuardrailResult, GuardrailValidator};

/// Tunables for one synthesis, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisSettings {
    pub top_k: usize,
    pub generation: GenerationParams,
    pub excerpt_preview_chars: usize,
    pub answer_preview_chars: usize,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            generation: GenerationParams::default(),
            excerpt_preview_chars: 250,
            answer_preview_chars: 600,
        }
    }
}

impl SynthesisSettings {
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            top_k: config.retrieval_top_k,
            generation: GenerationParams {
                max_tokens: config.max_new_tokens,
                temperature: config.temperature,
            },
            excerpt_preview_chars: config.excerpt_preview_chars,
            answer_preview_chars: config.answer_preview_chars,
        }
    }
}

/// Result of one synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Guarded answer: the raw output, or the fixed safe message.
    pub answer: String,
    pub sources: BTreeSet<String>,
    /// Check of the raw, unguarded output.
    pub safety: GuardrailResult,
}

#[derive(Serialize)]
struct ChunkPreview<'a> {
    source: &'a str,
    preview: String,
}

/// Retrieval-augmented answer synthesis.
///
/// Coordinates: retrieve → render → prompt → generate → guard → audit.
pub struct AnswerSynthesizer {
    retriever: Arc<dyn ProtocolRetriever>,
    generator: Arc<dyn TextGenerator>,
    guardrail: Arc<GuardrailValidator>,
    audit: Arc<dyn AuditSink>,
    settings: SynthesisSettings,
}

impl AnswerSynthesizer {
    pub fn new(
        retriever: Arc<dyn ProtocolRetriever>,
        generator: Arc<dyn TextGenerator>,
        guardrail: Arc<GuardrailValidator>,
        audit: Arc<dyn AuditSink>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            retriever,
            generator,
            guardrail,
            audit,
            settings,
        }
    }

    /// Produce a guarded, source-grounded answer and append the synthesis
    /// audit event. Collaborator failures are returned unchanged; nothing is
    /// audited for a synthesis that did not complete.
    pub fn synthesize(
        &self,
        case_id: Uuid,
        question: &str,
        patient: &PatientRecord,
    ) -> Result<Synthesis, RagError> {
        // Step 1: Retrieve top-k protocol excerpts
        let excerpts = self.retriever.retrieve(question, self.settings.top_k)?;
        if excerpts.is_empty() {
            tracing::warn!(case_id = %case_id, "No protocol excerpts retrieved, answer will be ungrounded");
        }

        // Step 2: Render context and compose prompt
        let context = render_context(&excerpts);
        let prompt = build_prompt(patient, &context, question);

        // Step 3: Generate
        let raw = self.generator.generate(&prompt, &self.settings.generation)?;

        // Step 4: Guard for the reader, check raw output for the audit trail
        let answer = self.guardrail.guard(&raw);
        let safety = self.guardrail.check(&raw);

        // Step 5: Sources
        let sources = collect_sources(&excerpts);

        // Step 6: Audit
        let retrieved_chunks: Vec<ChunkPreview> = excerpts
            .iter()
            .map(|e| ChunkPreview {
                source: &e.source,
                preview: preview(&e.content, self.settings.excerpt_preview_chars),
            })
            .collect();

        let event = AuditEvent::untyped()
            .with("case_id", case_id)
            .with("question", question)
            .with("patient", patient)
            .with("sources", &sources)
            .with("retrieved_chunks", &retrieved_chunks)
            .with("safety", &safety)
            .with("answer_preview", preview(&answer, self.settings.answer_preview_chars));
        self.audit.append(event)?;

        tracing::info!(
            case_id = %case_id,
            excerpts = excerpts.len(),
            sources = sources.len(),
            safety_ok = safety.ok,
            "Answer synthesized"
        );

        Ok(Synthesis {
            answer,
            sources,
            safety,
        })
    }
}
