use std::sync::Arc;

use super::error::WorkflowError;
use super::graph::{AlertRoute, CompiledGraph, GraphBuilder, NodeId};
use super::nodes::{
    route_on_alert, AssessSeverityNode, CheckPendingExamsNode, EmitAlertNode, NoAlertNode,
    SynthesizeAnswerNode,
};
use super::notify::{AlertNotifier, LogNotifier};
use super::state::{CaseRequest, CaseState};
use crate::audit::{AuditSink, JsonlAuditLogger};
use crate::config::AssistantConfig;
use crate::pipeline::rag::{
    AnswerSynthesizer, HashedTermEmbedder, InMemoryProtocolIndex, OllamaGenerator,
    ProtocolRetriever, SynthesisSettings, TextGenerator,
};
use crate::pipeline::safety::GuardrailValidator;
use crate::pipeline::triage::{KeywordExamsChecker, PendingExamsChecker, SeverityClassifier};

/// Everything the workflow calls out to. Shared read-only across cases.
#[derive(Clone)]
pub struct Collaborators {
    pub exams: Arc<dyn PendingExamsChecker>,
    pub retriever: Arc<dyn ProtocolRetriever>,
    pub generator: Arc<dyn TextGenerator>,
    pub guardrail: Arc<GuardrailValidator>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn AlertNotifier>,
}

/// Runs case traversals over the fixed graph
/// `CheckPendingExams → AssessSeverity → SynthesizeAnswer → {EmitAlert | NoAlert}`.
///
/// One engine serves any number of concurrent cases; each call to
/// [`run`](Self::run) owns its own [`CaseState`].
pub struct WorkflowEngine {
    graph: CompiledGraph,
}

impl WorkflowEngine {
    pub fn new(collaborators: Collaborators, settings: SynthesisSettings) -> Result<Self, WorkflowError> {
        let synthesizer = Arc::new(AnswerSynthesizer::new(
            collaborators.retriever,
            collaborators.generator,
            collaborators.guardrail,
            Arc::clone(&collaborators.audit),
            settings,
        ));

        let graph = GraphBuilder::new()
            .add_node(
                NodeId::CheckPendingExams,
                CheckPendingExamsNode::new(collaborators.exams),
            )
            .add_node(
                NodeId::AssessSeverity,
                AssessSeverityNode::new(SeverityClassifier::new()),
            )
            .add_node(
                NodeId::SynthesizeAnswer,
                SynthesizeAnswerNode::new(synthesizer, Arc::clone(&collaborators.audit)),
            )
            .add_node(
                NodeId::EmitAlert,
                EmitAlertNode::new(Arc::clone(&collaborators.audit), collaborators.notifier),
            )
            .add_node(NodeId::NoAlert, NoAlertNode::new(collaborators.audit))
            .set_entry(NodeId::CheckPendingExams)
            .add_edge(NodeId::CheckPendingExams, NodeId::AssessSeverity)
            .add_edge(NodeId::AssessSeverity, NodeId::SynthesizeAnswer)
            .add_conditional_edges(
                NodeId::SynthesizeAnswer,
                route_on_alert,
                &[
                    (AlertRoute::EmitAlert, NodeId::EmitAlert),
                    (AlertRoute::NoAlert, NodeId::NoAlert),
                ],
            )
            .set_terminal(NodeId::EmitAlert)
            .set_terminal(NodeId::NoAlert)
            .compile()?;

        Ok(Self { graph })
    }

    /// Wire the default collaborators from configuration: keyword exam
    /// checker, in-memory protocol index, Ollama generator, JSON-lines audit
    /// trail and log-only alert notifier. Nothing is contacted over the
    /// network until the first case runs.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, WorkflowError> {
        config.validate()?;

        let guardrail = GuardrailValidator::load(config.guardrail_rules_path.as_deref())?;
        let index = InMemoryProtocolIndex::load_dir(
            &config.index_dir,
            Arc::new(HashedTermEmbedder::default()),
        )
        .map_err(WorkflowError::Setup)?;
        let generator = OllamaGenerator::from_config(config).map_err(WorkflowError::Setup)?;

        tracing::info!(
            model = %config.model,
            top_k = config.retrieval_top_k,
            ruleset_version = %guardrail.version(),
            "Workflow engine configured"
        );

        Self::new(
            Collaborators {
                exams: Arc::new(KeywordExamsChecker::respiratory()),
                retriever: Arc::new(index),
                generator: Arc::new(generator),
                guardrail: Arc::new(guardrail),
                audit: Arc::new(JsonlAuditLogger::new(config.audit_log_path.clone())),
                notifier: Arc::new(LogNotifier),
            },
            SynthesisSettings::from_config(config),
        )
    }

    /// Traverse the graph for one case, blocking until a terminal node
    /// completes. Any node failure aborts the case and no state is returned.
    pub fn run(&self, state: CaseState) -> Result<CaseState, WorkflowError> {
        if !state.path().is_empty() {
            return Err(WorkflowError::InvalidCaseInput(
                "case has already been traversed".into(),
            ));
        }
        let populated = state.populated_fields();
        if !populated.is_empty() {
            return Err(WorkflowError::InvalidCaseInput(format!(
                "node-owned fields set before entry: {}",
                populated.join(", ")
            )));
        }

        let case_id = state.case_id();
        let case_span = tracing::info_span!("case", case_id = %case_id);
        let _case = case_span.enter();
        tracing::info!("Case started");

        match self.traverse(state) {
            Ok(state) => {
                tracing::info!(
                    severity = ?state.severity(),
                    terminal = ?state.path().last(),
                    "Case completed"
                );
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Case aborted");
                Err(e)
            }
        }
    }

    /// Build the case from an entry payload, then [`run`](Self::run) it.
    pub fn run_request(&self, request: CaseRequest) -> Result<CaseState, WorkflowError> {
        let state = CaseState::try_from(request)?;
        self.run(state)
    }

    fn traverse(&self, mut state: CaseState) -> Result<CaseState, WorkflowError> {
        let case_id = state.case_id();
        let mut current = self.graph.entry();
        loop {
            let node = self.graph.node(current)?;
            state = tracing::info_span!("node", case_id = %case_id, node = %current)
                .in_scope(|| node.run(state))?;
            state.record_visit(current);

            match self.graph.next(current, &state)? {
                Some(next) => current = next,
                None => return Ok(state),
            }
        }
    }
}
