//! The framework expert service object: one explicit context constructed
//! per process and injected into callers, owning the store and the phase
//! components. No module-level singletons.

use crate::analyzer::FrameworkAnalyzer;
use crate::config::Config;
use crate::error::{Result, TestwrightError};
use crate::framework::FrameworkType;
use crate::knowledge::KnowledgeStats;
use crate::llm::TextGenerator;
use crate::retriever::{ContextRetriever, ContextSource};
use crate::sources::SourceTree;
use crate::store::KnowledgeStore;
use crate::synthesis::{GenerationRequest, ScriptSynthesizer};
use crate::validator::{self, StructuralFlags};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A synthesized script plus the advisory structural flags computed over
/// exactly the returned text. Not persisted here; persistence is a
/// caller concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedScript {
    pub text: String,
    pub structural_flags: StructuralFlags,
    pub context_source: ContextSource,
}

pub struct FrameworkExpert {
    config: Config,
    store: KnowledgeStore,
    analyzer: FrameworkAnalyzer,
    retriever: ContextRetriever,
    synthesizer: ScriptSynthesizer,
}

impl FrameworkExpert {
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Result<Self> {
        let store = KnowledgeStore::open(&config.knowledge.dir)?;
        let analyzer = FrameworkAnalyzer::new(
            Arc::clone(&generator),
            store.clone(),
            config.generation.max_prompt_chars,
        );
        let retriever = ContextRetriever::new(
            store.clone(),
            config.retrieval.max_context_chars,
            config.retrieval.top_classes,
            config.retrieval.top_patterns,
        );
        let synthesizer = ScriptSynthesizer::new(generator);
        info!(
            knowledge_dir = %config.knowledge.dir.display(),
            "framework expert initialized"
        );
        Ok(Self {
            config,
            store,
            analyzer,
            retriever,
            synthesizer,
        })
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Read-only knowledge summary; always succeeds
    pub fn knowledge_stats(&self, framework: FrameworkType) -> KnowledgeStats {
        self.store.get_stats(framework)
    }

    /// Phase 1 entry point. The only long-blocking operation in the
    /// service. A caller that loses the single-flight race waits for the
    /// winner and returns the settled stats, so every concurrent caller
    /// observes the same final state.
    pub async fn analyze(&self, framework: FrameworkType, force: bool) -> Result<KnowledgeStats> {
        let dir = self.config.sources.dir_for(framework);
        let tree = SourceTree::load(framework, dir).map_err(|e| {
            TestwrightError::AnalysisFailed {
                reason: format!("cannot load sources from {}: {e}", dir.display()),
            }
        })?;

        match self.analyzer.analyze(&tree, force).await {
            Err(TestwrightError::AnalysisInProgress { .. }) => {
                info!(framework = %framework, "analysis in flight elsewhere, waiting for it to settle");
                Ok(self.store.wait_until_settled(framework).await)
            }
            other => other,
        }
    }

    /// Phases 2 + 3: retrieve a context slice (or the demo fallback),
    /// synthesize once, annotate with structural flags.
    pub async fn generate_script(&self, request: GenerationRequest) -> Result<GeneratedScript> {
        let bundle = self
            .retriever
            .retrieve(&request.description, request.framework_type);
        let text = self.synthesizer.generate(&request, &bundle).await?;
        let structural_flags = validator::validate(request.framework_type, &text);
        Ok(GeneratedScript {
            text,
            structural_flags,
            context_source: bundle.source,
        })
    }
}
