//! Phase 3: script synthesis. One collaborator call composing the
//! retrieved context, the demo exemplar, and the caller's request.

use crate::corpus;
use crate::error::{Result, TestwrightError};
use crate::framework::FrameworkType;
use crate::llm::TextGenerator;
use crate::prompts;
use crate::retriever::ContextBundle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// One script-synthesis request. Ephemeral; nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub description: String,
    pub test_name: String,
    pub framework_type: FrameworkType,
}

pub struct ScriptSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl ScriptSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Compose and run the synthesis call. The demo exemplar is always
    /// part of the prompt, even when real knowledge drove the bundle, as
    /// the structural anchor. No internal retries; an empty reply is a
    /// `GenerationFailed`.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        bundle: &ContextBundle,
    ) -> Result<String> {
        let exemplar = corpus::demo_exemplar(request.framework_type);
        let prompt = prompts::synthesis_prompt(
            request.framework_type,
            &request.description,
            &request.test_name,
            bundle,
            exemplar,
        );
        debug!(
            framework = %request.framework_type,
            prompt_chars = prompt.len(),
            "sending synthesis prompt to collaborator"
        );

        let reply = self.generator.generate(&prompt).await.map_err(|e| match e {
            TestwrightError::GenerationFailed { .. } => e,
            other => TestwrightError::GenerationFailed {
                reason: other.to_string(),
            },
        })?;

        let script = strip_code_fences(&reply);
        if script.trim().is_empty() {
            return Err(TestwrightError::GenerationFailed {
                reason: "collaborator returned an empty script".to_string(),
            });
        }
        info!(
            framework = %request.framework_type,
            test_name = %request.test_name,
            script_chars = script.len(),
            "script synthesized"
        );
        Ok(script)
    }
}

/// Collaborators wrap code in markdown fences despite instructions;
/// unwrap the first fenced block when the reply is fenced.
fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string ("python", "json", ...) on the fence line
        let body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
        let body = body.strip_suffix("```").unwrap_or(body);
        return body.trim().to_string();
    }
    trimmed.to_string()
}
