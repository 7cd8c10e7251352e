//! Phase 1: one-time framework analysis.
//!
//! Deliberately expensive and rare: the source tree is batched into
//! collaborator prompts, each reply is parsed into class/pattern records,
//! and the merged result is committed to the knowledge store in one swap.
//! Not suitable for per-request invocation.

use crate::error::{Result, TestwrightError};
use crate::knowledge::{ClassKnowledge, KnowledgeStats, PatternKnowledge};
use crate::llm::TextGenerator;
use crate::prompts;
use crate::sources::SourceTree;
use crate::store::{BeginAnalysis, KnowledgeStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one collaborator reply must deserialize into
#[derive(Debug, Default, Deserialize)]
struct BatchKnowledge {
    #[serde(default)]
    classes: BTreeMap<String, ClassKnowledge>,
    #[serde(default)]
    patterns: Vec<PatternKnowledge>,
}

pub struct FrameworkAnalyzer {
    generator: Arc<dyn TextGenerator>,
    store: KnowledgeStore,
    max_prompt_chars: usize,
}

impl FrameworkAnalyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: KnowledgeStore,
        max_prompt_chars: usize,
    ) -> Self {
        Self {
            generator,
            store,
            max_prompt_chars,
        }
    }

    /// Analyze `tree`, committing the extracted knowledge on success.
    ///
    /// Idempotent when `force` is false: an already-analyzed framework
    /// returns its existing stats without touching the collaborator.
    /// `force` re-runs unconditionally. A concurrent analysis for the
    /// same framework type surfaces `AnalysisInProgress`.
    pub async fn analyze(&self, tree: &SourceTree, force: bool) -> Result<KnowledgeStats> {
        let framework = tree.framework_type;
        if tree.is_empty() {
            return Err(TestwrightError::AnalysisFailed {
                reason: format!("no source files to analyze for {framework}"),
            });
        }

        let token = match self.store.begin_analysis(framework, force)? {
            BeginAnalysis::AlreadyAnalyzed(stats) => {
                debug!(framework = %framework, "knowledge already analyzed, skipping extraction");
                return Ok(stats);
            }
            BeginAnalysis::Started(token) => token,
        };

        info!(framework = %framework, files = tree.files.len(), "starting framework analysis");
        match self.run_extraction(tree).await {
            Ok((classes, patterns)) => token.commit(classes, patterns),
            Err(e) => {
                warn!(framework = %framework, "analysis failed: {e}");
                token.abort();
                Err(match e {
                    TestwrightError::AnalysisFailed { .. } => e,
                    other => TestwrightError::AnalysisFailed {
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    async fn run_extraction(
        &self,
        tree: &SourceTree,
    ) -> Result<(BTreeMap<String, ClassKnowledge>, Vec<PatternKnowledge>)> {
        let batches = tree.batches(self.max_prompt_chars);
        let batch_count = batches.len();

        let mut classes: BTreeMap<String, ClassKnowledge> = BTreeMap::new();
        let mut patterns: Vec<PatternKnowledge> = Vec::new();
        let mut seen_patterns: HashSet<String> = HashSet::new();

        for (index, batch) in batches.iter().enumerate() {
            let prompt =
                prompts::analysis_prompt(tree.framework_type, batch, index, batch_count);
            info!(
                framework = %tree.framework_type,
                batch = index + 1,
                batches = batch_count,
                prompt_chars = prompt.len(),
                "sending analysis batch to collaborator"
            );
            let reply = self.generator.generate(&prompt).await?;
            let parsed = parse_batch(&reply)?;

            for (name, class) in parsed.classes {
                // When two batches describe the same class, the richer entry wins
                let keep_existing = classes
                    .get(&name)
                    .is_some_and(|existing| existing.methods.len() >= class.methods.len());
                if !keep_existing {
                    classes.insert(name, class);
                }
            }
            for pattern in parsed.patterns {
                if seen_patterns.insert(pattern.name.clone()) {
                    patterns.push(pattern);
                }
            }
        }

        if classes.is_empty() && patterns.is_empty() {
            return Err(TestwrightError::AnalysisFailed {
                reason: "collaborator returned no classes or patterns".to_string(),
            });
        }
        Ok((classes, patterns))
    }
}

static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static regex"));
static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("static regex"));

/// Pull the best JSON candidate out of a collaborator reply: a fenced
/// block if present, otherwise the outermost brace span, otherwise the
/// trimmed text itself.
fn extract_json_candidate(text: &str) -> &str {
    if let Some(caps) = FENCED_JSON_RE.captures(text) {
        let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if inner.starts_with('{') {
            return inner;
        }
    }
    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            return &text[first..=last];
        }
    }
    text.trim()
}

/// Parse one reply, repairing the common failure modes (markdown fences,
/// surrounding prose, trailing commas) before giving up.
fn parse_batch(reply: &str) -> Result<BatchKnowledge> {
    let candidate = extract_json_candidate(reply);

    match serde_json::from_str::<BatchKnowledge>(candidate) {
        Ok(parsed) => Ok(parsed),
        Err(first_err) => {
            let repaired = TRAILING_COMMA_RE.replace_all(candidate, "$1");
            serde_json::from_str::<BatchKnowledge>(&repaired).map_err(|_| {
                TestwrightError::AnalysisFailed {
                    reason: format!("collaborator did not return valid JSON: {first_err}"),
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"classes": {"Utils": {"description": "helpers", "methods": [], "usage_notes": ""}}, "patterns": []}"#;

    #[test]
    fn parses_plain_json() {
        let parsed = parse_batch(VALID).unwrap();
        assert!(parsed.classes.contains_key("Utils"));
    }

    #[test]
    fn parses_fenced_json() {
        let reply = format!("Here is the knowledge base:\n```json\n{VALID}\n```\nDone.");
        let parsed = parse_batch(&reply).unwrap();
        assert!(parsed.classes.contains_key("Utils"));
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let reply = format!("Sure thing! {VALID} Let me know if you need more.");
        let parsed = parse_batch(&reply).unwrap();
        assert_eq!(parsed.classes.len(), 1);
    }

    #[test]
    fn repairs_trailing_commas() {
        let reply = r#"{"classes": {}, "patterns": [{"name": "p", "description": "", "code": "", "keywords": ["a",]},]}"#;
        let parsed = parse_batch(reply).unwrap();
        assert_eq!(parsed.patterns.len(), 1);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_batch("I could not analyze this framework, sorry.").unwrap_err();
        assert!(matches!(err, TestwrightError::AnalysisFailed { .. }));
    }
}
