//! Phase 2: per-request selection of a minimal relevant knowledge slice.
//!
//! Selection is deterministic lexical ranking: the same description
//! against the same knowledge snapshot always yields the same bundle.
//! When no analyzed artifact exists the retriever degrades to the demo
//! corpus for the framework type; that path substitutes, never errors.

use crate::corpus;
use crate::framework::FrameworkType;
use crate::knowledge::{ClassKnowledge, FrameworkKnowledge, PatternKnowledge};
use crate::store::KnowledgeStore;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Where the assembled context came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ContextSource {
    /// Ranked slice of the committed knowledge artifact
    Knowledge {
        classes: Vec<String>,
        patterns: Vec<String>,
    },
    /// No usable artifact; the demo corpus stood in
    DemoFallback,
}

#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub framework_type: FrameworkType,
    pub text: String,
    pub source: ContextSource,
}

pub struct ContextRetriever {
    store: KnowledgeStore,
    max_context_chars: usize,
    top_classes: usize,
    top_patterns: usize,
}

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "to", "of", "for", "and", "or", "in", "on", "with", "is", "are", "be",
        "that", "this", "it", "as", "by", "from", "at", "should", "must", "will", "can", "when",
        "then", "test", "tests", "case", "cases", "script", "create", "new", "using", "via",
        "functionality", "scenario",
    ]
    .into_iter()
    .collect()
});

/// Lowercased alphanumeric tokens minus stopwords
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Overlap score of the query tokens against a haystack token set:
/// exact hits count 1.0, near-misses (Jaro-Winkler above 0.88) count 0.5
fn overlap_score(query: &[String], haystack: &HashSet<String>) -> f64 {
    let mut score = 0.0;
    for token in query {
        if haystack.contains(token) {
            score += 1.0;
        } else {
            let best = haystack
                .iter()
                .map(|h| strsim::jaro_winkler(token, h))
                .fold(0.0_f64, f64::max);
            if best > 0.88 {
                score += 0.5;
            }
        }
    }
    score
}

fn class_tokens(name: &str, class: &ClassKnowledge) -> HashSet<String> {
    let mut text = format!("{} {} {}", name, class.description, class.usage_notes);
    for method in &class.methods {
        text.push(' ');
        text.push_str(&method.name);
        text.push(' ');
        text.push_str(&method.purpose);
    }
    tokenize(&text).into_iter().collect()
}

fn pattern_tokens(pattern: &PatternKnowledge) -> HashSet<String> {
    let mut text = format!("{} {}", pattern.name, pattern.description);
    for keyword in &pattern.keywords {
        // Keywords are the author's own search terms; count them twice
        text.push(' ');
        text.push_str(keyword);
    }
    let mut tokens: HashSet<String> = tokenize(&text).into_iter().collect();
    tokens.extend(pattern.keywords.iter().map(|k| k.to_lowercase()));
    tokens
}

impl ContextRetriever {
    pub fn new(
        store: KnowledgeStore,
        max_context_chars: usize,
        top_classes: usize,
        top_patterns: usize,
    ) -> Self {
        Self {
            store,
            max_context_chars,
            top_classes,
            top_patterns,
        }
    }

    /// Select a ranked context slice for `description`, or the demo
    /// corpus when no analyzed artifact exists. Never fails.
    pub fn retrieve(&self, description: &str, framework: FrameworkType) -> ContextBundle {
        match self.store.get_analyzed(framework) {
            Some(knowledge) => self.retrieve_from_knowledge(description, framework, &knowledge),
            None => {
                debug!(
                    framework = %framework,
                    "no analyzed knowledge, falling back to demo corpus"
                );
                ContextBundle {
                    framework_type: framework,
                    text: corpus::demo_suite(framework).to_string(),
                    source: ContextSource::DemoFallback,
                }
            }
        }
    }

    fn retrieve_from_knowledge(
        &self,
        description: &str,
        framework: FrameworkType,
        knowledge: &FrameworkKnowledge,
    ) -> ContextBundle {
        let query = tokenize(description);

        // Rank patterns: score descending, artifact order among ties
        // (artifact order is the author's priority)
        let mut patterns: Vec<(f64, usize, &PatternKnowledge)> = knowledge
            .patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (overlap_score(&query, &pattern_tokens(p)), i, p))
            .collect();
        patterns.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        let matched: Vec<_> = patterns.iter().filter(|(s, _, _)| *s > 0.0).collect();
        let selected_patterns: Vec<&PatternKnowledge> = if matched.is_empty() {
            patterns.iter().take(self.top_patterns).map(|(_, _, p)| *p).collect()
        } else {
            matched
                .into_iter()
                .take(self.top_patterns)
                .map(|(_, _, p)| *p)
                .collect()
        };

        // Rank classes: score descending, name order among ties
        let mut classes: Vec<(f64, &String, &ClassKnowledge)> = knowledge
            .classes
            .iter()
            .map(|(name, c)| (overlap_score(&query, &class_tokens(name, c)), name, c))
            .collect();
        classes.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(b.1)));
        let matched: Vec<_> = classes.iter().filter(|(s, _, _)| *s > 0.0).collect();
        let selected_classes: Vec<(&String, &ClassKnowledge)> = if matched.is_empty() {
            classes
                .iter()
                .take(self.top_classes)
                .map(|(_, n, c)| (*n, *c))
                .collect()
        } else {
            matched
                .into_iter()
                .take(self.top_classes)
                .map(|(_, n, c)| (*n, *c))
                .collect()
        };

        let text = self.assemble(&selected_patterns, &selected_classes);
        debug!(
            framework = %framework,
            patterns = selected_patterns.len(),
            classes = selected_classes.len(),
            chars = text.len(),
            "context bundle assembled"
        );

        ContextBundle {
            framework_type: framework,
            text,
            source: ContextSource::Knowledge {
                classes: selected_classes
                    .iter()
                    .map(|(n, _)| (*n).clone())
                    .collect(),
                patterns: selected_patterns.iter().map(|p| p.name.clone()).collect(),
            },
        }
    }

    /// Patterns first (they carry the flow), then class references, each
    /// block appended only while the budget holds
    fn assemble(
        &self,
        patterns: &[&PatternKnowledge],
        classes: &[(&String, &ClassKnowledge)],
    ) -> String {
        let mut out = String::new();
        let mut blocks: Vec<String> = Vec::new();

        if !patterns.is_empty() {
            blocks.push("=== RELEVANT PATTERNS ===\n".to_string());
            for pattern in patterns {
                let mut block = format!("--- {}: {} ---\n", pattern.name, pattern.description);
                if !pattern.code.is_empty() {
                    block.push_str(&pattern.code);
                    block.push('\n');
                }
                block.push('\n');
                blocks.push(block);
            }
        }

        if !classes.is_empty() {
            blocks.push("=== RELEVANT FRAMEWORK CLASSES ===\n".to_string());
            for (name, class) in classes {
                let mut block = format!("Class: {}\n", name);
                if !class.description.is_empty() {
                    block.push_str(&format!("  {}\n", class.description));
                }
                for method in &class.methods {
                    let signature = if method.signature.is_empty() {
                        &method.name
                    } else {
                        &method.signature
                    };
                    if method.purpose.is_empty() {
                        block.push_str(&format!("  - {}\n", signature));
                    } else {
                        block.push_str(&format!("  - {}  ({})\n", signature, method.purpose));
                    }
                }
                if !class.usage_notes.is_empty() {
                    block.push_str(&format!("  Notes: {}\n", class.usage_notes));
                }
                block.push('\n');
                blocks.push(block);
            }
        }

        for block in blocks {
            if !out.is_empty() && out.len() + block.len() > self.max_context_chars {
                break;
            }
            out.push_str(&block);
        }
        out.truncate(floor_char_boundary(&out, self.max_context_chars));
        out
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
