//! Data model for the extracted framework knowledge artifact

use crate::framework::FrameworkType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a framework's knowledge entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeStatus {
    NotAnalyzed,
    Analyzing,
    Analyzed,
    Stale,
}

impl KnowledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeStatus::NotAnalyzed => "not_analyzed",
            KnowledgeStatus::Analyzing => "analyzing",
            KnowledgeStatus::Analyzed => "analyzed",
            KnowledgeStatus::Stale => "stale",
        }
    }
}

impl std::fmt::Display for KnowledgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One documented method of a framework class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodKnowledge {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub purpose: String,
}

/// Everything the analyzer learned about one framework class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassKnowledge {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub methods: Vec<MethodKnowledge>,
    #[serde(default)]
    pub usage_notes: String,
}

/// A canonical code idiom. Order within the artifact matters: earlier
/// patterns win ties during context assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternKnowledge {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The committed Phase 1 artifact for one framework type. Immutable once
/// committed; re-analysis replaces the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkKnowledge {
    pub framework_type: FrameworkType,
    pub classes: BTreeMap<String, ClassKnowledge>,
    pub patterns: Vec<PatternKnowledge>,
    pub analysis_id: uuid::Uuid,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FrameworkKnowledge {
    /// Assemble a fresh artifact. `created_at` carries over from the
    /// superseded artifact when one exists.
    pub fn new(
        framework_type: FrameworkType,
        classes: BTreeMap<String, ClassKnowledge>,
        patterns: Vec<PatternKnowledge>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        let checksum = body_checksum(&classes, &patterns);
        Self {
            framework_type,
            classes,
            patterns,
            analysis_id: uuid::Uuid::new_v4(),
            checksum,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        }
    }
}

/// SHA1 over the canonical serialized body, for artifact lineage
fn body_checksum(
    classes: &BTreeMap<String, ClassKnowledge>,
    patterns: &[PatternKnowledge],
) -> String {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    // BTreeMap iteration order makes this stable across runs
    if let Ok(bytes) = serde_json::to_vec(&(classes, patterns)) {
        hasher.update(&bytes);
    }
    format!("{:x}", hasher.finalize())
}

/// Read-only summary of a store entry; always available, even when
/// nothing has been analyzed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub framework_type: FrameworkType,
    pub status: KnowledgeStatus,
    pub classes_count: usize,
    pub patterns_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<String>,
}

impl KnowledgeStats {
    pub fn empty(framework_type: FrameworkType, status: KnowledgeStatus) -> Self {
        Self {
            framework_type,
            status,
            classes_count: 0,
            patterns_count: 0,
            artifact_location: None,
        }
    }
}
