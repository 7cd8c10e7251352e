//! Knowledge store: committed artifacts plus the per-framework-type
//! single-flight lock around the `analyzing` state.
//!
//! Reads hand out `Arc` snapshots of the last committed artifact; commits
//! build the replacement off to the side and swap it in, so a reader sees
//! either the previous artifact or the new one, never a partial write.
//! The on-disk form follows the same discipline: serialize to a temp file,
//! then rename over the final path.

use crate::error::{Result, TestwrightError};
use crate::framework::FrameworkType;
use crate::knowledge::{
    ClassKnowledge, FrameworkKnowledge, KnowledgeStats, KnowledgeStatus, PatternKnowledge,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

struct Entry {
    status: KnowledgeStatus,
    knowledge: Option<Arc<FrameworkKnowledge>>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            status: KnowledgeStatus::NotAnalyzed,
            knowledge: None,
        }
    }
}

struct StoreInner {
    dir: PathBuf,
    entries: Mutex<HashMap<FrameworkType, Entry>>,
    // Signalled whenever a flight settles (commit, abort, or token drop)
    settled: Notify,
}

impl StoreInner {
    fn artifact_path(&self, framework: FrameworkType) -> PathBuf {
        self.dir.join(format!("framework_knowledge_{}.json", framework))
    }

    fn stats_locked(&self, framework: FrameworkType, entry: &Entry) -> KnowledgeStats {
        let (classes_count, patterns_count, artifact_location) = match &entry.knowledge {
            Some(k) => (
                k.classes.len(),
                k.patterns.len(),
                Some(self.artifact_path(framework).display().to_string()),
            ),
            None => (0, 0, None),
        };
        KnowledgeStats {
            framework_type: framework,
            status: entry.status,
            classes_count,
            patterns_count,
            artifact_location,
        }
    }

    fn settle(&self, framework: FrameworkType, status: KnowledgeStatus) {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        let entry = entries.entry(framework).or_default();
        entry.status = status;
        drop(entries);
        self.settled.notify_waiters();
    }
}

/// Outcome of `begin_analysis` when it does not conflict
pub enum BeginAnalysis {
    /// The caller won the flight and must `commit` or `abort` the token
    Started(AnalysisToken),
    /// A committed artifact already exists and `force` was not set
    AlreadyAnalyzed(KnowledgeStats),
}

#[derive(Clone)]
pub struct KnowledgeStore {
    inner: Arc<StoreInner>,
}

impl KnowledgeStore {
    /// Open the store rooted at `dir`, reloading any committed artifacts.
    /// A corrupt artifact file degrades that entry to `not_analyzed` with
    /// a warning; it never fails the open.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let store = Self {
            inner: Arc::new(StoreInner {
                dir,
                entries: Mutex::new(HashMap::new()),
                settled: Notify::new(),
            }),
        };

        for framework in FrameworkType::ALL {
            let path = store.inner.artifact_path(framework);
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(TestwrightError::from)
                .and_then(|text| {
                    serde_json::from_str::<FrameworkKnowledge>(&text).map_err(TestwrightError::from)
                }) {
                Ok(knowledge) => {
                    info!(
                        framework = %framework,
                        classes = knowledge.classes.len(),
                        patterns = knowledge.patterns.len(),
                        "loaded knowledge artifact from {}",
                        path.display()
                    );
                    let mut entries = store.inner.entries.lock().expect("store mutex poisoned");
                    entries.insert(
                        framework,
                        Entry {
                            status: KnowledgeStatus::Analyzed,
                            knowledge: Some(Arc::new(knowledge)),
                        },
                    );
                }
                Err(e) => {
                    warn!(
                        framework = %framework,
                        "ignoring corrupt knowledge artifact at {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(store)
    }

    /// Read-only summary. Never fails; absent entries report `not_analyzed`.
    pub fn get_stats(&self, framework: FrameworkType) -> KnowledgeStats {
        let entries = self.inner.entries.lock().expect("store mutex poisoned");
        match entries.get(&framework) {
            Some(entry) => self.inner.stats_locked(framework, entry),
            None => KnowledgeStats::empty(framework, KnowledgeStatus::NotAnalyzed),
        }
    }

    /// Snapshot of the last committed artifact, if any
    pub fn get(&self, framework: FrameworkType) -> Option<Arc<FrameworkKnowledge>> {
        let entries = self.inner.entries.lock().expect("store mutex poisoned");
        entries.get(&framework).and_then(|e| e.knowledge.clone())
    }

    /// Status of the last committed artifact as the retriever sees it:
    /// `Some` only when the entry is currently `analyzed`.
    pub fn get_analyzed(&self, framework: FrameworkType) -> Option<Arc<FrameworkKnowledge>> {
        let entries = self.inner.entries.lock().expect("store mutex poisoned");
        entries.get(&framework).and_then(|e| {
            if e.status == KnowledgeStatus::Analyzed {
                e.knowledge.clone()
            } else {
                None
            }
        })
    }

    /// Atomically claim the analysis flight for `framework`.
    ///
    /// `not_analyzed | stale -> analyzing` always; `analyzed -> analyzing`
    /// only with `force`. A concurrent holder yields
    /// `AnalysisInProgress`, the retryable single-flight signal.
    pub fn begin_analysis(&self, framework: FrameworkType, force: bool) -> Result<BeginAnalysis> {
        let mut entries = self.inner.entries.lock().expect("store mutex poisoned");
        let entry = entries.entry(framework).or_default();
        match entry.status {
            KnowledgeStatus::Analyzing => Err(TestwrightError::AnalysisInProgress { framework }),
            KnowledgeStatus::Analyzed if !force => {
                Ok(BeginAnalysis::AlreadyAnalyzed(
                    self.inner.stats_locked(framework, entry),
                ))
            }
            _ => {
                let prior_created_at = entry.knowledge.as_ref().map(|k| k.created_at);
                entry.status = KnowledgeStatus::Analyzing;
                debug!(framework = %framework, force, "analysis flight claimed");
                Ok(BeginAnalysis::Started(AnalysisToken {
                    inner: Arc::clone(&self.inner),
                    framework,
                    prior_created_at,
                    done: false,
                }))
            }
        }
    }

    /// Wait until no flight is active for `framework`, then report stats.
    /// Used by callers that lose the single-flight race and want to
    /// observe the winner's outcome instead of retrying.
    pub async fn wait_until_settled(&self, framework: FrameworkType) -> KnowledgeStats {
        loop {
            let notified = self.inner.settled.notified();
            {
                let entries = self.inner.entries.lock().expect("store mutex poisoned");
                let settled = entries
                    .get(&framework)
                    .map(|e| e.status != KnowledgeStatus::Analyzing)
                    .unwrap_or(true);
                if settled {
                    return match entries.get(&framework) {
                        Some(entry) => self.inner.stats_locked(framework, entry),
                        None => KnowledgeStats::empty(framework, KnowledgeStatus::NotAnalyzed),
                    };
                }
            }
            notified.await;
        }
    }
}

/// Exclusive claim on one framework's analysis flight. Must end in
/// `commit` or `abort`; dropping it mid-flight releases the lock into
/// `stale` so the store can never be stuck in `analyzing`.
pub struct AnalysisToken {
    inner: Arc<StoreInner>,
    framework: FrameworkType,
    prior_created_at: Option<DateTime<Utc>>,
    done: bool,
}

impl AnalysisToken {
    pub fn framework(&self) -> FrameworkType {
        self.framework
    }

    /// All-or-nothing commit: persist the artifact (temp file + rename),
    /// then swap the in-memory snapshot and mark the entry `analyzed`.
    pub fn commit(
        mut self,
        classes: BTreeMap<String, ClassKnowledge>,
        patterns: Vec<PatternKnowledge>,
    ) -> Result<KnowledgeStats> {
        let knowledge =
            FrameworkKnowledge::new(self.framework, classes, patterns, self.prior_created_at);

        let path = self.inner.artifact_path(self.framework);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&knowledge)?;
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &path)?;

        let snapshot = Arc::new(knowledge);
        let stats = {
            let mut entries = self.inner.entries.lock().expect("store mutex poisoned");
            let entry = entries.entry(self.framework).or_default();
            entry.knowledge = Some(Arc::clone(&snapshot));
            entry.status = KnowledgeStatus::Analyzed;
            self.inner.stats_locked(self.framework, entry)
        };
        self.done = true;
        self.inner.settled.notify_waiters();
        info!(
            framework = %self.framework,
            classes = stats.classes_count,
            patterns = stats.patterns_count,
            "knowledge artifact committed to {}",
            path.display()
        );
        Ok(stats)
    }

    /// Release the flight after a failed analysis: `analyzing -> stale`.
    /// Any previously committed artifact stays on disk but stops feeding
    /// retrieval until a successful re-analysis.
    pub fn abort(mut self) {
        self.done = true;
        debug!(framework = %self.framework, "analysis aborted, entry marked stale");
        self.inner.settle(self.framework, KnowledgeStatus::Stale);
    }
}

impl Drop for AnalysisToken {
    fn drop(&mut self) {
        if !self.done {
            warn!(
                framework = %self.framework,
                "analysis token dropped mid-flight, entry marked stale"
            );
            self.inner.settle(self.framework, KnowledgeStatus::Stale);
        }
    }
}
