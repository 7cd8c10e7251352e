//! Framework source tree loading and prompt-sized batching for Phase 1

use crate::error::Result;
use crate::framework::FrameworkType;
use std::path::Path;
use tracing::{debug, warn};

/// Extensions worth feeding to the analyzer; everything else in the
/// source tree (wheels, logs, screenshots) is noise.
const SOURCE_EXTENSIONS: &[&str] = &["py", "robot", "txt", "cfg", "ini", "json", "yaml", "yml"];

/// Files larger than this are truncated before batching; a single giant
/// vendored file must not crowd out the rest of the tree.
const MAX_FILE_CHARS: usize = 48_000;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

/// One framework's source artifacts, ordered deterministically by path so
/// that batching (and therefore prompting) is reproducible.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub framework_type: FrameworkType,
    pub files: Vec<SourceFile>,
}

impl SourceTree {
    pub fn from_files(framework_type: FrameworkType, mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            framework_type,
            files,
        }
    }

    /// Load all analyzable files under `dir`, recursively
    pub fn load(framework_type: FrameworkType, dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        collect_files(dir, dir, &mut files)?;
        debug!(
            framework = %framework_type,
            files = files.len(),
            "loaded source tree from {}",
            dir.display()
        );
        Ok(Self::from_files(framework_type, files))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Pack files into batches no larger than `max_chars`, preserving
    /// file order. Each file appears in exactly one batch, framed with a
    /// header so the collaborator can attribute code to files.
    pub fn batches(&self, max_chars: usize) -> Vec<String> {
        let mut batches = Vec::new();
        let mut current = String::new();

        for file in &self.files {
            let mut content = file.content.as_str();
            if content.len() > MAX_FILE_CHARS {
                let cut = floor_char_boundary(content, MAX_FILE_CHARS);
                warn!(
                    "truncating {} from {} to {} chars for analysis",
                    file.name,
                    content.len(),
                    cut
                );
                content = &content[..cut];
            }
            let framed = format!("=== FILE: {} ===\n{}\n\n", file.name, content);
            if !current.is_empty() && current.len() + framed.len() > max_chars {
                batches.push(std::mem::take(&mut current));
            }
            current.push_str(&framed);
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            // Skip hidden and cache directories
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "__pycache__" {
                continue;
            }
            collect_files(root, &path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
        {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let name = path
                        .strip_prefix(root)
                        .unwrap_or(&path)
                        .display()
                        .to_string();
                    out.push(SourceFile { name, content });
                }
                Err(e) => warn!("skipping unreadable source file {}: {}", path.display(), e),
            }
        }
    }
    Ok(())
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
