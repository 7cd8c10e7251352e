use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::framework::FrameworkType;

/// Main configuration structure loaded from testwright.toml and
/// environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub knowledge: KnowledgeConfig,
    pub sources: SourcesConfig,
}

/// Generation collaborator settings. The collaborator is an opaque
/// `generate(prompt) -> text` capability; these only shape the boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// "openai" for an OpenAI-compatible chat endpoint, "canned" for the
    /// deterministic offline generator, "auto" to pick from the
    /// environment
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_ms: u64,
    /// Upper bound on one analysis batch prompt; Phase 1 splits the
    /// source tree to stay under it
    pub max_prompt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            temperature: 0.1,
            request_timeout_ms: 120_000,
            max_prompt_chars: 96_000,
        }
    }
}

/// Phase 2 budgets. `max_context_chars` is the hard ceiling on the
/// assembled context bundle, roughly an order of magnitude below naive
/// full-artifact inclusion.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_context_chars: usize,
    pub top_classes: usize,
    pub top_patterns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: 6_000,
            top_classes: 8,
            top_patterns: 4,
        }
    }
}

/// Where committed knowledge artifacts live
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub dir: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("framework_resources"),
        }
    }
}

/// Per-framework source tree locations for Phase 1
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub pstaff_dir: PathBuf,
    pub client_dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pstaff_dir: PathBuf::from("frameworks/pstaff"),
            client_dir: PathBuf::from("frameworks/client"),
        }
    }
}

impl SourcesConfig {
    pub fn dir_for(&self, framework: FrameworkType) -> &PathBuf {
        match framework {
            FrameworkType::Pstaff => &self.pstaff_dir,
            FrameworkType::Client => &self.client_dir,
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    /// Uses TESTWRIGHT_CONFIG or defaults to "testwright.toml".
    pub fn load() -> anyhow::Result<Self> {
        // Load environment variables with smart fallbacks:
        // 1) TW_ENV_FILE if set
        // 2) ./.env
        // 3) ../.env (repo root when running from a subdirectory)
        if let Ok(env_path) = std::env::var("TW_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
            let core_present = std::env::var("TW_GENERATION_API_KEY").is_ok()
                || std::env::var("OPENAI_API_KEY").is_ok()
                || std::env::var("TW_KNOWLEDGE_DIR").is_ok();
            if !core_present {
                let _ = dotenvy::from_path("../.env");
            }
        }

        let config_path =
            std::env::var("TESTWRIGHT_CONFIG").unwrap_or_else(|_| "testwright.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            toml::from_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        // Env overrides (env-first)
        if let Ok(provider) = std::env::var("TW_GENERATION_PROVIDER") {
            config.generation.provider = provider;
        }
        if let Ok(endpoint) = std::env::var("TW_GENERATION_ENDPOINT") {
            config.generation.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("TW_GENERATION_MODEL") {
            config.generation.model = model;
        }
        if let Some(timeout) = std::env::var("TW_GENERATION_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.generation.request_timeout_ms = timeout;
        }
        if let Ok(dir) = std::env::var("TW_KNOWLEDGE_DIR") {
            config.knowledge.dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TW_PSTAFF_SOURCES_DIR") {
            config.sources.pstaff_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TW_CLIENT_SOURCES_DIR") {
            config.sources.client_dir = PathBuf::from(dir);
        }
        if let Some(chars) = std::env::var("TW_MAX_CONTEXT_CHARS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.retrieval.max_context_chars = chars;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retrieval.max_context_chars < 512 {
            anyhow::bail!("retrieval.max_context_chars must be at least 512");
        }
        if self.retrieval.top_classes == 0 || self.retrieval.top_patterns == 0 {
            anyhow::bail!("retrieval.top_classes and top_patterns must be at least 1");
        }
        if self.generation.max_prompt_chars < 4_096 {
            anyhow::bail!("generation.max_prompt_chars must be at least 4096");
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!("generation.temperature must be between 0.0 and 2.0");
        }
        match self.generation.provider.as_str() {
            "auto" | "openai" | "canned" => {}
            other => anyhow::bail!(
                "generation.provider must be auto, openai, or canned (got {other})"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_tiny_context_budget() {
        let mut config = Config::default();
        config.retrieval.max_context_chars = 10;
        assert!(config.validate().is_err());
    }
}
