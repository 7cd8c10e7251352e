//! testwright: a two-phase framework expert for test-script synthesis.
//!
//! Phase 1 analyzes a test-automation framework's source once (expensive,
//! collaborator-driven) into a structured knowledge artifact. Phase 2
//! retrieves a small relevant slice of that artifact per request; Phase 3
//! composes it with a demo exemplar into one synthesis call, and the
//! validator annotates the result with structural convention flags.

pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod expert;
pub mod framework;
pub mod knowledge;
pub mod llm;
pub mod prompts;
pub mod retriever;
pub mod sources;
pub mod store;
pub mod synthesis;
pub mod validator;

pub use config::Config;
pub use error::{Result, TestwrightError};
pub use expert::{FrameworkExpert, GeneratedScript};
pub use framework::FrameworkType;
pub use knowledge::{FrameworkKnowledge, KnowledgeStats, KnowledgeStatus};
pub use synthesis::GenerationRequest;
pub use validator::StructuralFlags;

// Load env from a simple, standardized location resolution.
// Loads .env if present and silently ignores if missing.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
