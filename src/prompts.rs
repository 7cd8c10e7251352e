//! Prompt builders for the two collaborator-facing phases.
//!
//! One template per concern, assembled from the batch/request at call
//! time. The analysis templates differ per framework flavor because the
//! conventions the collaborator must extract differ (Robot-style class
//! suites vs pytest-style modules).

use crate::framework::FrameworkType;
use crate::retriever::ContextBundle;

/// Sentinel instruction shared by every analysis prompt. Also the marker
/// the canned generator keys on to tell analysis from synthesis.
pub const JSON_ONLY_DIRECTIVE: &str =
    "Return ONLY a single valid JSON object, no other text.";

/// Phase 1: one batch of framework source into structured knowledge
pub fn analysis_prompt(
    framework: FrameworkType,
    batch: &str,
    batch_index: usize,
    batch_count: usize,
) -> String {
    let conventions = match framework {
        FrameworkType::Pstaff => {
            "This is the PSTAF framework: Robot Framework library classes with \
             ROBOT_LIBRARY_SCOPE, module-level global objects (log, util, appaccess, \
             browser, restObj), a mandatory INITIALIZE first method and a mandatory \
             SuiteCleanup last method, and dict-based status returns \
             (return_dict['status'] == 1)."
        }
        FrameworkType::Client => {
            "This is the aut-pypdc client framework: pytest-style modules with \
             module-level global objects (objFwUtils, log, objInitialize, \
             objCommonUtils, pps_client), a mandatory INITIALIZE first function, \
             TC_<ID>_PPS_<DESCRIPTION> test functions, and a mandatory CLEANUP \
             last function."
        }
    };

    format!(
        r#"You are an expert code analyzer specializing in test automation frameworks.
Analyze the framework source below and produce a searchable knowledge base.

{conventions}

This is batch {current} of {total}.

=== FRAMEWORK FILES ===

{batch}

=== YOUR TASK ===

Produce a JSON object with exactly two top-level keys:

1. "classes": map from class name to
   {{"description": "...",
     "methods": [{{"name": "...", "signature": "...", "purpose": "..."}}],
     "usage_notes": "..."}}
   Document purpose, key method signatures, and how tests are expected to
   use each class.

2. "patterns": array of
   {{"name": "...", "description": "...", "code": "...", "keywords": ["..."]}}
   Capture canonical test idioms in the order a test exercises them:
   login flows, REST calls, verification steps, cleanup. "code" is a short
   representative snippet; "keywords" are lowercase search terms.

Be thorough and precise - this knowledge selects relevant code for test
generation later. {json_only}"#,
        conventions = conventions,
        current = batch_index + 1,
        total = batch_count,
        batch = batch,
        json_only = JSON_ONLY_DIRECTIVE,
    )
}

/// Phase 3: one synthesis call combining retrieved context, the demo
/// exemplar, and the caller's request
pub fn synthesis_prompt(
    framework: FrameworkType,
    description: &str,
    test_name: &str,
    bundle: &ContextBundle,
    exemplar: &str,
) -> String {
    let structure_rules = match framework {
        FrameworkType::Pstaff => {
            "The script MUST be a class with ROBOT_LIBRARY_SCOPE = 'GLOBAL', a \
             def INITIALIZE(self) first method, the test method, and a \
             def SuiteCleanup(self) last method. Use the module-level global \
             objects exactly as shown; never instantiate new ones inside tests."
        }
        FrameworkType::Client => {
            "The script MUST be a module with a def INITIALIZE() first function, \
             the TC_<ID> test function, and a def CLEANUP() last function, plus \
             the pytest setup_module/teardown_module hooks. Use the module-level \
             global objects exactly as shown; never instantiate new ones inside \
             tests."
        }
    };

    format!(
        r#"You are an expert test automation engineer. Generate a complete,
production-ready Python test script for the framework context below.

=== FRAMEWORK CONTEXT ===

{context}

{exemplar}

=== TEST CASE TO IMPLEMENT ===

Test method name: {test_name}

Test case description:
{description}

=== REQUIREMENTS ===

- {structure_rules}
- Follow the example patterns exactly; keep the test simple.
- Assert on every framework operation's status before continuing.
- Generate ONLY the Python code, no markdown formatting."#,
        context = bundle.text,
        exemplar = exemplar,
        test_name = test_name,
        description = description,
        structure_rules = structure_rules,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::{ContextBundle, ContextSource};

    #[test]
    fn analysis_prompt_carries_batch_and_directive() {
        let p = analysis_prompt(FrameworkType::Pstaff, "=== FILE: a.py ===\nx = 1", 0, 2);
        assert!(p.contains("batch 1 of 2"));
        assert!(p.contains("=== FILE: a.py ==="));
        assert!(p.contains(JSON_ONLY_DIRECTIVE));
    }

    #[test]
    fn synthesis_prompt_always_embeds_exemplar_and_test_name() {
        let bundle = ContextBundle {
            framework_type: FrameworkType::Client,
            text: "context goes here".to_string(),
            source: ContextSource::DemoFallback,
        };
        let p = synthesis_prompt(
            FrameworkType::Client,
            "verify admin login",
            "TC_010_PPS_ADMIN_LOGIN",
            &bundle,
            "EXEMPLAR BLOCK",
        );
        assert!(p.contains("context goes here"));
        assert!(p.contains("EXEMPLAR BLOCK"));
        assert!(p.contains("Test method name: TC_010_PPS_ADMIN_LOGIN"));
        assert!(!p.contains(JSON_ONLY_DIRECTIVE));
    }
}
