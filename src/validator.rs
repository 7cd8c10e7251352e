//! Structural quality checks over generated scripts.
//!
//! Advisory only: the flags report whether the framework's mandatory
//! conventions appear in the text. Nothing here blocks or rewrites a
//! script; callers decide whether to accept or regenerate.

use crate::framework::FrameworkType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFlags {
    pub has_initialize: bool,
    pub has_cleanup: bool,
    pub has_global_objects: bool,
}

impl StructuralFlags {
    pub fn all_present(&self) -> bool {
        self.has_initialize && self.has_cleanup && self.has_global_objects
    }
}

const PSTAFF_GLOBAL_MARKERS: &[&str] = &[
    "log = Log()",
    "appaccess = AppAccess()",
    "initObj = Initialize()",
    "util = Utils()",
    "browser = BrowserActions()",
    "restObj = RestClient()",
];

const CLIENT_GLOBAL_MARKERS: &[&str] = &[
    "objFwUtils = FWUtils()",
    "objInitialize = Initialize()",
    "objCommonUtils = CommonUtils()",
    "pps_client = PpsRestClient()",
];

/// Substring checks for the mandatory initialization routine, cleanup
/// routine, and global object instantiations of the given framework.
pub fn validate(framework: FrameworkType, script: &str) -> StructuralFlags {
    match framework {
        FrameworkType::Pstaff => StructuralFlags {
            has_initialize: script.contains("def INITIALIZE("),
            has_cleanup: script.contains("def SuiteCleanup("),
            has_global_objects: PSTAFF_GLOBAL_MARKERS.iter().any(|m| script.contains(m)),
        },
        FrameworkType::Client => StructuralFlags {
            has_initialize: script.contains("def INITIALIZE("),
            has_cleanup: script.contains("def CLEANUP("),
            has_global_objects: CLIENT_GLOBAL_MARKERS.iter().any(|m| script.contains(m)),
        },
    }
}
