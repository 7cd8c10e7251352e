//! Closed set of supported automation frameworks

use crate::error::TestwrightError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two framework flavors this service understands. Dispatch is
/// exhaustive everywhere; unknown names are rejected at the string
/// boundary, never carried around as raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkType {
    /// PSTAF: Robot Framework style suites (class-based, `SuiteCleanup`)
    Pstaff,
    /// aut-pypdc client framework: pytest style modules (`CLEANUP`)
    Client,
}

impl FrameworkType {
    pub const ALL: [FrameworkType; 2] = [FrameworkType::Pstaff, FrameworkType::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkType::Pstaff => "pstaff",
            FrameworkType::Client => "client",
        }
    }
}

impl fmt::Display for FrameworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkType {
    type Err = TestwrightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pstaff" => Ok(FrameworkType::Pstaff),
            "client" => Ok(FrameworkType::Client),
            other => Err(TestwrightError::UnknownFramework {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!("pstaff".parse::<FrameworkType>().unwrap(), FrameworkType::Pstaff);
        assert_eq!("Client".parse::<FrameworkType>().unwrap(), FrameworkType::Client);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "selenium".parse::<FrameworkType>().unwrap_err();
        assert!(matches!(err, TestwrightError::UnknownFramework { .. }));
    }
}
