//! Trust signal attached to a translation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How far generated SQL can be trusted without review.
///
/// Ordered `Low < Medium < High`; a translation's confidence is the minimum
/// observed over every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[default]
    #[serde(alias = "high")]
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    /// Lower `self` to `other` if `other` is lower.
    pub fn demote(&mut self, other: Confidence) {
        *self = (*self).min(other);
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized confidence name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown confidence level: {0} (expected low, medium or high)")]
pub struct UnknownConfidence(pub String);

impl FromStr for Confidence {
    type Err = UnknownConfidence;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(UnknownConfidence(other.to_string())),
        }
    }
}
