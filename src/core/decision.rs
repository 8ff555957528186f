use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{ProfileId, UserProfile};

/// A viewer's verdict on a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Like,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown operation: {0} (expected like or skip)")]
pub struct UnknownDecision(pub String);

impl FromStr for Decision {
    type Err = UnknownDecision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Decision::Like),
            "skip" => Ok(Decision::Skip),
            other => Err(UnknownDecision(other.to_string())),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Like => f.write_str("like"),
            Decision::Skip => f.write_str("skip"),
        }
    }
}

impl Decision {
    /// Record the decision on an in-memory profile
    ///
    /// Returns false when it was already recorded.
    pub fn apply(self, profile: &mut UserProfile, target: ProfileId) -> bool {
        match self {
            Decision::Like => profile.like_ids.insert(target),
            Decision::Skip => profile.skip_ids.insert(target),
        }
    }

    /// Likes change the match lists of both sides
    pub fn affects_matches(self) -> bool {
        matches!(self, Decision::Like)
    }
}
