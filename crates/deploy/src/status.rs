//! Per-chain deployment lifecycle.
//!
//! ```text
//! idle -> validating -> deploying -> deployed -> enrolling -> complete
//!   \________\______________\___________\___________\-----> failed
//! ```
//!
//! `complete` and `failed` are terminal. Single-chain deployments stop at `deployed`.

use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentStatus {
    #[default]
    Idle,
    Validating,
    Deploying,
    Deployed,
    Enrolling,
    Complete,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Complete | DeploymentStatus::Failed)
    }

    /// Whether a network-bound step is running for the chain.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Validating | DeploymentStatus::Deploying | DeploymentStatus::Enrolling
        )
    }

    pub fn can_transition_to(&self, next: DeploymentStatus) -> bool {
        use DeploymentStatus::*;

        match (self, next) {
            (Idle, Validating)
            | (Validating, Deploying)
            | (Deploying, Deployed)
            | (Deployed, Enrolling)
            | (Enrolling, Complete) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Human readable label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentStatus::Idle => "Pending",
            DeploymentStatus::Validating => "Validating...",
            DeploymentStatus::Deploying => "Deploying...",
            DeploymentStatus::Deployed => "Deployed",
            DeploymentStatus::Enrolling => "Enrolling Routers...",
            DeploymentStatus::Complete => "Complete",
            DeploymentStatus::Failed => "Failed",
        }
    }
}

/// Tracked state of a single chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub status: DeploymentStatus,
    /// Cause of the failure. Always set when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Enrollment transactions submitted for the chain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tx_hashes: Vec<String>,
}

impl ChainStatus {
    pub fn new(status: DeploymentStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DeploymentStatus::*;
    use super::*;

    const ALL: [DeploymentStatus; 7] = [
        Idle, Validating, Deploying, Deployed, Enrolling, Complete, Failed,
    ];

    #[test]
    fn test_happy_path_transitions() {
        let path = [Idle, Validating, Deploying, Deployed, Enrolling, Complete];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        for status in ALL {
            assert_eq!(status.can_transition_to(Failed), !status.is_terminal());
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!Idle.can_transition_to(Deploying));
        assert!(!Validating.can_transition_to(Deployed));
        assert!(!Deployed.can_transition_to(Complete));
        assert!(!Deployed.can_transition_to(Validating));
        assert!(!Complete.can_transition_to(Enrolling));
        assert!(!Failed.can_transition_to(Deployed));
    }

    #[test]
    fn test_in_flight_states() {
        let in_flight: Vec<_> = ALL.into_iter().filter(|s| s.is_in_flight()).collect();
        assert_eq!(in_flight, vec![Validating, Deploying, Enrolling]);
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(Enrolling.to_string(), "enrolling");
        assert_eq!("complete".parse::<DeploymentStatus>().unwrap(), Complete);
        assert_eq!(serde_json::to_string(&Deployed).unwrap(), "\"deployed\"");
    }
}
