//! Expected vs observed.

use std::fmt;

use policy_model_sdk::Decision;
use resource_probe::Outcome;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// Allowed where the policy denies. Security relevant.
    PolicyBreach,
    /// Denied where the policy allows.
    OverDenied,
    /// No decision could be observed.
    Inconclusive,
    Skipped,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::PolicyBreach => "BREACH",
            Self::OverDenied => "OVER-DENIED",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::Skipped => "SKIPPED",
        }
    }

    #[must_use]
    pub fn is_mismatch(self) -> bool {
        matches!(self, Self::PolicyBreach | Self::OverDenied)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare the decision an outcome demonstrates with the expected one.
#[must_use]
pub fn verify(expected: Decision, outcome: &Outcome) -> Verdict {
    match (expected, outcome.decision()) {
        (_, None) => Verdict::Inconclusive,
        (Decision::Denied, Some(Decision::Allowed)) => Verdict::PolicyBreach,
        (Decision::Allowed, Some(Decision::Denied)) => Verdict::OverDenied,
        (Decision::Allowed, Some(Decision::Allowed)) | (Decision::Denied, Some(Decision::Denied)) => {
            Verdict::Pass
        }
    }
}
