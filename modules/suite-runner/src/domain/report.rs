//! Run results and their aggregation.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use policy_model_sdk::{Decision, Operation};
use resource_probe::Outcome;
use serde::Serialize;

use crate::domain::error::ReportError;
use crate::domain::fixtures::RunFixtures;
use crate::domain::suite::Suite;
use crate::domain::verifier::Verdict;

/// One executed (or skipped) step.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    /// `<suite>/<identity>/<step>`.
    pub case_id: String,
    pub suite: Suite,
    pub identity: String,
    pub step: String,
    pub operation: Operation,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Decision>,
    /// Why the policy model (or the fixed scenario) expects `expected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub verdict: Verdict,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthFailure {
    pub identity: String,
    pub kind: &'static str,
    pub message: String,
}

/// Verdict counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub passed: usize,
    pub breaches: usize,
    pub over_denied: usize,
    pub inconclusive: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::PolicyBreach => self.breaches += 1,
            Verdict::OverDenied => self.over_denied += 1,
            Verdict::Inconclusive => self.inconclusive += 1,
            Verdict::Skipped => self.skipped += 1,
        }
    }

    #[must_use]
    pub fn mismatches(&self) -> usize {
        self.breaches + self.over_denied
    }

    /// Cases that actually produced a verdict.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.total - self.skipped
    }
}

/// Overall result, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    PolicyMismatch,
    OperationalFailure,
}

impl RunStatus {
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::PolicyMismatch => 1,
            Self::OperationalFailure => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub suites: Vec<Suite>,
    pub identities: Vec<String>,
    pub fixtures: RunFixtures,
    pub cases: Vec<CaseResult>,
    pub auth_failures: Vec<AuthFailure>,
}

impl RunReport {
    #[must_use]
    pub fn summary(&self) -> Tally {
        let mut tally = Tally::default();
        for case in &self.cases {
            tally.record(case.verdict);
        }
        tally
    }

    #[must_use]
    pub fn by_suite(&self) -> BTreeMap<Suite, Tally> {
        let mut groups: BTreeMap<Suite, Tally> = BTreeMap::new();
        for case in &self.cases {
            groups.entry(case.suite).or_default().record(case.verdict);
        }
        groups
    }

    #[must_use]
    pub fn by_identity(&self) -> BTreeMap<&str, Tally> {
        let mut groups: BTreeMap<&str, Tally> = BTreeMap::new();
        for case in &self.cases {
            groups
                .entry(case.identity.as_str())
                .or_default()
                .record(case.verdict);
        }
        groups
    }

    /// Cases with the given verdict, in execution order.
    pub fn with_verdict(&self, verdict: Verdict) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(move |c| c.verdict == verdict)
    }

    /// Mismatches dominate operational failures; skipped cases count as
    /// neither.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        let tally = self.summary();
        if tally.mismatches() > 0 {
            RunStatus::PolicyMismatch
        } else if tally.inconclusive > 0 || !self.auth_failures.is_empty() {
            RunStatus::OperationalFailure
        } else {
            RunStatus::Passed
        }
    }

    /// Write the report, its summary and status as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when encoding or writing fails.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let document = JsonReport {
            status: self.status(),
            summary: self.summary(),
            report: self,
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        std::fs::write(path, bytes).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "JSON report written");
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: RunStatus,
    summary: Tally,
    #[serde(flatten)]
    report: &'a RunReport,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    fn case(suite: Suite, identity: &str, verdict: Verdict) -> CaseResult {
        CaseResult {
            case_id: format!("{suite}/{identity}/step"),
            suite,
            identity: identity.to_owned(),
            step: "step".to_owned(),
            operation: Operation::Read,
            target: "model:*".to_owned(),
            expected: Some(Decision::Allowed),
            reason: None,
            outcome: Some(Outcome::success(Value::Null)),
            verdict,
            latency_ms: 3,
            detail: None,
        }
    }

    fn report(cases: Vec<CaseResult>) -> RunReport {
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            suites: vec![Suite::Models],
            identities: vec!["developer".to_owned()],
            fixtures: RunFixtures::default(),
            cases,
            auth_failures: Vec::new(),
        }
    }

    #[test]
    fn all_passing_exits_zero() {
        let r = report(vec![
            case(Suite::Models, "developer", Verdict::Pass),
            case(Suite::Files, "developer", Verdict::Skipped),
        ]);
        assert_eq!(r.status(), RunStatus::Passed);
        assert_eq!(r.status().exit_code(), 0);
        assert_eq!(r.summary().executed(), 1);
    }

    #[test]
    fn mismatch_dominates_operational_failures() {
        let mut r = report(vec![
            case(Suite::Models, "developer", Verdict::Inconclusive),
            case(Suite::Files, "user", Verdict::PolicyBreach),
        ]);
        r.auth_failures.push(AuthFailure {
            identity: "admin".to_owned(),
            kind: "invalid_credentials",
            message: "bad password".to_owned(),
        });
        assert_eq!(r.status().exit_code(), 1);
    }

    #[test]
    fn auth_failure_alone_is_operational() {
        let mut r = report(vec![case(Suite::Models, "developer", Verdict::Pass)]);
        r.auth_failures.push(AuthFailure {
            identity: "user".to_owned(),
            kind: "provider_unreachable",
            message: "connection refused".to_owned(),
        });
        assert_eq!(r.status(), RunStatus::OperationalFailure);
        assert_eq!(r.status().exit_code(), 2);
    }

    #[test]
    fn groups_by_suite_and_identity() {
        let r = report(vec![
            case(Suite::Models, "developer", Verdict::Pass),
            case(Suite::Models, "user", Verdict::OverDenied),
            case(Suite::Team, "user", Verdict::Pass),
        ]);
        assert_eq!(r.by_suite()[&Suite::Models].total, 2);
        assert_eq!(r.by_suite()[&Suite::Models].over_denied, 1);
        assert_eq!(r.by_identity()["user"].total, 2);
        assert_eq!(r.with_verdict(Verdict::OverDenied).count(), 1);
    }

    #[test]
    fn json_report_carries_status_and_summary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let r = report(vec![case(Suite::Files, "user", Verdict::PolicyBreach)]);
        r.write_json(&path).unwrap();

        let doc: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(doc["status"], "policy_mismatch");
        assert_eq!(doc["summary"]["breaches"], 1);
        assert_eq!(doc["cases"][0]["verdict"], "policy_breach");
        assert_eq!(doc["cases"][0]["outcome"]["outcome"], "success");
    }
}
