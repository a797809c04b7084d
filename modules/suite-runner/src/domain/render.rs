//! Terminal rendering of a [`RunReport`].

use std::fmt;

use colored::{ColoredString, Colorize};

use crate::domain::report::{RunReport, RunStatus, Tally};
use crate::domain::verifier::Verdict;

const RULE: &str = "==================================================";

/// `Display` adapter; color follows `colored`'s global switch.
pub struct Rendered<'a>(pub &'a RunReport);

impl RunReport {
    #[must_use]
    pub fn render(&self) -> Rendered<'_> {
        Rendered(self)
    }
}

fn paint(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Pass => verdict.as_str().green(),
        Verdict::PolicyBreach => verdict.as_str().red().bold(),
        Verdict::OverDenied => verdict.as_str().yellow().bold(),
        Verdict::Inconclusive => verdict.as_str().magenta(),
        Verdict::Skipped => verdict.as_str().dimmed(),
    }
}

fn tally_line(t: &Tally) -> String {
    format!(
        "{}/{} passed, {} breaches, {} over-denied, {} inconclusive, {} skipped",
        t.passed,
        t.executed(),
        t.breaches,
        t.over_denied,
        t.inconclusive,
        t.skipped
    )
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write_cases(f, report)?;
        write_groups(f, report)?;
        write_problems(f, report)?;
        write_status(f, report)
    }
}

fn write_cases(f: &mut fmt::Formatter<'_>, report: &RunReport) -> fmt::Result {
    writeln!(f, "{RULE}")?;
    writeln!(f, "{}", "Authorization verification".bold())?;
    writeln!(f, "{RULE}")?;
    let mut current: Option<(String, &str)> = None;
    for case in &report.cases {
        let group = (case.suite.to_string(), case.identity.as_str());
        if current.as_ref() != Some(&group) {
            writeln!(f, "\n[{}] {}", group.0, group.1.bold())?;
            current = Some(group);
        }
        let expected = case
            .expected
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string);
        let observed = case
            .outcome
            .as_ref()
            .map_or_else(|| "-".to_owned(), resource_probe::Outcome::summary);
        writeln!(
            f,
            "  {:<13} {:<32} expected {expected:<7} got {observed} ({} ms)",
            paint(case.verdict),
            case.step,
            case.latency_ms
        )?;
        if let Some(detail) = &case.detail {
            writeln!(f, "                {}", detail.dimmed())?;
        }
    }
    Ok(())
}

fn write_groups(f: &mut fmt::Formatter<'_>, report: &RunReport) -> fmt::Result {
    writeln!(f, "\n{RULE}")?;
    writeln!(f, "{}", "By suite".bold())?;
    for (suite, tally) in report.by_suite() {
        writeln!(f, "  {:<10} {}", suite.as_str(), tally_line(&tally))?;
    }
    writeln!(f, "{}", "By identity".bold())?;
    for (identity, tally) in report.by_identity() {
        writeln!(f, "  {identity:<10} {}", tally_line(&tally))?;
    }
    Ok(())
}

fn write_problems(f: &mut fmt::Formatter<'_>, report: &RunReport) -> fmt::Result {
    let sections = [
        (Verdict::PolicyBreach, "POLICY BREACHES (allowed but should be denied)"),
        (Verdict::OverDenied, "Over-denied (denied but should be allowed)"),
        (Verdict::Inconclusive, "Inconclusive (transport faults)"),
        (Verdict::Skipped, "Skipped"),
    ];
    for (verdict, title) in sections {
        let cases: Vec<_> = report.with_verdict(verdict).collect();
        if cases.is_empty() {
            continue;
        }
        writeln!(f, "\n{} ({title})", paint(verdict))?;
        for case in cases {
            let why = case
                .detail
                .as_deref()
                .or(case.reason.as_deref())
                .unwrap_or_default();
            writeln!(f, "  - {} on {}: {why}", case.case_id, case.target)?;
        }
    }
    if !report.auth_failures.is_empty() {
        writeln!(f, "\n{}", "Authentication failures".red().bold())?;
        for failure in &report.auth_failures {
            writeln!(
                f,
                "  - {} [{}]: {}",
                failure.identity, failure.kind, failure.message
            )?;
        }
    }
    Ok(())
}

fn write_status(f: &mut fmt::Formatter<'_>, report: &RunReport) -> fmt::Result {
    let summary = report.summary();
    writeln!(f, "\n{RULE}")?;
    writeln!(f, "Overall: {}", tally_line(&summary))?;
    let verdict = match report.status() {
        RunStatus::Passed => "All executed cases match the policy".green().bold(),
        RunStatus::PolicyMismatch => "Observed access differs from the policy".red().bold(),
        RunStatus::OperationalFailure => "No policy mismatch, but the run was incomplete"
            .yellow()
            .bold(),
    };
    writeln!(f, "{verdict}")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use chrono::Utc;
    use policy_model_sdk::{Decision, Operation};
    use resource_probe::Outcome;
    use serde_json::Value;

    use super::*;
    use crate::domain::fixtures::RunFixtures;
    use crate::domain::report::{AuthFailure, CaseResult};
    use crate::domain::suite::Suite;

    fn report() -> RunReport {
        let breach = CaseResult {
            case_id: "files/user/upload file".to_owned(),
            suite: Suite::Files,
            identity: "user".to_owned(),
            step: "upload file".to_owned(),
            operation: Operation::Create,
            target: "file:*".to_owned(),
            expected: Some(Decision::Denied),
            reason: Some("no rule grants create on file".to_owned()),
            outcome: Some(Outcome::success(Value::Null)),
            verdict: Verdict::PolicyBreach,
            latency_ms: 12,
            detail: None,
        };
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            suites: vec![Suite::Files],
            identities: vec!["user".to_owned()],
            fixtures: RunFixtures::default(),
            cases: vec![breach],
            auth_failures: vec![AuthFailure {
                identity: "admin".to_owned(),
                kind: "invalid_credentials",
                message: "invalid_grant".to_owned(),
            }],
        }
    }

    #[test]
    fn breaches_and_auth_failures_are_listed() {
        colored::control::set_override(false);
        let text = report().render().to_string();
        assert!(text.contains("POLICY BREACHES"));
        assert!(text.contains("files/user/upload file on file:*: no rule grants create on file"));
        assert!(text.contains("admin [invalid_credentials]"));
        assert!(text.contains("Observed access differs from the policy"));
        assert!(text.is_ascii());
    }

    #[test]
    fn case_lines_show_expected_decision_or_dash() {
        colored::control::set_override(false);
        let mut report = report();
        report.cases.push(CaseResult {
            case_id: "files/user/read uploaded file".to_owned(),
            step: "read uploaded file".to_owned(),
            operation: Operation::Read,
            expected: None,
            reason: None,
            outcome: None,
            verdict: Verdict::Skipped,
            latency_ms: 0,
            detail: Some("prerequisite 'upload file' did not succeed".to_owned()),
            ..report.cases[0].clone()
        });

        let text = report.render().to_string();
        assert!(text.contains("expected denied"));
        assert!(text.contains("expected -"));
    }
}
