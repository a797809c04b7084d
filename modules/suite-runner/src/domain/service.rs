//! Drives a run: fixture phase, then every (identity, suite) unit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use harness_security::{Identity, SecurityContext};
use policy_model_sdk::{Evaluation, Owner, PolicyEvaluator, ResourceDescriptor, Subject};
use resource_probe::{Outcome, ProbeRegistry, ProbeRequest};
use token_provider_sdk::{AuthOptions, TokenProviderClient};

use crate::config::SuiteRunnerConfig;
use crate::domain::fixtures::{self, RunFixtures};
use crate::domain::plan::{self, Expectation, Slot, Step, Target};
use crate::domain::report::{AuthFailure, CaseResult, RunReport};
use crate::domain::suite::Suite;
use crate::domain::verifier::{Verdict, verify};

/// What to run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub suites: Vec<Suite>,
    pub identities: Vec<Identity>,
    /// Establishes the shared fixtures. `None` leaves them unavailable.
    pub creator: Option<Identity>,
    pub auth: AuthOptions,
}

/// An identity and the context its steps run under, or why it has none.
struct Session {
    identity: Identity,
    ctx: Result<SecurityContext, String>,
}

pub struct SuiteRunner {
    tokens: Arc<dyn TokenProviderClient>,
    policy: Arc<dyn PolicyEvaluator>,
    probes: ProbeRegistry,
    cfg: SuiteRunnerConfig,
}

impl SuiteRunner {
    #[must_use]
    pub fn new(
        tokens: Arc<dyn TokenProviderClient>,
        policy: Arc<dyn PolicyEvaluator>,
        probes: ProbeRegistry,
        cfg: SuiteRunnerConfig,
    ) -> Self {
        Self {
            tokens,
            policy,
            probes,
            cfg,
        }
    }

    /// Execute `plan` to completion. Never fails: authentication problems,
    /// transport faults and missing fixtures all end up in the report.
    #[tracing::instrument(skip_all, fields(suites = plan.suites.len(), identities = plan.identities.len()))]
    pub async fn run(&self, plan: &RunPlan) -> RunReport {
        let started_at = Utc::now();
        let mut auth_failures = Vec::new();

        let needs_fixtures = plan.suites.iter().any(|s| s.needs_fixtures());

        // The creator only logs in when it has fixtures to build or is itself selected.
        let creator = match plan.creator.as_ref().filter(|c| {
            needs_fixtures || plan.identities.iter().any(|i| i.username() == c.username())
        }) {
            Some(identity) => Some(self.open_session(identity, plan.auth, &mut auth_failures).await),
            None => None,
        };

        let fixtures = if needs_fixtures {
            self.fixture_phase(creator.as_ref()).await
        } else {
            RunFixtures::default()
        };

        let mut sessions: Vec<Session> = Vec::with_capacity(plan.identities.len());
        if let Some(c) = &creator
            && plan.identities.iter().any(|i| i.username() == c.identity.username())
        {
            sessions.push(Session {
                identity: c.identity.clone(),
                ctx: c.ctx.clone(),
            });
        }
        for identity in &plan.identities {
            if sessions.iter().any(|s| s.identity.username() == identity.username()) {
                continue;
            }
            sessions.push(self.open_session(identity, plan.auth, &mut auth_failures).await);
        }

        let mut cases = Vec::new();
        if plan.suites.contains(&Suite::Models) {
            cases.push(self.anonymous_baseline().await);
        }
        cases.extend(self.run_units(&sessions, &plan.suites, &fixtures).await);

        if self.cfg.cleanup_fixtures
            && let Some(Session { ctx: Ok(ctx), .. }) = &creator
        {
            fixtures::cleanup(&self.probes, ctx, &fixtures).await;
        }

        RunReport {
            started_at,
            finished_at: Utc::now(),
            suites: plan.suites.clone(),
            identities: sessions
                .iter()
                .map(|s| s.identity.username().to_owned())
                .collect(),
            fixtures,
            cases,
            auth_failures,
        }
    }

    async fn open_session(
        &self,
        identity: &Identity,
        auth: AuthOptions,
        failures: &mut Vec<AuthFailure>,
    ) -> Session {
        let ctx = match self.tokens.authenticate(identity, auth).await {
            Ok(record) => Ok(SecurityContext::for_identity(identity, record.access_token)),
            Err(e) => {
                tracing::warn!(user = identity.username(), error = %e, "authentication failed");
                failures.push(AuthFailure {
                    identity: identity.username().to_owned(),
                    kind: e.kind(),
                    message: e.to_string(),
                });
                Err(e.to_string())
            }
        };
        Session {
            identity: identity.clone(),
            ctx,
        }
    }

    async fn fixture_phase(&self, creator: Option<&Session>) -> RunFixtures {
        match creator {
            Some(Session {
                identity,
                ctx: Ok(ctx),
            }) => fixtures::establish(&self.probes, ctx, identity, &self.cfg).await,
            Some(Session { ctx: Err(e), .. }) => RunFixtures::unavailable(&format!(
                "creator '{}' could not authenticate: {e}",
                self.cfg.creator
            )),
            None => RunFixtures::unavailable(&format!(
                "creator '{}' is not a known identity",
                self.cfg.creator
            )),
        }
    }

    async fn anonymous_baseline(&self) -> CaseResult {
        let step = plan::anonymous_baseline();
        let ctx = SecurityContext::anonymous();
        let target = ResourceDescriptor::collection(step.kind);
        let expected = self.expectation(&step, &ctx, &target);
        let request = ProbeRequest::new(step.operation, target.clone());
        let (outcome, latency_ms) = self.timed(&ctx, &request).await;
        finish(
            Suite::Models,
            ctx.display_name(),
            &step,
            &target,
            expected,
            outcome,
            latency_ms,
        )
    }

    async fn run_units(
        &self,
        sessions: &[Session],
        suites: &[Suite],
        fixtures: &RunFixtures,
    ) -> Vec<CaseResult> {
        let units = sessions
            .iter()
            .flat_map(|session| suites.iter().map(move |suite| (session, *suite)))
            .enumerate();

        let mut results: Vec<(usize, Vec<CaseResult>)> = futures::stream::iter(units)
            .map(|(index, (session, suite))| async move {
                (index, self.run_unit(session, suite, fixtures).await)
            })
            .buffer_unordered(self.cfg.parallel.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().flat_map(|(_, cases)| cases).collect()
    }

    #[tracing::instrument(skip_all, fields(user = session.identity.username(), suite = %suite))]
    async fn run_unit(
        &self,
        session: &Session,
        suite: Suite,
        fixtures: &RunFixtures,
    ) -> Vec<CaseResult> {
        let steps = plan::steps(suite, &self.cfg);
        let user = session.identity.username();

        let ctx = match &session.ctx {
            Ok(ctx) => ctx,
            Err(e) => {
                let reason = format!("authentication failed: {e}");
                return steps
                    .iter()
                    .map(|step| skipped(suite, user, step, &reason))
                    .collect();
            }
        };

        let mut slots: HashMap<Slot, String> = HashMap::new();
        let mut cases = Vec::with_capacity(steps.len());
        for step in &steps {
            let case = self
                .run_step(&session.identity, ctx, suite, step, &mut slots, fixtures)
                .await;
            cases.push(case);
        }
        tracing::debug!(cases = cases.len(), "unit finished");
        cases
    }

    async fn run_step(
        &self,
        identity: &Identity,
        ctx: &SecurityContext,
        suite: Suite,
        step: &Step,
        slots: &mut HashMap<Slot, String>,
        fixtures: &RunFixtures,
    ) -> CaseResult {
        let user = identity.username();
        let resolved = resolve(identity, step, &step.target, slots, fixtures).and_then(|target| {
            let parent = step
                .parent
                .as_ref()
                .map(|p| resolve(identity, step, p, slots, fixtures))
                .transpose()?;
            Ok((target, parent))
        });
        let (target, parent) = match resolved {
            Ok(resolved) => resolved,
            Err(reason) => return skipped(suite, user, step, &reason),
        };

        let expected = self.expectation(step, ctx, &target);
        let mut request = ProbeRequest::new(step.operation, target.clone());
        request.rows = step.rows;
        if let Some(parent) = &parent {
            request = request.with_parent(parent.name.as_deref().unwrap_or_default());
        }

        let (outcome, latency_ms) = self.timed(ctx, &request).await;

        if let Some(slot) = step.produces
            && let Some(id) = outcome.resource_id().or_else(|| target.name.clone())
            && outcome.is_success()
        {
            slots.insert(slot, id);
        }

        finish(suite, user, step, &target, expected, outcome, latency_ms)
    }

    fn expectation(
        &self,
        step: &Step,
        ctx: &SecurityContext,
        target: &ResourceDescriptor,
    ) -> Evaluation {
        match step.expectation {
            Expectation::Derived => {
                self.policy
                    .expected(&Subject::from(ctx), target, step.operation)
            }
            Expectation::Fixed(decision) => Evaluation {
                decision,
                reason: "fixed scenario".to_owned(),
            },
        }
    }

    async fn timed(&self, ctx: &SecurityContext, request: &ProbeRequest) -> (Outcome, u64) {
        let started = Instant::now();
        let outcome = self.probes.perform(ctx, request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        (outcome, latency_ms)
    }
}

/// Concrete descriptor for a symbolic step target.
fn resolve(
    identity: &Identity,
    step: &Step,
    target: &Target,
    slots: &HashMap<Slot, String>,
    fixtures: &RunFixtures,
) -> Result<ResourceDescriptor, String> {
    match target {
        Target::Collection => Ok(ResourceDescriptor::collection(step.kind)),
        Target::Named(name) => Ok(ResourceDescriptor::item(step.kind, name)),
        Target::Generated(prefix) => {
            let name = format!("{prefix}-{}-{}", identity.username(), Utc::now().timestamp());
            Ok(ResourceDescriptor::item(step.kind, &name))
        }
        Target::Produced(slot) => slots
            .get(slot)
            .map(|id| {
                ResourceDescriptor::item(step.kind, id).with_owner(Owner::from_identity(identity))
            })
            .ok_or_else(|| format!("prerequisite step produced no {}", slot.as_str())),
        Target::Fixture(kind) => fixtures.get(*kind).map(|handle| {
            if step.kind == handle.kind.resource_kind() {
                ResourceDescriptor::item(step.kind, handle.key()).with_owner(handle.owner.clone())
            } else {
                // Used as a parent: address the fixture by id.
                ResourceDescriptor::item(handle.kind.resource_kind(), &handle.id)
                    .with_owner(handle.owner.clone())
            }
        }),
    }
}

fn symbolic(step: &Step) -> String {
    match &step.target {
        Target::Collection => format!("{}:*", step.kind),
        Target::Named(name) => format!("{}:{name}", step.kind),
        Target::Generated(prefix) => format!("{}:{prefix}-*", step.kind),
        Target::Produced(slot) => format!("{}:<{}>", step.kind, slot.as_str()),
        Target::Fixture(kind) => format!("{}:<{} fixture>", step.kind, kind.resource_kind()),
    }
}

fn case_id(suite: Suite, user: &str, step: &Step) -> String {
    format!("{suite}/{user}/{}", step.name)
}

fn skipped(suite: Suite, user: &str, step: &Step, reason: &str) -> CaseResult {
    tracing::debug!(step = %step.name, reason, "step skipped");
    CaseResult {
        case_id: case_id(suite, user, step),
        suite,
        identity: user.to_owned(),
        step: step.name.clone(),
        operation: step.operation,
        target: symbolic(step),
        expected: None,
        reason: None,
        outcome: None,
        verdict: Verdict::Skipped,
        latency_ms: 0,
        detail: Some(reason.to_owned()),
    }
}

fn finish(
    suite: Suite,
    user: &str,
    step: &Step,
    target: &ResourceDescriptor,
    expected: Evaluation,
    outcome: Outcome,
    latency_ms: u64,
) -> CaseResult {
    let verdict = verify(expected.decision, &outcome);
    match verdict {
        Verdict::PolicyBreach => tracing::error!(
            user,
            step = %step.name,
            %target,
            outcome = %outcome.summary(),
            "POLICY BREACH: access allowed where the policy denies it"
        ),
        Verdict::OverDenied => tracing::warn!(
            user,
            step = %step.name,
            %target,
            outcome = %outcome.summary(),
            "access denied where the policy allows it"
        ),
        Verdict::Pass | Verdict::Inconclusive | Verdict::Skipped => tracing::debug!(
            user,
            step = %step.name,
            %target,
            verdict = %verdict,
            "case finished"
        ),
    }

    let detail = match &outcome {
        Outcome::TransportError { message } => Some(message.clone()),
        _ => None,
    };
    CaseResult {
        case_id: case_id(suite, user, step),
        suite,
        identity: user.to_owned(),
        step: step.name.clone(),
        operation: step.operation,
        target: target.to_string(),
        expected: Some(expected.decision),
        reason: Some(expected.reason),
        outcome: Some(outcome),
        verdict,
        latency_ms,
        detail,
    }
}
