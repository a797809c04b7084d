//! Wiring: configuration in, run status out.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use harness_security::{Identity, IdentityRegistry};
use policy_model::PolicyModel;
use resource_probe::ProbeRegistry;
use secrecy::SecretString;
use suite_runner::{RunPlan, RunStatus, SuiteRunner, parse_suites};
use token_provider_sdk::AuthOptions;

use crate::cli::Cli;
use crate::config::{AppConfig, ConfigError};

/// Exit code for configuration and startup failures.
pub const STARTUP_FAILURE: u8 = 3;

/// Everything a run needs, built before any request is sent.
pub struct Harness {
    runner: SuiteRunner,
    plan: RunPlan,
}

impl Harness {
    /// Resolve identities and suites and build every component.
    ///
    /// # Errors
    ///
    /// Any error here is a startup failure: unknown suites or identities,
    /// an invalid policy table, an unusable URL or cache directory.
    pub fn prepare(cli: &Cli, cfg: &AppConfig) -> anyhow::Result<Self> {
        let suites = parse_suites(&cli.tests).map_err(ConfigError::from)?;

        let registry = match &cfg.identities {
            Some(list) => IdentityRegistry::from_configs(list).map_err(ConfigError::from)?,
            None => IdentityRegistry::demo(),
        };
        let mut identities = registry.select(&cli.users).map_err(ConfigError::from)?;
        let mut creator = registry.get(&cfg.runner.creator).cloned();
        if creator.is_none() {
            tracing::warn!(creator = %cfg.runner.creator, "fixture creator is not a known identity");
        }

        if cli.password_stdin {
            let identity = single(&identities)?;
            let password = read_password(&mut std::io::stdin().lock())?;
            let updated = identity.with_password(password);
            if creator
                .as_ref()
                .is_some_and(|c| c.username() == updated.username())
            {
                creator = Some(updated.clone());
            }
            identities = vec![updated];
        }

        let policy = PolicyModel::from_config(&cfg.policy).context("loading policy table")?;
        let tokens = token_provider::Service::from_config(&cfg.auth, &cfg.http)
            .context("initializing token provider")?;
        let probes =
            ProbeRegistry::from_config(&cfg.api, &cfg.http).context("initializing API client")?;

        let runner = SuiteRunner::new(
            Arc::new(tokens),
            Arc::new(policy),
            probes,
            cfg.runner.clone(),
        );
        let plan = RunPlan {
            suites,
            identities,
            creator,
            auth: if cli.no_cache {
                AuthOptions::no_cache()
            } else {
                AuthOptions::default()
            },
        };
        Ok(Self { runner, plan })
    }

    #[must_use]
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Run, print the report and optionally write it as JSON.
    pub async fn execute(&self, report_json: Option<&std::path::Path>) -> RunStatus {
        let suites: Vec<&str> = self.plan.suites.iter().map(|s| s.as_str()).collect();
        tracing::info!(
            suites = %suites.join(","),
            identities = self.plan.identities.len(),
            "starting authorization run"
        );

        let report = self.runner.run(&self.plan).await;
        println!("{}", report.render());

        let status = report.status();
        if let Some(path) = report_json
            && let Err(e) = report.write_json(path)
        {
            tracing::error!(error = %e, "JSON report not written");
            if status == RunStatus::Passed {
                return RunStatus::OperationalFailure;
            }
        }
        status
    }
}

fn single(identities: &[Identity]) -> Result<&Identity, ConfigError> {
    match identities {
        [identity] => Ok(identity),
        _ => Err(ConfigError::PasswordStdinNeedsOneUser(identities.len())),
    }
}

/// First line of `input`, without the line terminator.
fn read_password(input: &mut impl BufRead) -> Result<SecretString, ConfigError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| ConfigError::PasswordRead(e.to_string()))?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(ConfigError::PasswordRead("empty password".to_owned()));
    }
    Ok(SecretString::from(password.to_owned()))
}
