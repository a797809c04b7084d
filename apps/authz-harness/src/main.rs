//! `authz-harness` - verify a LlamaStack deployment's access policy.
//!
//! # Configuration
//!
//! Layers, lowest priority first:
//!
//! 1. Built-in defaults (demo realm identities, local endpoints)
//! 2. YAML file given with `--config`
//! 3. Environment variables `AUTHZ_HARNESS_<SECTION>__<KEY>`
//! 4. Command line flags (`LLAMASTACK_URL`, `KEYCLOAK_URL` and
//!    `KEYCLOAK_CLIENT_SECRET` back the matching flags)
//!
//! # Exit status
//!
//! `0` every executed case passed, `1` policy mismatch, `2` inconclusive
//! cases or failed logins only, `3` configuration or startup error.

use std::process::ExitCode;

use authz_harness::{AppConfig, Cli, Harness, STARTUP_FAILURE, logging};
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match AppConfig::load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} {e}", "configuration error:".red().bold());
            return ExitCode::from(STARTUP_FAILURE);
        }
    };
    logging::init(&cfg.logging);

    let harness = match Harness::prepare(&cli, &cfg) {
        Ok(harness) => harness,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            eprintln!("{} {e:#}", "startup error:".red().bold());
            return ExitCode::from(STARTUP_FAILURE);
        }
    };

    let status = harness.execute(cli.report_json.as_deref()).await;
    ExitCode::from(status.exit_code())
}
