//! Command line.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Verify that a LlamaStack deployment enforces its access policy.
///
/// Authenticates as each selected identity, exercises the API and compares
/// every observed decision with the policy model's prediction.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(name = "authz-harness", version, about, long_about = None)]
pub struct Cli {
    /// Identity to test (repeatable). Defaults to every registry identity.
    #[arg(short, long = "user", value_name = "NAME")]
    pub users: Vec<String>,

    /// Comma-separated suites: models, files, vectors, datasets, tools,
    /// mcp, team, or all.
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    pub tests: Vec<String>,

    /// Always authenticate against the identity provider.
    #[arg(long)]
    pub no_cache: bool,

    /// LlamaStack base URL.
    #[arg(long, env = "LLAMASTACK_URL")]
    pub llamastack_url: Option<String>,

    /// Keycloak base URL.
    #[arg(long, env = "KEYCLOAK_URL")]
    pub keycloak_url: Option<String>,

    /// Client secret of the `llamastack` client.
    #[arg(long, env = "KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<SecretString>,

    /// Token cache directory.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Policy table replacing the built-in one.
    #[arg(long, value_name = "FILE")]
    pub policy: Option<PathBuf>,

    /// Run up to N (identity, suite) units concurrently.
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Delete the shared team fixtures after the run.
    #[arg(long)]
    pub cleanup_fixtures: bool,

    /// Also write the report as JSON.
    #[arg(long, value_name = "PATH")]
    pub report_json: Option<PathBuf>,

    /// Read the password of the single selected identity from stdin.
    #[arg(long)]
    pub password_stdin: bool,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,

    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}
