//! Layered configuration: defaults, YAML file, `AUTHZ_HARNESS_*`
//! environment, then command line flags.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use harness_http::HttpClientConfig;
use harness_security::{IdentityConfig, RegistryError};
use policy_model::PolicyModelConfig;
use resource_probe::ResourceProbeConfig;
use serde::Deserialize;
use suite_runner::{SuiteError, SuiteRunnerConfig};
use token_provider::TokenProviderConfig;

use crate::cli::{Cli, LogFormat};

pub const ENV_PREFIX: &str = "AUTHZ_HARNESS_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {0} does not exist")]
    MissingFile(String),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("no client secret: pass --client-secret or set KEYCLOAK_CLIENT_SECRET")]
    MissingClientSecret,

    #[error("--parallel must be at least 1")]
    InvalidParallel,

    #[error("--password-stdin needs exactly one selected identity, got {0}")]
    PasswordStdinNeedsOneUser(usize),

    #[error("failed to read password from stdin: {0}")]
    PasswordRead(String),

    #[error(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Replaces the built-in demo identities when set.
    pub identities: Option<Vec<IdentityConfig>>,
    pub http: HttpClientConfig,
    pub auth: TokenProviderConfig,
    pub api: ResourceProbeConfig,
    pub policy: PolicyModelConfig,
    pub runner: SuiteRunnerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate the configuration for `cli`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing or malformed file, bad
    /// environment values or an invalid final configuration.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = Self::extract(cli.config.as_deref())?;
        cfg.apply_cli(cli);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults merged with the optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing or a layer does not
    /// match the configuration schema.
    pub fn extract(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = file {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.display().to_string()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment.extract().map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// Command line flags override every other layer.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.llamastack_url {
            self.api.api_url.clone_from(url);
        }
        if let Some(url) = &cli.keycloak_url {
            self.auth.idp_url.clone_from(url);
        }
        if let Some(secret) = &cli.client_secret {
            self.auth.client_secret = Some(secret.clone());
        }
        if let Some(dir) = &cli.cache_dir {
            self.auth.cache_dir = Some(dir.clone());
        }
        if let Some(file) = &cli.policy {
            self.policy.file = Some(file.clone());
        }
        if let Some(parallel) = cli.parallel {
            self.runner.parallel = parallel;
        }
        if cli.cleanup_fixtures {
            self.runner.cleanup_fixtures = true;
        }
        if cli.insecure {
            self.http.insecure_tls = true;
        }
        if cli.verbose {
            "debug".clone_into(&mut self.logging.level);
        }
        if let Some(format) = cli.log_format {
            self.logging.format = format;
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for settings no run can succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.client_secret.is_none() {
            return Err(ConfigError::MissingClientSecret);
        }
        if self.runner.parallel == 0 {
            return Err(ConfigError::InvalidParallel);
        }
        Ok(())
    }
}
