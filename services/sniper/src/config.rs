//! Configuration types and loading
//!
//! Config precedence for the session token: ELECTIVE_TOKEN env var >
//! inline `token` field > `token_file` contents. The inline field is
//! moved into a redacting `Secret` immediately after parsing so the token
//! never survives in a Debug-printable field.
//!
//! Validation happens at load time; the engine never sees a blank target
//! or a zero worker bound.

use std::path::{Path, PathBuf};

use common::Secret;
use elective_client::Target;
use serde::Deserialize;

fn default_base_url() -> String {
    "https://jwxk.shu.edu.cn/xsxk/elective/shu".into()
}

fn default_class_type() -> String {
    "XGKC".into()
}

fn default_login_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_workers() -> usize {
    1
}

fn default_base_delay_ms() -> u64 {
    750
}

fn default_jitter_ms() -> u64 {
    250
}

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub targets: Vec<TargetConfig>,
}

/// Remote session settings: endpoint root and credential sourcing.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Inline token. Consumed into `resolved_token` during load; prefer
    /// ELECTIVE_TOKEN or token_file so the token stays out of the config.
    #[serde(default)]
    token: Option<String>,
    /// Path to a file containing the token (alternative to ELECTIVE_TOKEN)
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    /// External login command (argv), run to mint a fresh token when the
    /// current one expires. The command prints the token on stdout.
    #[serde(default)]
    pub login_command: Vec<String>,
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(skip)]
    pub resolved_token: Option<Secret>,
}

/// Acquisition loop tuning.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Optional round cap. Absent means run until success or cancellation.
    #[serde(default)]
    pub max_rounds: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_rounds: None,
        }
    }
}

/// One course section to pursue.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub teacher_code: String,
    #[serde(default = "default_class_type")]
    pub class_type: String,
}

impl TargetConfig {
    pub fn to_target(&self) -> Target {
        Target {
            course_code: self.course_code.clone(),
            teacher_code: self.teacher_code.clone(),
            class_type: self.class_type.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then resolve the token and
    /// validate.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.session.base_url.starts_with("http://")
            && !config.session.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.session.base_url
            )));
        }

        if config.session.request_timeout_secs == 0 {
            return Err(common::Error::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.session.login_timeout_secs == 0 {
            return Err(common::Error::Config(
                "login_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.engine.max_workers == 0 {
            return Err(common::Error::Config(
                "max_workers must be greater than 0".into(),
            ));
        }

        if config.engine.max_rounds == Some(0) {
            return Err(common::Error::Config(
                "max_rounds must be greater than 0 when set".into(),
            ));
        }

        if config.targets.is_empty() {
            return Err(common::Error::Config("no targets configured".into()));
        }

        for (i, target) in config.targets.iter().enumerate() {
            if target.course_code.trim().is_empty() && target.teacher_code.trim().is_empty() {
                return Err(common::Error::Config(format!(
                    "target {} has neither course_code nor teacher_code",
                    i + 1
                )));
            }
        }

        // Move the inline token out of the parseable field before anything
        // can Debug-print the config
        let inline = config.session.token.take();

        // Token resolution: env var > inline field > file. Blank values
        // count as absent so an empty credential can never reach the engine.
        let from_env = std::env::var("ELECTIVE_TOKEN")
            .ok()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        config.session.resolved_token = if let Some(token) = from_env {
            Some(Secret::new(token))
        } else if let Some(token) = inline {
            let trimmed = token.trim().to_owned();
            if trimmed.is_empty() {
                None
            } else {
                Some(Secret::new(trimmed))
            }
        } else if let Some(ref token_file) = config.session.token_file {
            let token = std::fs::read_to_string(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            let token = token.trim().to_owned();
            if token.is_empty() {
                None
            } else {
                Some(Secret::new(token))
            }
        } else {
            None
        };

        // Without a token the first attempt must be able to mint one
        if config.session.resolved_token.is_none() && config.session.login_command.is_empty() {
            return Err(common::Error::Config(
                "no usable credential: set ELECTIVE_TOKEN, token, token_file, or login_command"
                    .into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("elective-sniper.toml")
    }
}
