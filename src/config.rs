use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::session::RepositoryFilter;

const ENV_PREFIX: &str = "PR_NOTIFIER";

/// Keys whose environment values are comma-separated lists.
const LIST_KEYS: &[&str] = &["github.tokens", "slack.channels", "repositories.filter"];

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub github: GitHubConfig,
    #[serde(default)]
    pub repositories: RepositoryFilter,
    #[serde(default)]
    pub pulls: PullsConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    /// One token per organization, processed in this order.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// API root for GitHub Enterprise.
    #[serde(default)]
    pub base_url: Option<String>,
}

// Manual Debug impl to avoid leaking tokens
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("tokens", &format!("[{} REDACTED]", self.tokens.len()))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PullsConfig {
    #[serde(default)]
    pub with_drafts: bool,
}

#[derive(Deserialize, Clone, Default)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
}

// Manual Debug impl to avoid leaking the bot token
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("channels", &self.channels)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_report_months")]
    pub months: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            months: default_report_months(),
        }
    }
}

fn default_report_months() -> u32 {
    12
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_from(config_path, environment())
    }

    fn load_from(config_path: Option<&str>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("pr-notifier").required(false));
        }

        builder = builder.add_source(env);

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        app.normalize();
        app.validate()?;
        Ok(app)
    }

    fn normalize(&mut self) {
        for list in [
            &mut self.github.tokens,
            &mut self.slack.channels,
            &mut self.repositories.names,
        ] {
            list.iter_mut().for_each(|v| *v = v.trim().to_string());
            list.retain(|v| !v.is_empty());
        }
    }

    fn validate(&self) -> Result<()> {
        if self.github.tokens.is_empty() {
            return Err(AppError::Config(
                "github.tokens must contain at least one token".to_string(),
            ));
        }
        Ok(())
    }

    /// Bot token, required only when posting.
    pub fn slack_token(&self) -> Result<&str> {
        self.slack
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Config("slack.token is not set".to_string()))
    }
}

/// Environment overrides such as `PR_NOTIFIER_GITHUB__TOKENS=a,b`.
fn environment() -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}
