use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::ApplicationId;
use crate::remote::RemoteMappingTable;

pub const ENV_APPLICATION_BASE_URL: &str = "VITE_APPLICATION_MICROSERVICE_URL";
pub const ENV_YOUR_ID_LOGIN_URL: &str = "VITE_YOUR_ID_LOGIN_URL";
pub const ENV_DEPLOY_ENV: &str = "VITE_ENV";
pub const ENV_REMOTES: &str = "VITE_REMOTES";
pub const DEFAULT_ROOT_PATH: &str = "/v2";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    MissingValue { key: &'static str },
    #[error("{key} must use http:// or https:// and include a host")]
    InvalidBaseUrl { key: &'static str },
    #[error("unknown deployment environment `{0}` (expected dev or prod)")]
    UnknownEnvironment(String),
    #[error("invalid remote mapping entry `{0}`")]
    InvalidRemoteEntry(String),
    #[error("root path `{0}` must start with `/`")]
    InvalidRootPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployEnv {
    Dev,
    Prod,
}

impl DeployEnv {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for DeployEnv {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(ConfigError::UnknownEnvironment(raw.to_string())),
        }
    }
}

impl fmt::Display for DeployEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub application_base_url: String,
    pub your_id_login_url: String,
    pub env: DeployEnv,
    pub root_path: String,
    pub remotes: RemoteMappingTable,
}

impl HostConfig {
    /// Builds the config from any key/value source; the browser passes
    /// runtime-injected values with build-time fallbacks, natively the
    /// process environment is used.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let application_base_url = normalize_base_url(
            &value(ENV_APPLICATION_BASE_URL).unwrap_or_default(),
            ENV_APPLICATION_BASE_URL,
        )?;
        let your_id_login_url = normalize_base_url(
            &value(ENV_YOUR_ID_LOGIN_URL).unwrap_or_default(),
            ENV_YOUR_ID_LOGIN_URL,
        )?;
        let env = value(ENV_DEPLOY_ENV)
            .ok_or(ConfigError::MissingValue {
                key: ENV_DEPLOY_ENV,
            })?
            .parse()?;
        let remotes = match value(ENV_REMOTES) {
            Some(raw) => RemoteMappingTable::parse(&raw)?,
            None => RemoteMappingTable::production_defaults(),
        };

        Ok(Self {
            application_base_url,
            your_id_login_url,
            env,
            root_path: DEFAULT_ROOT_PATH.to_string(),
            remotes,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_non_empty)
    }

    pub fn with_root_path(mut self, root_path: &str) -> Result<Self, ConfigError> {
        self.root_path = normalize_root_path(root_path)?;
        Ok(self)
    }

    #[must_use]
    pub fn legacy_app_path(&self, id: ApplicationId) -> String {
        format!("{}/app/{id}", self.root_path)
    }
}

pub fn normalize_base_url(raw: &str, key: &'static str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::MissingValue { key });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl { key });
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl { key });
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl { key });
    }
    Ok(trimmed.to_string())
}

pub fn normalize_root_path(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidRootPath(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
