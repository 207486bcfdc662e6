use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use orderdesk_core::LookupMode;
use reqwest::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:3000",
    "http://127.0.0.1:5500",
];
const DEFAULT_ORDER_TABLE: &str = "orders";
const DEFAULT_AGENT_API_VERSION: &str = "2025-05-01";
const DEFAULT_GENERATIVE_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATIVE_MODEL: &str = "gpt-4o";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ─────────────────────────────────────────────────────────────────────────────
// Secret
// ─────────────────────────────────────────────────────────────────────────────

/// A credential that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(len={})", self.0.len())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Structs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionConfig {
    pub url: String,
    /// Sent as `x-functions-key`; `None` calls the function anonymously.
    pub key: Option<Secret>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub table: String,
    pub lookup: LookupMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderSourceConfig {
    Function(FunctionConfig),
    Database(DatabaseConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentServiceConfig {
    pub endpoint: String,
    pub agent_id: String,
    pub token: Secret,
    pub api_version: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerativeConfig {
    pub api_base: String,
    pub api_key: Secret,
    pub model: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatBackendConfig {
    Agent(AgentServiceConfig),
    Generative(GenerativeConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub upstream_timeout: Duration,
    pub order_source: OrderSourceConfig,
    pub chat_backend: ChatBackendConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let cors_origins = match vars.optional("CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            bind_addr: vars.or("BIND_ADDR", DEFAULT_BIND_ADDR),
            cors_origins,
            upstream_timeout: Duration::from_secs(vars.number("UPSTREAM_TIMEOUT_SECS", 30)?),
            order_source: order_source(&vars)?,
            chat_backend: chat_backend(&vars)?,
        })
    }
}

fn order_source<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<OrderSourceConfig, ConfigError> {
    let kind = vars.or("ORDER_SOURCE", "function");
    match kind.to_ascii_lowercase().as_str() {
        "function" => Ok(OrderSourceConfig::Function(FunctionConfig {
            url: checked_url("FUNCTION_URL", vars.required("FUNCTION_URL")?)?,
            key: vars.optional("FUNCTION_KEY").map(Secret::new),
        })),
        "database" => {
            let table = vars.or("ORDER_TABLE", DEFAULT_ORDER_TABLE);
            if !is_identifier(&table) {
                return Err(ConfigError::Invalid {
                    var: "ORDER_TABLE",
                    value: table,
                    reason: "expected letters, digits and underscores only".into(),
                });
            }
            let lookup_raw = vars.or("ORDER_LOOKUP", "exact");
            let lookup = lookup_raw.parse::<LookupMode>().map_err(|reason| ConfigError::Invalid {
                var: "ORDER_LOOKUP",
                value: lookup_raw.clone(),
                reason,
            })?;
            Ok(OrderSourceConfig::Database(DatabaseConfig {
                path: PathBuf::from(vars.required("DATABASE_PATH")?),
                table,
                lookup,
            }))
        }
        _ => Err(ConfigError::Invalid {
            var: "ORDER_SOURCE",
            value: kind,
            reason: "expected `function` or `database`".into(),
        }),
    }
}

fn chat_backend<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<ChatBackendConfig, ConfigError> {
    let kind = vars.or("CHAT_BACKEND", "agent");
    match kind.to_ascii_lowercase().as_str() {
        "agent" => Ok(ChatBackendConfig::Agent(AgentServiceConfig {
            endpoint: checked_url("AGENT_ENDPOINT", vars.required("AGENT_ENDPOINT")?)?,
            agent_id: vars.required("AGENT_ID")?,
            token: Secret::new(vars.required("AGENT_TOKEN")?),
            api_version: vars.or("AGENT_API_VERSION", DEFAULT_AGENT_API_VERSION),
            poll_interval: Duration::from_millis(vars.number("AGENT_POLL_INTERVAL_MS", 500)?),
            run_timeout: Duration::from_secs(vars.number("AGENT_RUN_TIMEOUT_SECS", 60)?),
        })),
        "generative" => Ok(ChatBackendConfig::Generative(GenerativeConfig {
            api_base: checked_url(
                "GENERATIVE_API_BASE",
                vars.or("GENERATIVE_API_BASE", DEFAULT_GENERATIVE_API_BASE),
            )?,
            api_key: Secret::new(vars.required("GENERATIVE_API_KEY")?),
            model: vars.or("GENERATIVE_MODEL", DEFAULT_GENERATIVE_MODEL),
            system_prompt: vars.or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
        })),
        _ => Err(ConfigError::Invalid {
            var: "CHAT_BACKEND",
            value: kind,
            reason: "expected `agent` or `generative`".into(),
        }),
    }
}

/// Accepts absolute `http`/`https` URLs only.
fn checked_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    let reason = match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => return Ok(value),
        Ok(url) => format!("unsupported scheme `{}`", url.scheme()),
        Err(e) => e.to_string(),
    };
    Err(ConfigError::Invalid { var, value, reason })
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn number(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
            var: key,
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}
