use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::transcoder::{TrackerOptions, TranscoderOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Names of the per-request settings. The same names are accepted as
/// environment variables and as keys of the request's `config` map.
pub const GRAPH_SETTINGS: &[&str] = &[
    "LLM_MODEL",
    "KEEP_ALIVE",
    "DISABLE_COMMANDS",
    "OLLAMA_BASE_URL",
    "SEARXNG_URL",
    "DEBUG",
    "VERBOSE_NODE_NAMES",
];

/// Graph settings pinned by the server's environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides(HashMap<&'static str, String>);

impl EnvOverrides {
    pub fn capture() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = GRAPH_SETTINGS
            .iter()
            .filter_map(|name| {
                lookup(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (*name, value))
            })
            .collect();
        Self(values)
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_json: bool,
    pub connect_timeout: Duration,
    pub stream_buffer: usize,
    pub env: EnvOverrides,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            log_json: false,
            connect_timeout: Duration::from_secs(5),
            stream_buffer: 32,
            env: EnvOverrides::default(),
        }
    }
}

impl ServerConfig {
    /// Read server settings from the process environment. Call after
    /// `dotenvy::dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "BIND_ADDR", value: raw })?,
            None => defaults.bind_addr,
        };
        let log_json = match var("LOG_JSON") {
            Some(raw) => parse_bool("LOG_JSON", &raw)?,
            None => defaults.log_json,
        };
        let connect_timeout = match var("CONNECT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid { name: "CONNECT_TIMEOUT_SECS", value: raw })?,
            ),
            None => defaults.connect_timeout,
        };
        let stream_buffer = match var("STREAM_BUFFER") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid { name: "STREAM_BUFFER", value: raw }),
            },
            None => defaults.stream_buffer,
        };

        Ok(Self {
            bind_addr,
            log_json,
            connect_timeout,
            stream_buffer,
            env: EnvOverrides::capture(),
        })
    }
}

/// Settings a graph run sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GraphConfig {
    pub llm_model: String,
    pub keep_alive: String,
    pub disable_commands: bool,
    pub ollama_base_url: String,
    pub searxng_url: String,
    pub debug: bool,
    pub verbose_node_names: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            llm_model: "llama3.1:8b".to_string(),
            keep_alive: "5m".to_string(),
            disable_commands: false,
            ollama_base_url: "http://host.docker.internal:11434".to_string(),
            searxng_url: "http://host.docker.internal:4001".to_string(),
            debug: false,
            verbose_node_names: true,
        }
    }
}

enum Setting<'a> {
    Env(&'a str),
    Request(&'a Value),
}

impl GraphConfig {
    /// Resolve each field from the environment first, then the request's
    /// `config` map, then the default. `null` request values count as unset.
    pub fn resolve(request: &Map<String, Value>, env: &EnvOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let lookup = |name: &'static str| {
            if let Some(value) = env.get(name) {
                return Some(Setting::Env(value));
            }
            match request.get(name) {
                None | Some(Value::Null) => None,
                Some(value) => Some(Setting::Request(value)),
            }
        };

        Ok(Self {
            llm_model: string_setting("LLM_MODEL", lookup("LLM_MODEL"), defaults.llm_model)?,
            keep_alive: string_setting("KEEP_ALIVE", lookup("KEEP_ALIVE"), defaults.keep_alive)?,
            disable_commands: bool_setting(
                "DISABLE_COMMANDS",
                lookup("DISABLE_COMMANDS"),
                defaults.disable_commands,
            )?,
            ollama_base_url: string_setting(
                "OLLAMA_BASE_URL",
                lookup("OLLAMA_BASE_URL"),
                defaults.ollama_base_url,
            )?,
            searxng_url: string_setting("SEARXNG_URL", lookup("SEARXNG_URL"), defaults.searxng_url)?,
            debug: bool_setting("DEBUG", lookup("DEBUG"), defaults.debug)?,
            verbose_node_names: bool_setting(
                "VERBOSE_NODE_NAMES",
                lookup("VERBOSE_NODE_NAMES"),
                defaults.verbose_node_names,
            )?,
        })
    }

    pub fn transcoder_options(&self) -> TranscoderOptions {
        TranscoderOptions {
            debug: self.debug,
            tracker: TrackerOptions {
                verbose_node_names: self.verbose_node_names,
                node_headers: self.debug,
            },
        }
    }
}

fn string_setting(
    name: &'static str,
    setting: Option<Setting<'_>>,
    default: String,
) -> Result<String, ConfigError> {
    match setting {
        None => Ok(default),
        Some(Setting::Env(value)) => Ok(value.to_string()),
        Some(Setting::Request(Value::String(value))) => Ok(value.clone()),
        Some(Setting::Request(Value::Number(value))) => Ok(value.to_string()),
        Some(Setting::Request(other)) => Err(ConfigError::Invalid { name, value: other.to_string() }),
    }
}

fn bool_setting(
    name: &'static str,
    setting: Option<Setting<'_>>,
    default: bool,
) -> Result<bool, ConfigError> {
    match setting {
        None => Ok(default),
        Some(Setting::Env(value)) => parse_bool(name, value),
        Some(Setting::Request(Value::Bool(value))) => Ok(*value),
        Some(Setting::Request(Value::String(value))) => parse_bool(name, value),
        Some(Setting::Request(other)) => Err(ConfigError::Invalid { name, value: other.to_string() }),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value: raw.to_string() }),
    }
}
