use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Client settings, kept at `~/.config/plebchat/envoy.json`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub server_url: String,
    /// Sent as the request's `config` map on every turn.
    #[serde(default)]
    pub valves: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        let mut valves = Map::new();
        valves.insert("LLM_MODEL".to_string(), Value::from("llama3.1:8b"));
        valves.insert("KEEP_ALIVE".to_string(), Value::from("5m"));
        valves.insert("DEBUG".to_string(), Value::from(false));
        Self {
            server_url: "http://localhost:9000".to_string(),
            valves,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Set a valve from a command-line value. JSON literals are parsed,
    /// anything else is kept as a string.
    pub fn set_valve(&mut self, name: &str, raw: &str) {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        self.valves.insert(name.to_uppercase(), value);
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".config").join("plebchat").join("envoy.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valves_parse_json_literals() {
        let mut config = Config::default();
        config.set_valve("debug", "true");
        config.set_valve("llm_model", "qwen3:4b-q8_0");
        assert_eq!(config.valves["DEBUG"], Value::from(true));
        assert_eq!(config.valves["LLM_MODEL"], Value::from("qwen3:4b-q8_0"));
    }

    #[test]
    fn missing_valves_default_to_empty() {
        let config: Config = serde_json::from_str(r#"{"server_url":"http://x:9000"}"#).unwrap();
        assert!(config.valves.is_empty());
    }
}
