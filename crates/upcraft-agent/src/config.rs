use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use upcraft_core::{UpcraftError, UpcraftResult};

/// Environment variable overriding [`SyncConfig::base_url`].
pub const RAG_URL_ENV: &str = "UPCRAFT_RAG_URL";

/// Top-level runtime configuration, read from `upcraft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpcraftConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub screen: ScreenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model turns per user turn.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Per-dispatch deadline. Unset means dispatches only end on cancellation.
    #[serde(default)]
    pub dispatch_timeout_ms: Option<u64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Model id passed to the provider; the provider default when unset.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_sync_enabled")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_sync_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Label the built-in rule clicks.
    #[serde(default = "default_target_label")]
    pub target_label: String,
    /// Skill of the action a CLICK intent dispatches.
    #[serde(default = "default_click_skill")]
    pub click_skill: String,
    /// Action a CLICK intent dispatches.
    #[serde(default = "default_click_action")]
    pub click_action: String,
}

fn default_max_turns() -> u32 {
    8
}

fn default_sync_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_sync_timeout_secs() -> u64 {
    5
}

fn default_target_label() -> String {
    "Play".to_string()
}

fn default_click_skill() -> String {
    "screen".to_string()
}

fn default_click_action() -> String {
    "click".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            dispatch_timeout_ms: None,
            system_prompt: None,
            model: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_sync_enabled(),
            base_url: default_base_url(),
            timeout_secs: default_sync_timeout_secs(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            target_label: default_target_label(),
            click_skill: default_click_skill(),
            click_action: default_click_action(),
        }
    }
}

impl AgentConfig {
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_ms.map(Duration::from_millis)
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl UpcraftConfig {
    /// Loads the config file at `path`, falling back to defaults when it does
    /// not exist, then applies environment overrides and validates.
    pub async fn load(path: &Path) -> UpcraftResult<Self> {
        let mut config = match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::from_toml_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(UpcraftError::Config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                )))
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> UpcraftResult<Self> {
        toml::from_str(raw).map_err(|e| UpcraftError::Config(e.to_string()))
    }

    /// Applies overrides from `lookup` (the process environment in [`Self::load`]).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(RAG_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.sync.base_url = url.to_string();
            }
        }
    }

    pub fn validate(&self) -> UpcraftResult<()> {
        if self.agent.max_turns == 0 {
            return Err(UpcraftError::Config("agent.max_turns must be at least 1".into()));
        }
        if self.screen.target_label.trim().is_empty() {
            return Err(UpcraftError::Config("screen.target_label must not be empty".into()));
        }
        if self.sync.enabled && self.sync.base_url.trim().is_empty() {
            return Err(UpcraftError::Config("sync.base_url must not be empty".into()));
        }
        Ok(())
    }
}
