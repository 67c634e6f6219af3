//! Configuration management for Grammar Pointer
//!
//! Handles loading and parsing of `grammar-pointer.toml` configuration file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::renderer::{OverlapStrategy, SpanRenderer};
use crate::style::{StyleTable, DEFAULT_BASE_OFFSET_PX, DEFAULT_OFFSET_STEP_PX};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Shared-password access
    #[serde(default)]
    pub access: AccessConfig,

    /// Input handling
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Underline rendering
    #[serde(default)]
    pub render: RenderConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "claude", "openai", or "none"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key (can also be set via environment variable)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (e.g., "claude-3-5-sonnet-20240620", "gpt-4o")
    #[serde(default)]
    pub model: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Instructions placed before the text to check
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            model: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            prompt: default_prompt(),
        }
    }
}

/// Passwords that unlock a shared API key
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub passwords: Vec<String>,

    #[serde(default)]
    pub shared_api_key: Option<String>,
}

/// Input handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Only this many characters of the input are sent to the model
    #[serde(default = "default_max_characters")]
    pub max_characters: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_characters: default_max_characters(),
        }
    }
}

/// Underline rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub overlap: OverlapStrategy,

    #[serde(default = "default_base_offset")]
    pub base_offset_px: u32,

    #[serde(default = "default_offset_step")]
    pub offset_step_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapStrategy::default(),
            base_offset_px: default_base_offset(),
            offset_step_px: default_offset_step(),
        }
    }
}

impl RenderConfig {
    pub fn renderer(&self) -> SpanRenderer {
        SpanRenderer::new(
            StyleTable::new(self.base_offset_px, self.offset_step_px),
            self.overlap,
        )
    }
}

/// API key used for a single model call
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential").field("api_key", &"***").finish()
    }
}

fn default_provider() -> String {
    "claude".to_string()
}

fn default_max_tokens() -> u32 {
    3025
}

fn default_prompt() -> String {
    r#"Du bist ein sorgfältiger Korrektor für deutsche Texte. Prüfe den folgenden Text Satz für Satz auf Fehler in Grammatik, Rechtschreibung, Zeichensetzung, Wortwahl und Wortstellung.
Antworte ausschließlich mit einem JSON-Array. Jedes Element hat die Felder "Satz" (der vollständige Satz, unverändert), "Satzteil" (der fehlerhafte Teil, wörtlich aus dem Satz) und "Fehler" (eine der Kategorien "Grammatik", "Rechtschreibung", "Zeichensetzung", "Wortwahl", "Wortstellung").
Sätze ohne Fehler erscheinen mit leerem "Satzteil" und leerem "Fehler"."#
        .to_string()
}

fn default_max_characters() -> usize {
    1500
}

fn default_base_offset() -> u32 {
    DEFAULT_BASE_OFFSET_PX
}

fn default_offset_step() -> u32 {
    DEFAULT_OFFSET_STEP_PX
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "grammar-pointer")
            .map(|dirs| dirs.config_dir().join("grammar-pointer.toml"))
    }

    /// Load configuration from default path or working directory
    pub fn load_from_default() -> Self {
        let workspace_path = PathBuf::from("grammar-pointer.toml");
        if workspace_path.exists() {
            match Self::load(&workspace_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring {}: {}", workspace_path.display(), e),
            }
        }

        if let Some(default_path) = Self::default_path() {
            if let Ok(config) = Self::load(&default_path) {
                return config;
            }
        }

        Config::default()
    }

    /// Get the effective API key (from config or environment)
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.llm.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_key = match self.llm.provider.as_str() {
            "claude" => std::env::var("ANTHROPIC_API_KEY").ok(),
            "openai" => std::env::var("OPENAI_API_KEY").ok(),
            _ => None,
        };
        env_key.filter(|key| !key.is_empty())
    }

    /// Get the effective model name
    pub fn get_model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| match self.llm.provider.as_str() {
                "claude" => "claude-3-5-sonnet-20240620".to_string(),
                "openai" => "gpt-4o".to_string(),
                _ => String::new(),
            })
    }

    /// Check if a model provider is selected
    pub fn is_llm_enabled(&self) -> bool {
        self.llm.provider != "none"
    }

    /// Turn what the user typed into a credential.
    ///
    /// A configured password unlocks the shared key; anything else is taken
    /// as an API key. Without input, the key from config or environment is used.
    pub fn resolve_credential(&self, input: Option<&str>) -> Option<Credential> {
        match input.map(str::trim).filter(|s| !s.is_empty()) {
            Some(input) if self.access.passwords.iter().any(|p| p == input) => {
                tracing::debug!("Password accepted, using shared API key");
                self.access
                    .shared_api_key
                    .as_deref()
                    .filter(|key| !key.is_empty())
                    .map(Credential::new)
            }
            Some(input) => Some(Credential::new(input)),
            None => self.get_api_key().map(Credential::new),
        }
    }
}
