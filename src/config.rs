use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
   error::{CommitGenError, Result},
   rules::SubjectCase,
   types::{Provider, resolve_model_name},
};

/// Project rules file, looked up at the repository root
pub const PROJECT_CONFIG_FILE: &str = ".commit-forge.toml";

/// User settings: provider, credentials, request shaping
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
   pub provider: Provider,

   /// Model name or short alias (defaults per provider)
   pub model: Option<String>,

   /// Optional API key (environment variables are consulted after this)
   pub api_key: Option<String>,

   /// Override for the provider's API base URL
   pub api_base_url: Option<String>,

   /// HTTP request timeout in seconds
   pub request_timeout_secs: u64,

   /// HTTP connection timeout in seconds
   pub connect_timeout_secs: u64,

   pub max_output_tokens: u32,
   pub temperature:       f32,

   /// Character budget for the diff sent to the model
   pub max_diff_chars: usize,

   /// Where unexpected failures are recorded
   pub diagnostics_log: Option<PathBuf>,
}

impl Default for CommitConfig {
   fn default() -> Self {
      Self {
         provider:             Provider::default(),
         model:                None,
         api_key:              None,
         api_base_url:         None,
         request_timeout_secs: 60,
         connect_timeout_secs: 10,
         max_output_tokens:    512,
         temperature:          0.2, // Low temperature for consistent formatting
         max_diff_chars:       12_000,
         diagnostics_log:      None,
      }
   }
}

impl CommitConfig {
   /// Load config from default location (~/.config/commit-forge/config.toml)
   /// Falls back to Default if the file doesn't exist. Environment variables
   /// override file values:
   /// - `COMMIT_FORGE_PROVIDER` overrides `provider`
   /// - `COMMIT_FORGE_MODEL` overrides `model`
   /// - `COMMIT_FORGE_API_URL` overrides `api_base_url`
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("COMMIT_FORGE_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_default()
      };

      let mut config = if config_path.is_file() {
         Self::parse_file(&config_path)?
      } else {
         Self::default()
      };

      config.apply_env_overrides()?;
      Ok(config)
   }

   /// Load config from specific file
   pub fn from_file(path: &Path) -> Result<Self> {
      let mut config = Self::parse_file(path)?;
      config.apply_env_overrides()?;
      Ok(config)
   }

   fn parse_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path).map_err(|e| {
         CommitGenError::ConfigError(format!("Failed to read {}: {e}", path.display()))
      })?;
      toml::from_str(&contents).map_err(|e| {
         CommitGenError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
      })
   }

   fn apply_env_overrides(&mut self) -> Result<()> {
      if let Some(raw) = non_empty_env("COMMIT_FORGE_PROVIDER") {
         self.provider = Provider::parse(&raw).ok_or_else(|| {
            CommitGenError::ConfigError(format!(
               "COMMIT_FORGE_PROVIDER must be 'anthropic' or 'openai', got '{raw}'"
            ))
         })?;
      }
      if let Some(model) = non_empty_env("COMMIT_FORGE_MODEL") {
         self.model = Some(model);
      }
      if let Some(url) = non_empty_env("COMMIT_FORGE_API_URL") {
         self.api_base_url = Some(url);
      }
      Ok(())
   }

   /// Resolved model identifier for the configured provider
   pub fn model_name(&self) -> String {
      self
         .model
         .as_deref()
         .map_or_else(|| self.provider.default_model().to_string(), resolve_model_name)
   }

   pub fn base_url(&self) -> &str {
      self
         .api_base_url
         .as_deref()
         .unwrap_or_else(|| self.provider.default_base_url())
         .trim_end_matches('/')
   }

   pub fn diagnostics_path(&self) -> PathBuf {
      self.diagnostics_log.clone().unwrap_or_else(|| {
         home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".cache/commit-forge/diagnostics.log")
      })
   }

   /// Get default config path (platform-safe)
   pub fn default_config_path() -> Result<PathBuf> {
      home_dir()
         .map(|home| home.join(".config/commit-forge/config.toml"))
         .ok_or_else(|| {
            CommitGenError::ConfigError(
               "No home directory found (tried HOME and USERPROFILE)".to_string(),
            )
         })
   }
}

/// Tries HOME (Unix/Linux/macOS) then USERPROFILE (Windows)
fn home_dir() -> Option<PathBuf> {
   non_empty_env("HOME")
      .or_else(|| non_empty_env("USERPROFILE"))
      .map(PathBuf::from)
}

fn non_empty_env(name: &str) -> Option<String> {
   std::env::var(name)
      .ok()
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
}

/// Project-level rules as written in `.commit-forge.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
   pub allowed_types:  Vec<String>,
   pub allowed_scopes: Vec<String>,
   pub rules:          RuleOverrides,
   pub prompt_hints:   Option<PromptHints>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleOverrides {
   pub max_subject_length:    Option<i64>,
   pub require_scope:         Option<bool>,
   pub allow_breaking_change: Option<bool>,
   pub subject_case:          Option<SubjectCase>,
}

/// `prompt_hints` accepts a single string or a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PromptHints {
   One(String),
   Many(Vec<String>),
}

impl PromptHints {
   pub fn iter(&self) -> impl Iterator<Item = &str> {
      match self {
         Self::One(hint) => std::slice::from_ref(hint).iter(),
         Self::Many(hints) => hints.iter(),
      }
      .map(String::as_str)
   }
}

impl ProjectConfig {
   /// Read the project rules file from `root`. A missing file yields `None`.
   pub fn load(root: &Path) -> Result<(PathBuf, Option<Self>)> {
      let path = root.join(PROJECT_CONFIG_FILE);
      if !path.is_file() {
         return Ok((path, None));
      }
      let contents = std::fs::read_to_string(&path).map_err(|e| {
         CommitGenError::ConfigError(format!("Failed to read {}: {e}", path.display()))
      })?;
      let parsed = Self::parse(&contents).map_err(|e| {
         CommitGenError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
      })?;
      Ok((path, Some(parsed)))
   }

   pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
      toml::from_str(contents)
   }
}
