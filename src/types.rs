use std::{fmt, path::PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Hosted text-generation API wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
   /// Anthropic Messages API
   #[default]
   Anthropic,
   /// OpenAI Responses API
   #[value(name = "openai")]
   #[serde(rename = "openai")]
   OpenAi,
}

impl Provider {
   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Anthropic => "anthropic",
         Self::OpenAi => "openai",
      }
   }

   pub const fn default_base_url(self) -> &'static str {
      match self {
         Self::Anthropic => "https://api.anthropic.com",
         Self::OpenAi => "https://api.openai.com",
      }
   }

   pub const fn default_model(self) -> &'static str {
      match self {
         Self::Anthropic => "claude-sonnet-4-5",
         Self::OpenAi => "gpt-4.1-mini",
      }
   }

   /// Provider-specific API key environment variable
   pub const fn key_env_var(self) -> &'static str {
      match self {
         Self::Anthropic => "ANTHROPIC_API_KEY",
         Self::OpenAi => "OPENAI_API_KEY",
      }
   }

   pub fn parse(s: &str) -> Option<Self> {
      match s.trim().to_ascii_lowercase().as_str() {
         "anthropic" | "claude" => Some(Self::Anthropic),
         "openai" | "gpt" => Some(Self::OpenAi),
         _ => None,
      }
   }
}

impl fmt::Display for Provider {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// Which diff the generation context was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
   Staged,
   Working,
}

impl DiffKind {
   pub const fn as_str(self) -> &'static str {
      match self {
         Self::Staged => "staged",
         Self::Working => "working",
      }
   }
}

/// Inputs gathered from the repository for one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
   /// Porcelain status output
   pub status_summary: String,
   /// Diff text, already truncated to the configured budget
   pub diff:           String,
   pub diff_kind:      DiffKind,
}

/// Resolve model name from short aliases to full provider model names
pub fn resolve_model_name(name: &str) -> String {
   match name {
      // Claude short names
      "sonnet" | "s" => "claude-sonnet-4-5",
      "opus" | "o" => "claude-opus-4-1",
      "haiku" | "h" => "claude-haiku-4-5",

      // GPT short names
      "gpt5" | "g5" => "gpt-5",
      "gpt5-mini" => "gpt-5-mini",
      "gpt4.1" => "gpt-4.1",
      "gpt4.1-mini" | "mini" => "gpt-4.1-mini",
      "4o" => "gpt-4o",

      // Otherwise pass through as-is (allows full model names)
      _ => name,
   }
   .to_string()
}

// CLI Args
#[derive(Parser, Debug, Default)]
#[command(
   author,
   version,
   about = "Generate conventional commit messages from pending git changes",
   long_about = None
)]
pub struct Args {
   /// Workspace directory to run git commands in
   #[arg(long, default_value = ".")]
   pub dir: String,

   /// Path to settings file (default: ~/.config/commit-forge/config.toml)
   #[arg(long)]
   pub config: Option<PathBuf>,

   /// Text-generation provider
   #[arg(long, value_enum)]
   pub provider: Option<Provider>,

   /// Model for generation. Use short names (sonnet/haiku/gpt5) or full model
   /// names.
   #[arg(long, short = 'm')]
   pub model: Option<String>,

   /// Temperature for API calls (0.0-1.0)
   #[arg(long, short = 't')]
   pub temperature: Option<f32>,

   /// Also copy the message to clipboard
   #[arg(long)]
   pub copy: bool,

   /// Commit staged changes with the generated message
   #[arg(long)]
   pub commit: bool,

   /// Print the git commit command instead of running it
   #[arg(long, requires = "commit")]
   pub dry_run: bool,

   /// Write the message into a commit message file (e.g. from a
   /// prepare-commit-msg hook)
   #[arg(long, conflicts_with = "commit")]
   pub message_file: Option<PathBuf>,

   /// Validate an existing message file ("-" for stdin) and exit
   #[arg(long, conflicts_with_all = ["commit", "copy", "message_file", "show_prompt"])]
   pub check: Option<String>,

   /// Print the prompts that would be sent and exit
   #[arg(long)]
   pub show_prompt: bool,

   /// Additional context for the model (all trailing non-flag text)
   #[arg(trailing_var_arg = true)]
   pub context: Vec<String>,
}
