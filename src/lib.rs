//! Conventional commit message generator library
//!
//! Builds prompts from a repository's pending changes and project rules,
//! asks a hosted text-generation API for a commit message, then normalizes,
//! repairs and validates the result, retrying once with the failure reason.
pub mod api;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod git;
pub mod header;
pub mod normalization;
pub mod prompt;
pub mod repair;
pub mod rules;
pub mod sink;
pub mod style;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::CommitConfig;
pub use error::{CommitGenError, Result};
pub use generate::{GeneratedMessage, generate_commit_message};
pub use rules::RuleSet;
pub use types::{Provider, resolve_model_name};
pub use validation::validate_commit_message;
