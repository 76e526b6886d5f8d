use thiserror::Error;

use crate::types::Provider;

#[derive(Debug, Error)]
pub enum CommitGenError {
   #[error("Workspace directory not found: {path}")]
   NoWorkspace { path: String },

   #[error("Not a git repository: {path}")]
   NotARepository { path: String },

   #[error("Nothing to generate for: no staged or working-tree changes")]
   NothingToCommit,

   #[error("Configuration error: {0}")]
   ConfigError(String),

   #[error("No allowed scopes configured in {path} (set `allowed_scopes` to at least one entry)")]
   MissingScopes { path: String },

   #[error("No API key found for {provider} (tried: {tried})")]
   MissingCredentials { provider: Provider, tried: String },

   #[error("The {provider} API rejected the configured API key")]
   KeyRejected { provider: Provider },

   #[error("The model returned no text")]
   EmptyResponse,

   #[error("Generated message failed validation after retry: {reason}")]
   ValidationFailed { reason: String },

   #[error("No output destination accepted the message: {0}")]
   NoSinkAvailable(String),

   #[error("API request failed (HTTP {status}): {body}")]
   ApiError { status: u16, body: String },

   #[error("Unrecognized response from {provider}: {detail}")]
   UnrecognizedResponse { provider: Provider, detail: String },

   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   JsonError(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   HttpError(#[from] reqwest::Error),

   #[error("Clipboard error: {0}")]
   ClipboardError(#[from] arboard::Error),
}

impl CommitGenError {
   /// Errors the user can act on directly. Everything else is reported as an
   /// unexpected failure and written to the diagnostics log.
   pub const fn is_user_facing(&self) -> bool {
      matches!(
         self,
         Self::NoWorkspace { .. }
            | Self::NotARepository { .. }
            | Self::NothingToCommit
            | Self::ConfigError(_)
            | Self::MissingScopes { .. }
            | Self::MissingCredentials { .. }
            | Self::KeyRejected { .. }
            | Self::EmptyResponse
            | Self::ValidationFailed { .. }
            | Self::NoSinkAvailable(_)
      )
   }
}

pub type Result<T> = std::result::Result<T, CommitGenError>;
