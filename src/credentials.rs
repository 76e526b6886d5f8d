//! API key resolution from an ordered list of sources.
use std::fmt;

use crate::{
   error::{CommitGenError, Result},
   types::Provider,
};

/// Crate-wide key variable, consulted for either provider
pub const GENERIC_KEY_ENV: &str = "COMMIT_FORGE_API_KEY";

/// One place an API key may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
   /// Key written in the settings file
   Explicit(Option<String>),
   /// Environment variable
   Env(&'static str),
}

impl fmt::Display for CredentialSource {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Explicit(_) => f.write_str("settings file api_key"),
         Self::Env(name) => f.write_str(name),
      }
   }
}

/// Sources for `provider` in priority order
pub fn credential_chain(provider: Provider, explicit: Option<&str>) -> Vec<CredentialSource> {
   vec![
      CredentialSource::Explicit(explicit.map(str::to_string)),
      CredentialSource::Env(GENERIC_KEY_ENV),
      CredentialSource::Env(provider.key_env_var()),
   ]
}

/// Resolve the API key for `provider` from the process environment
pub fn resolve_api_key(provider: Provider, explicit: Option<&str>) -> Result<String> {
   let chain = credential_chain(provider, explicit);
   resolve_with(provider, &chain, |name| std::env::var(name).ok())
}

/// First non-empty trimmed value along `chain`, reading env vars through `lookup`
pub fn resolve_with<F>(provider: Provider, chain: &[CredentialSource], lookup: F) -> Result<String>
where
   F: Fn(&str) -> Option<String>,
{
   for source in chain {
      let value = match source {
         CredentialSource::Explicit(value) => value.clone(),
         CredentialSource::Env(name) => lookup(name),
      };
      if let Some(key) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
         return Ok(key);
      }
   }

   let tried = chain
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(", ");
   Err(CommitGenError::MissingCredentials { provider, tried })
}
