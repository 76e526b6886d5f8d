//! Project commit rules, resolved once per invocation from `.commit-forge.toml`.
use std::path::Path;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::{
   config::ProjectConfig,
   error::{CommitGenError, Result},
   style,
};

pub const DEFAULT_MAX_SUBJECT_LENGTH: usize = 72;
pub const MIN_SUBJECT_LENGTH: usize = 20;
pub const MAX_SUBJECT_LENGTH: usize = 120;

/// Types used when the project does not list its own
pub const DEFAULT_TYPES: &[&str] = &[
   "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

/// Casing the subject should start with. Only steers the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectCase {
   Lower,
   Sentence,
   #[default]
   Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
   pub allowed_types:         IndexSet<String>,
   pub allowed_scopes:        IndexSet<String>,
   pub max_subject_length:    usize,
   pub require_scope:         bool,
   pub allow_breaking_change: bool,
   pub subject_case:          SubjectCase,
   pub prompt_hints:          Vec<String>,
}

impl RuleSet {
   /// Rule set with default types and policies over the given scopes
   pub fn with_scopes<S: AsRef<str>>(scopes: &[S]) -> Self {
      Self {
         allowed_types:         DEFAULT_TYPES.iter().map(|t| (*t).to_string()).collect(),
         allowed_scopes:        scopes.iter().map(|s| s.as_ref().to_string()).collect(),
         max_subject_length:    DEFAULT_MAX_SUBJECT_LENGTH,
         require_scope:         false,
         allow_breaking_change: true,
         subject_case:          SubjectCase::Any,
         prompt_hints:          Vec::new(),
      }
   }

   /// Resolve the project's rules, applying defaults and bounds.
   ///
   /// `source` names the file the project config came from, for error
   /// messages.
   pub fn resolve(project: &ProjectConfig, source: &Path) -> Result<Self> {
      let mut allowed_types = clean_entries(&project.allowed_types);
      if allowed_types.is_empty() {
         allowed_types = DEFAULT_TYPES.iter().map(|t| (*t).to_string()).collect();
      }

      let allowed_scopes = clean_entries(&project.allowed_scopes);
      if allowed_scopes.is_empty() {
         return Err(CommitGenError::MissingScopes { path: source.display().to_string() });
      }

      let max_subject_length = match project.rules.max_subject_length {
         Some(requested) => clamp_subject_length(requested),
         None => DEFAULT_MAX_SUBJECT_LENGTH,
      };

      let prompt_hints = project
         .prompt_hints
         .as_ref()
         .map(|hints| {
            hints
               .iter()
               .map(str::trim)
               .filter(|h| !h.is_empty())
               .map(str::to_string)
               .collect()
         })
         .unwrap_or_default();

      Ok(Self {
         allowed_types,
         allowed_scopes,
         max_subject_length,
         require_scope: project.rules.require_scope.unwrap_or(false),
         allow_breaking_change: project.rules.allow_breaking_change.unwrap_or(true),
         subject_case: project.rules.subject_case.unwrap_or_default(),
         prompt_hints,
      })
   }
}

fn clean_entries(entries: &[String]) -> IndexSet<String> {
   entries
      .iter()
      .map(|e| e.trim())
      .filter(|e| !e.is_empty())
      .map(str::to_string)
      .collect()
}

fn clamp_subject_length(requested: i64) -> usize {
   let clamped = requested.clamp(MIN_SUBJECT_LENGTH as i64, MAX_SUBJECT_LENGTH as i64) as usize;
   if clamped as i64 != requested {
      style::warn(&format!(
         "max_subject_length {requested} out of range [{MIN_SUBJECT_LENGTH}, \
          {MAX_SUBJECT_LENGTH}], using {clamped}"
      ));
   }
   clamped
}
