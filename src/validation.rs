use thiserror::Error;

use crate::{header::parse_commit_header, rules::RuleSet};

/// First rule a commit message breaks. `Display` is the reason shown to the
/// user and fed back to the model on retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
   #[error("invalid header format: expected `type(scope): subject` or `type: subject`")]
   InvalidHeader,

   #[error("type \"{commit_type}\" is not allowed (allowed types: {allowed})")]
   TypeNotAllowed { commit_type: String, allowed: String },

   #[error("a scope is required (allowed scopes: {allowed})")]
   ScopeRequired { allowed: String },

   #[error("scope \"{scope}\" is not allowed (allowed scopes: {allowed})")]
   ScopeNotAllowed { scope: String, allowed: String },

   #[error("breaking changes are not allowed: remove the \"!\" marker")]
   BreakingNotAllowed,

   #[error("subject is empty")]
   EmptySubject,

   #[error("subject is {len} characters long (max {max})")]
   SubjectTooLong { len: usize, max: usize },
}

pub type ValidationResult = std::result::Result<(), Violation>;

/// Normalize CRLF and lone CR line endings to LF
pub fn normalize_line_endings(text: &str) -> String {
   text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Validate a commit message against the project rules.
///
/// Checks run in a fixed order and stop at the first violation, so the
/// returned reason is always the first broken rule.
pub fn validate_commit_message(message: &str, rules: &RuleSet) -> ValidationResult {
   let normalized = normalize_line_endings(message);
   let header_line = normalized.split('\n').next().unwrap_or("");

   let header = parse_commit_header(header_line).ok_or(Violation::InvalidHeader)?;

   if !rules.allowed_types.contains(&header.commit_type) {
      return Err(Violation::TypeNotAllowed {
         commit_type: header.commit_type,
         allowed:     join(rules.allowed_types.iter()),
      });
   }

   match &header.scope {
      Some(scope) if !rules.allowed_scopes.contains(scope) => {
         return Err(Violation::ScopeNotAllowed {
            scope:   scope.clone(),
            allowed: join(rules.allowed_scopes.iter()),
         });
      },
      None if rules.require_scope => {
         return Err(Violation::ScopeRequired { allowed: join(rules.allowed_scopes.iter()) });
      },
      _ => {},
   }

   if header.breaking && !rules.allow_breaking_change {
      return Err(Violation::BreakingNotAllowed);
   }

   if header.subject.trim().is_empty() {
      return Err(Violation::EmptySubject);
   }

   let len = header.subject.chars().count();
   if len > rules.max_subject_length {
      return Err(Violation::SubjectTooLong { len, max: rules.max_subject_length });
   }

   Ok(())
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
   items.map(String::as_str).collect::<Vec<_>>().join(", ")
}
