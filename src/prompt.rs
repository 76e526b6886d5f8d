//! Prompt construction.
//!
//! Output is a pure function of its inputs: no timestamps, no randomness. The
//! retry prompts are built by appending to the originals, so equal inputs must
//! always render to equal bytes.
use std::fmt::Write;

use crate::{
   rules::{RuleSet, SubjectCase},
   types::{DiffKind, GenerationContext},
};

/// System and user prompt pair for one generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
   pub system: String,
   pub user:   String,
}

/// Build the system and user prompts for a first attempt
pub fn build_prompts(rules: &RuleSet, ctx: &GenerationContext) -> Prompts {
   Prompts { system: build_system_prompt(rules), user: build_user_prompt(ctx) }
}

fn build_system_prompt(rules: &RuleSet) -> String {
   let mut out = String::new();

   out.push_str(
      "You write git commit messages in the Conventional Commits format.\n\nOUTPUT \
       FORMAT:\nRespond with the commit message as plain text only. Do not wrap it in code \
       fences, quotes or markdown, and do not add any commentary. The first line is the \
       header `type(scope): subject`; an optional body follows after one blank line.\n",
   );

   out.push_str("\nALLOWED TYPES:\n");
   for commit_type in &rules.allowed_types {
      let _ = writeln!(out, "{commit_type}");
   }

   out.push_str("\nALLOWED SCOPES:\n");
   for scope in &rules.allowed_scopes {
      let _ = writeln!(out, "{scope}");
   }

   out.push('\n');
   if rules.require_scope {
      out.push_str("A scope is required: every header must use one of the allowed scopes.\n");
   } else {
      out.push_str(
         "A scope is optional: omit it for broad changes, otherwise use one of the allowed \
          scopes.\n",
      );
   }

   if rules.allow_breaking_change {
      out.push_str(
         "Breaking changes are allowed: mark them with \"!\" before the colon, as in \
          `feat(scope)!: subject`.\n",
      );
   } else {
      out.push_str("Breaking changes are not allowed: never use the \"!\" marker.\n");
   }

   let _ = writeln!(
      out,
      "The subject must be at most {} characters long.",
      rules.max_subject_length
   );

   match rules.subject_case {
      SubjectCase::Lower => out.push_str("Start the subject with a lowercase letter.\n"),
      SubjectCase::Sentence => out.push_str("Start the subject with an uppercase letter.\n"),
      SubjectCase::Any => {},
   }

   if !rules.prompt_hints.is_empty() {
      out.push_str("\n=== PROJECT HINTS ===\n");
      for hint in &rules.prompt_hints {
         let _ = writeln!(out, "- {hint}");
      }
      out.push_str("=== END PROJECT HINTS ===\n");
   }

   out
}

fn build_user_prompt(ctx: &GenerationContext) -> String {
   let mut out = String::new();

   match ctx.diff_kind {
      DiffKind::Staged => {
         out.push_str("Write a commit message for the following staged changes.\n");
      },
      DiffKind::Working => out.push_str(
         "Nothing is staged. Write a commit message for the following working tree changes.\n",
      ),
   }

   out.push_str("\nSTATUS:\n");
   let status = ctx.status_summary.trim_end();
   if status.is_empty() {
      out.push_str("(clean)\n");
   } else {
      let _ = writeln!(out, "{status}");
   }

   let _ = write!(out, "\nDIFF:\n{}", ctx.diff.trim_end());
   out.push('\n');

   out
}

/// Append free-form context supplied by the user to the user prompt
pub fn with_user_context(prompts: Prompts, user_context: Option<&str>) -> Prompts {
   match user_context.map(str::trim).filter(|c| !c.is_empty()) {
      Some(context) => Prompts {
         user: format!("{}\nADDITIONAL CONTEXT FROM USER:\n{context}\n", prompts.user),
         ..prompts
      },
      None => prompts,
   }
}

/// Build the second-attempt prompts from the first attempt's prompts, the
/// validation failure reason and the rejected candidate
pub fn build_retry_prompts(original: &Prompts, reason: &str, rejected: &str) -> Prompts {
   let system = format!(
      "{}\n=== PREVIOUS ATTEMPT REJECTED ===\nYour previous commit message failed validation: \
       {reason}\nCorrect this problem and respond with a new commit message that satisfies every \
       rule above.\n",
      original.system
   );
   let user = format!(
      "{}\nREJECTED MESSAGE (for reference only, do not repeat its mistake):\n{}\n",
      original.user,
      rejected.trim_end()
   );
   Prompts { system, user }
}
