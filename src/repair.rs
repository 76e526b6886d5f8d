//! Mechanical subject-length repair.
//!
//! An over-long subject is the one violation that can be fixed without asking
//! the model again. Everything else is left for the retry prompt.
use crate::{
   header::{ParsedHeader, parse_commit_header},
   rules::RuleSet,
   validation::{normalize_line_endings, validate_commit_message},
};

/// Clamp the subject of `message` to the rule set's length ceiling.
///
/// Returns the message unchanged when it already validates, when its header
/// does not parse, or when clamping the subject would not make it valid.
pub fn repair_subject(message: &str, rules: &RuleSet) -> String {
   if validate_commit_message(message, rules).is_ok() {
      return message.to_string();
   }

   let normalized = normalize_line_endings(message);
   let (header_line, rest) = normalized
      .split_once('\n')
      .unwrap_or((normalized.as_str(), ""));

   let Some(header) = parse_commit_header(header_line) else {
      return message.to_string();
   };

   let repaired_header = ParsedHeader {
      subject: clamp_subject(&header.subject, rules.max_subject_length),
      ..header
   };

   let body = rest.trim_end();
   let candidate = if body.trim().is_empty() {
      repaired_header.to_string()
   } else {
      format!("{repaired_header}\n{body}")
   };

   if validate_commit_message(&candidate, rules).is_ok() {
      candidate
   } else {
      message.to_string()
   }
}

/// Collapse whitespace runs, then hard-cut at `max` characters
fn clamp_subject(subject: &str, max: usize) -> String {
   let collapsed = subject.split_whitespace().collect::<Vec<_>>().join(" ");
   let cut: String = collapsed.chars().take(max).collect();
   cut.trim_end().to_string()
}
