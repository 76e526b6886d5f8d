//! Conventional commit header parsing.
//!
//! Grammar, matched against the first line only:
//!
//! ```text
//! header  = type [ "(" scope ")" ] [ "!" ] ": " subject
//! type    = [a-z] [a-z0-9-]*
//! scope   = 1*( any char except ")" )
//! subject = 1*( any char ), surrounding whitespace trimmed
//! ```
use std::fmt;

/// Structured form of a `type(scope)!: subject` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
   pub commit_type: String,
   pub scope:       Option<String>,
   pub breaking:    bool,
   pub subject:     String,
}

impl fmt::Display for ParsedHeader {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.commit_type)?;
      if let Some(scope) = &self.scope {
         write!(f, "({scope})")?;
      }
      if self.breaking {
         f.write_str("!")?;
      }
      write!(f, ": {}", self.subject)
   }
}

/// Parse the header line of a commit message.
///
/// Returns `None` when the first line does not follow the grammar; this is a
/// predicate-style parse and never fails otherwise.
pub fn parse_commit_header(text: &str) -> Option<ParsedHeader> {
   let line = text.split('\n').next().unwrap_or("");
   let line = line.strip_suffix('\r').unwrap_or(line);

   let (commit_type, rest) = take_type(line)?;
   let (scope, rest) = take_scope(rest)?;
   let (breaking, rest) = match rest.strip_prefix('!') {
      Some(after) => (true, after),
      None => (false, rest),
   };
   let raw_subject = rest.strip_prefix(": ")?;
   if raw_subject.is_empty() {
      return None;
   }

   Some(ParsedHeader {
      commit_type: commit_type.to_string(),
      scope: scope.map(str::to_string),
      breaking,
      subject: raw_subject.trim().to_string(),
   })
}

/// `[a-z][a-z0-9-]*`
fn take_type(input: &str) -> Option<(&str, &str)> {
   let mut chars = input.char_indices();
   match chars.next() {
      Some((_, c)) if c.is_ascii_lowercase() => {},
      _ => return None,
   }
   let end = chars
      .find(|&(_, c)| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
      .map_or(input.len(), |(idx, _)| idx);
   Some(input.split_at(end))
}

/// Optional `(scope)`. A `(` without a closing `)` or with nothing inside is
/// not a header.
fn take_scope(input: &str) -> Option<(Option<&str>, &str)> {
   let Some(after_open) = input.strip_prefix('(') else {
      return Some((None, input));
   };
   let close = after_open.find(')')?;
   if close == 0 {
      return None;
   }
   Some((Some(&after_open[..close]), &after_open[close + 1..]))
}
