//! Append-only log for unexpected failures.
use std::{
   fs::OpenOptions,
   io::Write,
   path::{Path, PathBuf},
};

use chrono::{SecondsFormat, Utc};

use crate::error::{CommitGenError, Result};

#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
   path: PathBuf,
}

impl DiagnosticsLog {
   pub fn new(path: impl Into<PathBuf>) -> Self {
      Self { path: path.into() }
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Append one timestamped paragraph, creating the log and its parent
   /// directories on first use
   pub fn record(&self, description: &str) -> Result<()> {
      if let Some(parent) = self.path.parent()
         && !parent.as_os_str().is_empty()
      {
         std::fs::create_dir_all(parent)?;
      }

      let mut file = OpenOptions::new()
         .create(true)
         .append(true)
         .open(&self.path)?;
      let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
      writeln!(file, "[{timestamp}] {}\n", description.trim_end())?;
      Ok(())
   }

   /// Record an error with its full source chain
   pub fn record_error(&self, err: &CommitGenError) -> Result<()> {
      self.record(&describe_error(err))
   }
}

/// Display of `err` followed by each `source()` on its own line
pub fn describe_error(err: &dyn std::error::Error) -> String {
   let mut out = err.to_string();
   let mut source = err.source();
   while let Some(cause) = source {
      out.push_str("\n  caused by: ");
      out.push_str(&cause.to_string());
      source = cause.source();
   }
   out
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_record_appends_timestamped_paragraphs() {
      let dir = tempfile::tempdir().unwrap();
      let path = dir.path().join("nested/cache/diagnostics.log");
      let log = DiagnosticsLog::new(&path);

      log.record("first failure").unwrap();
      log.record("second failure\nwith detail\n").unwrap();

      let contents = std::fs::read_to_string(&path).unwrap();
      let paragraphs: Vec<&str> = contents.split("\n\n").filter(|p| !p.is_empty()).collect();
      assert_eq!(paragraphs.len(), 2);
      assert!(paragraphs[0].starts_with('['));
      assert!(paragraphs[0].ends_with("] first failure"));
      assert!(paragraphs[1].ends_with("] second failure\nwith detail"));

      // RFC 3339 UTC, e.g. [2026-10-16T09:30:00Z]
      let stamp = &paragraphs[0][1..paragraphs[0].find(']').unwrap()];
      assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
      assert!(stamp.ends_with('Z'));
   }

   #[test]
   fn test_record_error_includes_source_chain() {
      let dir = tempfile::tempdir().unwrap();
      let log = DiagnosticsLog::new(dir.path().join("diag.log"));
      let err = CommitGenError::from(std::io::Error::other("disk on fire"));
      log.record_error(&err).unwrap();

      let contents = std::fs::read_to_string(log.path()).unwrap();
      assert!(contents.contains("IO error: disk on fire"));
   }

   #[test]
   fn test_describe_error_chain() {
      let err = CommitGenError::from(std::io::Error::other("root cause"));
      assert_eq!(describe_error(&err), "IO error: root cause\n  caused by: root cause");

      let err = CommitGenError::GitError("git diff failed".to_string());
      assert_eq!(describe_error(&err), "Git command failed: git diff failed");
   }
}
