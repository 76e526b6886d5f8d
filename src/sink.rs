//! Destinations for the final commit message.
use std::{
   io::{self, Write},
   path::PathBuf,
};

use arboard::Clipboard;

use crate::{
   error::{CommitGenError, Result},
   git, style,
};

/// Somewhere a finished commit message can be delivered
pub trait MessageSink {
   fn name(&self) -> &'static str;

   fn deliver(&self, message: &str) -> Result<()>;
}

/// Commit message file, as passed to a `prepare-commit-msg` hook
#[derive(Debug, Clone)]
pub struct MessageFileSink {
   pub path: PathBuf,
}

impl MessageSink for MessageFileSink {
   fn name(&self) -> &'static str {
      "message file"
   }

   fn deliver(&self, message: &str) -> Result<()> {
      let existing = match std::fs::read_to_string(&self.path) {
         Ok(contents) => contents,
         Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
         Err(e) => return Err(e.into()),
      };
      std::fs::write(&self.path, compose_message_file(message, &existing))?;
      Ok(())
   }
}

/// Message followed by the git comment lines already in the file
fn compose_message_file(message: &str, existing: &str) -> String {
   let comments: Vec<&str> = existing
      .lines()
      .filter(|line| line.starts_with('#'))
      .collect();

   let mut out = message.trim_end().to_string();
   out.push('\n');
   if !comments.is_empty() {
      out.push('\n');
      for line in comments {
         out.push_str(line);
         out.push('\n');
      }
   }
   out
}

/// `git commit -m` in the workspace
#[derive(Debug, Clone)]
pub struct GitCommitSink {
   pub dir:     PathBuf,
   pub dry_run: bool,
}

impl MessageSink for GitCommitSink {
   fn name(&self) -> &'static str {
      "git commit"
   }

   fn deliver(&self, message: &str) -> Result<()> {
      git::git_commit(message, self.dry_run, &self.dir)
   }
}

/// System clipboard
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipboardSink;

impl MessageSink for ClipboardSink {
   fn name(&self) -> &'static str {
      "clipboard"
   }

   fn deliver(&self, message: &str) -> Result<()> {
      let mut clipboard = Clipboard::new()?;
      clipboard.set_text(message)?;
      Ok(())
   }
}

/// Raw message on stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
   fn name(&self) -> &'static str {
      "stdout"
   }

   fn deliver(&self, message: &str) -> Result<()> {
      let mut stdout = io::stdout().lock();
      writeln!(stdout, "{}", message.trim_end())?;
      stdout.flush()?;
      Ok(())
   }
}

/// Deliver `message` to the first sink that accepts it, warning about each
/// one that fails. Returns the name of the sink used.
pub fn deliver_with_fallback(
   message: &str,
   sinks: &[Box<dyn MessageSink>],
) -> Result<&'static str> {
   let mut failures = Vec::new();

   for sink in sinks {
      match sink.deliver(message) {
         Ok(()) => return Ok(sink.name()),
         Err(e) => {
            style::warn(&format!("Could not deliver to {}: {e}", sink.name()));
            failures.push(format!("{}: {e}", sink.name()));
         },
      }
   }

   if failures.is_empty() {
      return Err(CommitGenError::NoSinkAvailable("no destination configured".to_string()));
   }
   Err(CommitGenError::NoSinkAvailable(failures.join("; ")))
}
