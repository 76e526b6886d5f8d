use std::{
   fmt::Write,
   path::{Path, PathBuf},
   process::{Command, Output},
};

use crate::{
   error::{CommitGenError, Result},
   style,
};

/// Read access to the repository the message is generated for
pub trait VersionControl {
   /// Directory the collaborator operates in
   fn workdir(&self) -> &Path;

   /// Whether the workspace is inside a git work tree
   fn is_repository(&self) -> Result<bool>;

   /// Short porcelain status of the work tree
   fn status_summary(&self) -> Result<String>;

   /// Diff of staged changes
   fn staged_diff(&self) -> Result<String>;

   /// Diff of unstaged changes, untracked files included as new files
   fn working_diff(&self) -> Result<String>;
}

/// `VersionControl` backed by the `git` command line
#[derive(Debug, Clone)]
pub struct GitCli {
   dir: PathBuf,
}

impl GitCli {
   pub fn new(dir: impl Into<PathBuf>) -> Self {
      Self { dir: dir.into() }
   }

   fn run(&self, args: &[&str]) -> Result<Output> {
      Command::new("git")
         .args(args)
         .current_dir(&self.dir)
         .output()
         .map_err(|e| {
            CommitGenError::GitError(format!("Failed to run git {}: {e}", args.join(" ")))
         })
   }

   /// Run git and return stdout, failing on a non-zero exit
   fn stdout(&self, args: &[&str]) -> Result<String> {
      let output = self.run(args)?;
      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         return Err(CommitGenError::GitError(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
         )));
      }
      Ok(String::from_utf8_lossy(&output.stdout).to_string())
   }

   fn untracked_files(&self) -> Result<Vec<String>> {
      let list = self.stdout(&["ls-files", "--others", "--exclude-standard"])?;
      Ok(list
         .lines()
         .filter(|s| !s.is_empty())
         .map(str::to_string)
         .collect())
   }
}

impl VersionControl for GitCli {
   fn workdir(&self) -> &Path {
      &self.dir
   }

   fn is_repository(&self) -> Result<bool> {
      let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
      Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
   }

   fn status_summary(&self) -> Result<String> {
      self.stdout(&["status", "--porcelain"])
   }

   fn staged_diff(&self) -> Result<String> {
      self.stdout(&["diff", "--cached"])
   }

   fn working_diff(&self) -> Result<String> {
      let mut combined = self.stdout(&["diff"])?;

      for file in self.untracked_files()? {
         let output = self.run(&["diff", "--no-index", "--", "/dev/null", &file])?;
         check_no_index_exit(&file, output.status.code(), &output.stderr)?;
         let raw = String::from_utf8_lossy(&output.stdout);
         if let Some(rendered) = render_new_file_diff(&file, &raw) {
            if !combined.is_empty() && !combined.ends_with('\n') {
               combined.push('\n');
            }
            combined.push_str(&rendered);
         }
      }

      Ok(combined)
   }
}

/// `git diff --no-index` exits with 1 when the files differ; any other
/// non-zero exit (unreadable file, killed by a signal) is an error
fn check_no_index_exit(file: &str, code: Option<i32>, stderr: &[u8]) -> Result<()> {
   match code {
      Some(0 | 1) => Ok(()),
      _ => {
         let stderr = String::from_utf8_lossy(stderr);
         let status = code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
         Err(CommitGenError::GitError(format!(
            "git diff --no-index for untracked file {file} exited with {status}: {}",
            stderr.trim()
         )))
      },
   }
}

/// Rewrite a `git diff --no-index /dev/null <file>` diff so it reads like a
/// regular new-file diff
fn render_new_file_diff(file: &str, raw: &str) -> Option<String> {
   let hunks: Vec<&str> = raw
      .lines()
      .skip_while(|line| !line.starts_with("@@") && !line.starts_with("Binary files"))
      .collect();
   if hunks.is_empty() {
      return None;
   }

   let mut out = String::new();
   let _ = writeln!(out, "diff --git a/{file} b/{file}");
   out.push_str("new file mode 100644\n");
   out.push_str("--- /dev/null\n");
   let _ = writeln!(out, "+++ b/{file}");
   for line in hunks {
      out.push_str(line);
      out.push('\n');
   }
   Some(out)
}

/// Top-level directory of the repository containing `dir`
pub fn repository_root(dir: &Path) -> Option<PathBuf> {
   let output = Command::new("git")
      .args(["rev-parse", "--show-toplevel"])
      .current_dir(dir)
      .output()
      .ok()?;
   if !output.status.success() {
      return None;
   }
   let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
   (!root.is_empty()).then(|| PathBuf::from(root))
}

/// Single-line rendering of the commit command shown by a dry run
fn dry_run_command(message: &str) -> String {
   format!("git commit -m \"{}\"", message.replace('\n', "\\n"))
}

/// Commit staged changes with `message`, or print the command to stderr when
/// `dry_run`
pub fn git_commit(message: &str, dry_run: bool, dir: &Path) -> Result<()> {
   if dry_run {
      let rule = style::separator(60);
      eprintln!("\n{rule}");
      eprintln!("DRY RUN - Would execute:");
      eprintln!("{}", dry_run_command(message));
      eprintln!("{rule}");
      return Ok(());
   }

   let output = Command::new("git")
      .args(["commit", "-m", message])
      .current_dir(dir)
      .output()
      .map_err(|e| CommitGenError::GitError(format!("Failed to run git commit: {e}")))?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      return Err(CommitGenError::GitError(format!(
         "Git commit failed:\nstderr: {stderr}\nstdout: {stdout}"
      )));
   }

   let stdout = String::from_utf8_lossy(&output.stdout);
   eprintln!("\n{}", stdout.trim_end());
   eprintln!("{} Successfully committed!", style::success(style::icons::SUCCESS));

   Ok(())
}
