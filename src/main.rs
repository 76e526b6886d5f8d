use std::{
   io::{self, IsTerminal, Read},
   path::{Path, PathBuf},
   process::ExitCode,
};

use clap::Parser;
use commit_forge::{
   api::HttpGenerator,
   config::{CommitConfig, ProjectConfig},
   credentials::resolve_api_key,
   diagnostics::DiagnosticsLog,
   error::{CommitGenError, Result},
   generate::{GenerationSettings, gather_context, generate_commit_message},
   git::{self, GitCli},
   header::parse_commit_header,
   prompt::{build_prompts, with_user_context},
   rules::RuleSet,
   sink::{
      ClipboardSink, GitCommitSink, MessageFileSink, MessageSink, StdoutSink, deliver_with_fallback,
   },
   style,
   types::Args,
   validation::validate_commit_message,
};

/// Load config from args or default
fn load_config_from_args(args: &Args) -> Result<CommitConfig> {
   if let Some(ref config_path) = args.config {
      CommitConfig::from_file(config_path)
   } else {
      CommitConfig::load()
   }
}

/// Apply CLI overrides to config
fn apply_cli_overrides(config: &mut CommitConfig, args: &Args) {
   if let Some(provider) = args.provider {
      config.provider = provider;
   }
   if let Some(ref model) = args.model {
      config.model = Some(model.clone());
   }
   if let Some(temp) = args.temperature {
      if (0.0..=1.0).contains(&temp) {
         config.temperature = temp;
      } else {
         style::warn(&format!(
            "Temperature {temp} out of range [0.0, 1.0], using {}",
            config.temperature
         ));
      }
   }
}

/// Resolve project rules from the repository root, or `dir` outside a
/// repository
fn load_rules(dir: &Path) -> Result<RuleSet> {
   let root = git::repository_root(dir).unwrap_or_else(|| dir.to_path_buf());
   match ProjectConfig::load(&root)? {
      (path, Some(project)) => RuleSet::resolve(&project, &path),
      (path, None) => Err(CommitGenError::MissingScopes { path: path.display().to_string() }),
   }
}

/// Read the message to check from a file, or stdin for "-"
fn read_check_input(source: &str) -> Result<String> {
   let read = if source == "-" {
      let mut message = String::new();
      io::stdin().read_to_string(&mut message).map(|_| message)
   } else {
      std::fs::read_to_string(source)
   };
   read.map_err(|e| {
      CommitGenError::ConfigError(format!("Failed to read message to check from {source}: {e}"))
   })
}

/// Character count of the subject in a generated header
fn subject_length(message: &str) -> usize {
   parse_commit_header(message).map_or(0, |header| header.subject.chars().count())
}

/// Drop git comment lines so a commit message file checks the same as the
/// message git will record
fn strip_comment_lines(message: &str) -> String {
   message
      .lines()
      .filter(|line| !line.starts_with('#'))
      .collect::<Vec<_>>()
      .join("\n")
      .trim()
      .to_string()
}

/// Primary destination for the message, followed by fallbacks
fn build_sinks(args: &Args, dir: &Path, stdout_is_terminal: bool) -> Vec<Box<dyn MessageSink>> {
   let primary: Option<Box<dyn MessageSink>> = if let Some(ref path) = args.message_file {
      Some(Box::new(MessageFileSink { path: path.clone() }))
   } else if args.commit {
      Some(Box::new(GitCommitSink { dir: dir.to_path_buf(), dry_run: args.dry_run }))
   } else {
      None
   };

   match primary {
      Some(sink) => vec![sink, Box::new(ClipboardSink), Box::new(StdoutSink)],
      // On a terminal the boxed message is the output
      None if stdout_is_terminal => Vec::new(),
      None => vec![Box::new(StdoutSink)],
   }
}

fn user_context(args: &Args) -> Option<String> {
   let joined = args.context.join(" ");
   (!joined.trim().is_empty()).then_some(joined)
}

fn run_check(source: &str, rules: &RuleSet) -> Result<ExitCode> {
   let message = strip_comment_lines(&read_check_input(source)?);
   match validate_commit_message(&message, rules) {
      Ok(()) => {
         eprintln!("{} Message follows the project rules", style::success(style::icons::SUCCESS));
         Ok(ExitCode::SUCCESS)
      },
      Err(violation) => {
         style::print_error(&format!("Message rejected: {violation}"));
         Ok(ExitCode::FAILURE)
      },
   }
}

fn run(args: &Args, diagnostics: &mut DiagnosticsLog) -> Result<ExitCode> {
   let mut config = load_config_from_args(args)?;
   *diagnostics = DiagnosticsLog::new(config.diagnostics_path());
   apply_cli_overrides(&mut config, args);

   let dir = PathBuf::from(&args.dir);
   if !dir.is_dir() {
      return Err(CommitGenError::NoWorkspace { path: args.dir.clone() });
   }

   let rules = load_rules(&dir)?;

   if let Some(ref source) = args.check {
      return run_check(source, &rules);
   }

   let vcs = GitCli::new(&dir);
   let ctx = gather_context(&vcs, config.max_diff_chars)?;
   let user_context = user_context(args);

   if args.show_prompt {
      let prompts = with_user_context(build_prompts(&rules, &ctx), user_context.as_deref());
      println!("{}", style::separator(20));
      println!("SYSTEM PROMPT\n{}", prompts.system);
      println!("{}", style::separator(20));
      println!("USER PROMPT\n{}", prompts.user);
      return Ok(ExitCode::SUCCESS);
   }

   let settings = GenerationSettings {
      api_key:           resolve_api_key(config.provider, config.api_key.as_deref())?,
      model:             config.model_name(),
      max_output_tokens: config.max_output_tokens,
      temperature:       config.temperature,
   };
   let generator = HttpGenerator::from_config(&config)?;

   style::print_info(&format!(
      "Using {} via {} (temp: {}) on {} changes",
      style::model(&settings.model),
      config.provider,
      settings.temperature,
      ctx.diff_kind.as_str()
   ));

   let generated = style::with_spinner_result("Generating commit message...", || {
      generate_commit_message(&generator, &rules, &ctx, &settings, user_context.as_deref())
   })?;

   if generated.repaired {
      style::print_info(&format!(
         "Subject shortened to {} characters",
         subject_length(&generated.message)
      ));
   }

   let boxed = style::boxed_message("Commit Message", &generated.message, style::term_width());
   eprintln!("\n{boxed}\n");

   let sinks = build_sinks(args, &dir, io::stdout().is_terminal());
   let delivered = if sinks.is_empty() {
      None
   } else {
      let used = deliver_with_fallback(&generated.message, &sinks)?;
      if used != "stdout" {
         style::print_info(&format!("Message delivered to {used}"));
      }
      Some(used)
   };

   if args.copy && delivered != Some("clipboard") {
      match ClipboardSink.deliver(&generated.message) {
         Ok(()) => eprintln!("{} Copied to clipboard", style::icons::CLIPBOARD),
         Err(e) => style::warn(&format!("Failed to copy to clipboard: {e}")),
      }
   }

   Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
   dotenvy::dotenv().ok();
   let args = Args::parse();

   let mut diagnostics = DiagnosticsLog::new(CommitConfig::default().diagnostics_path());
   match run(&args, &mut diagnostics) {
      Ok(code) => code,
      Err(e) if e.is_user_facing() => {
         style::print_error(&e.to_string());
         ExitCode::FAILURE
      },
      Err(e) => {
         match diagnostics.record_error(&e) {
            Ok(()) => style::print_error(&format!(
               "unexpected error, see {}",
               diagnostics.path().display()
            )),
            Err(_) => style::print_error(&format!("unexpected error: {e}")),
         }
         ExitCode::FAILURE
      },
   }
}

#[cfg(test)]
mod tests {
   use commit_forge::types::Provider;

   use super::*;

   #[test]
   fn test_cli_overrides() {
      let mut config = CommitConfig::default();
      let args = Args {
         provider: Some(Provider::OpenAi),
         model: Some("mini".to_string()),
         temperature: Some(0.7),
         ..Default::default()
      };
      apply_cli_overrides(&mut config, &args);
      assert_eq!(config.provider, Provider::OpenAi);
      assert_eq!(config.model_name(), "gpt-4.1-mini");
      assert!((config.temperature - 0.7).abs() < f32::EPSILON);
   }

   #[test]
   fn test_out_of_range_temperature_ignored() {
      let mut config = CommitConfig::default();
      let before = config.temperature;
      let args = Args { temperature: Some(1.5), ..Default::default() };
      apply_cli_overrides(&mut config, &args);
      assert!((config.temperature - before).abs() < f32::EPSILON);
   }

   #[test]
   fn test_sink_chains() {
      let dir = Path::new(".");
      let names = |sinks: Vec<Box<dyn MessageSink>>| -> Vec<&'static str> {
         sinks.iter().map(|s| s.name()).collect()
      };

      let args = Args { message_file: Some(PathBuf::from("MSG")), ..Default::default() };
      assert_eq!(names(build_sinks(&args, dir, true)), vec!["message file", "clipboard", "stdout"]);

      let args = Args { commit: true, ..Default::default() };
      assert_eq!(names(build_sinks(&args, dir, true)), vec!["git commit", "clipboard", "stdout"]);

      let args = Args::default();
      assert!(build_sinks(&args, dir, true).is_empty());
      assert_eq!(names(build_sinks(&args, dir, false)), vec!["stdout"]);
   }

   #[test]
   fn test_user_context_joined() {
      let args =
         Args { context: vec!["fixes".to_string(), "#12".to_string()], ..Default::default() };
      assert_eq!(user_context(&args).as_deref(), Some("fixes #12"));
      assert_eq!(user_context(&Args::default()), None);
   }

   #[test]
   fn test_subject_length_counts_actual_subject() {
      assert_eq!(subject_length("feat(core): tighten loader\n\nBody text."), 14);
      assert_eq!(subject_length("fix: é"), 1);
      assert_eq!(subject_length("not a header"), 0);
   }

   #[test]
   fn test_missing_check_file_is_user_facing() {
      let dir = tempfile::tempdir().unwrap();
      let missing = dir.path().join("COMMIT_EDITMSG");
      let err = read_check_input(&missing.display().to_string()).unwrap_err();
      assert!(matches!(err, CommitGenError::ConfigError(_)));
      assert!(err.is_user_facing());
      assert!(err.to_string().contains("COMMIT_EDITMSG"));
   }

   #[test]
   fn test_check_file_read() {
      let dir = tempfile::tempdir().unwrap();
      let path = dir.path().join("MSG");
      std::fs::write(&path, "feat(core): add loader\n").unwrap();
      let message = read_check_input(&path.display().to_string()).unwrap();
      assert_eq!(message, "feat(core): add loader\n");
   }

   #[test]
   fn test_strip_comment_lines() {
      let message = "feat(core): add loader\n\nBody.\n\n# Please enter the commit message\n# On \
                     branch main\n";
      assert_eq!(strip_comment_lines(message), "feat(core): add loader\n\nBody.");
   }

   #[test]
   fn test_rules_file_required() {
      let dir = tempfile::tempdir().unwrap();
      let err = load_rules(dir.path()).unwrap_err();
      assert!(matches!(err, CommitGenError::MissingScopes { .. }));

      std::fs::write(
         dir.path().join(".commit-forge.toml"),
         "allowed_scopes = [\"core\"]\n[rules]\nrequire_scope = true\n",
      )
      .unwrap();
      let rules = load_rules(dir.path()).unwrap();
      assert!(rules.require_scope);
      assert!(rules.allowed_scopes.contains("core"));
   }
}
