//! Generation pipeline: prompts, one model call, normalize, repair, validate,
//! and at most one retry with the failure reason fed back.
use crate::{
   api::{GenerationRequest, TextGenerator},
   error::{CommitGenError, Result},
   git::VersionControl,
   normalization::normalize_response,
   prompt::{Prompts, build_prompts, build_retry_prompts, with_user_context},
   repair::repair_subject,
   rules::RuleSet,
   style,
   types::{DiffKind, GenerationContext},
   validation::validate_commit_message,
};

/// Final output of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
   pub message:  String,
   /// Model calls made, 1 or 2
   pub attempts: u8,
   /// Whether the subject was clamped mechanically
   pub repaired: bool,
}

/// Per-invocation request settings
#[derive(Debug, Clone)]
pub struct GenerationSettings {
   pub api_key:           String,
   pub model:             String,
   pub max_output_tokens: u32,
   pub temperature:       f32,
}

/// Collect status and diff from the repository.
///
/// The staged diff is used when there is one, otherwise the working tree diff.
pub fn gather_context(
   vcs: &dyn VersionControl,
   max_diff_chars: usize,
) -> Result<GenerationContext> {
   if !vcs.is_repository()? {
      return Err(CommitGenError::NotARepository { path: vcs.workdir().display().to_string() });
   }

   let staged = vcs.staged_diff()?;
   let (diff, diff_kind) = if staged.trim().is_empty() {
      let working = vcs.working_diff()?;
      if working.trim().is_empty() {
         return Err(CommitGenError::NothingToCommit);
      }
      (working, DiffKind::Working)
   } else {
      (staged, DiffKind::Staged)
   };

   Ok(GenerationContext {
      status_summary: vcs.status_summary()?,
      diff: truncate_diff(&diff, max_diff_chars),
      diff_kind,
   })
}

fn truncation_marker(dropped: usize) -> String {
   format!("[... diff truncated: {dropped} characters omitted ...]\n")
}

/// Cut `diff` to at most `max_chars` characters, marker included, at a line
/// boundary and note how much was dropped.
///
/// A budget too small to hold the marker yields the marker alone.
pub fn truncate_diff(diff: &str, max_chars: usize) -> String {
   let total = diff.chars().count();
   if total <= max_chars {
      return diff.to_string();
   }

   // Sized for the largest possible count, plus a newline after a cut line
   let reserved = truncation_marker(total).chars().count() + 1;
   let budget = max_chars.saturating_sub(reserved);

   let limit = diff
      .char_indices()
      .nth(budget)
      .map_or(diff.len(), |(idx, _)| idx);
   let prefix = &diff[..limit];
   let kept = prefix.rfind('\n').map_or(prefix, |nl| &prefix[..=nl]);

   let dropped = total - kept.chars().count();
   let mut out = kept.to_string();
   if !out.is_empty() && !out.ends_with('\n') {
      out.push('\n');
   }
   out.push_str(&truncation_marker(dropped));
   out
}

/// One candidate after normalize and repair, with its validation outcome
struct Attempt {
   message:  String,
   repaired: bool,
   failure:  Option<String>,
}

fn run_attempt(
   generator: &dyn TextGenerator,
   prompts: &Prompts,
   settings: &GenerationSettings,
   rules: &RuleSet,
) -> Result<Attempt> {
   let request = GenerationRequest {
      api_key:           settings.api_key.clone(),
      model:             settings.model.clone(),
      system_prompt:     prompts.system.clone(),
      user_prompt:       prompts.user.clone(),
      max_output_tokens: settings.max_output_tokens,
      temperature:       settings.temperature,
   };

   let raw = generator.generate(&request).map_err(|e| match e {
      CommitGenError::ApiError { status: 401, .. } => {
         CommitGenError::KeyRejected { provider: generator.provider() }
      },
      other => other,
   })?;

   let normalized = normalize_response(&raw);
   let message = repair_subject(&normalized, rules);
   let repaired = message != normalized;
   let failure = validate_commit_message(&message, rules)
      .err()
      .map(|v| v.to_string());

   Ok(Attempt { message, repaired, failure })
}

/// Generate a commit message that satisfies `rules`, retrying once with the
/// validation failure reason if the first candidate is rejected
pub fn generate_commit_message(
   generator: &dyn TextGenerator,
   rules: &RuleSet,
   ctx: &GenerationContext,
   settings: &GenerationSettings,
   user_context: Option<&str>,
) -> Result<GeneratedMessage> {
   let prompts = with_user_context(build_prompts(rules, ctx), user_context);

   let first = run_attempt(generator, &prompts, settings, rules)?;
   let Some(reason) = first.failure else {
      return Ok(GeneratedMessage { message: first.message, attempts: 1, repaired: first.repaired });
   };

   style::warn(&format!("Generated message rejected: {reason}. Retrying once."));
   let retry_prompts = build_retry_prompts(&prompts, &reason, &first.message);

   let second = run_attempt(generator, &retry_prompts, settings, rules)?;
   match second.failure {
      None => {
         Ok(GeneratedMessage { message: second.message, attempts: 2, repaired: second.repaired })
      },
      Some(reason) => Err(CommitGenError::ValidationFailed { reason }),
   }
}

#[cfg(test)]
mod tests {
   use std::{
      cell::RefCell,
      collections::VecDeque,
      path::{Path, PathBuf},
   };

   use super::*;
   use crate::types::Provider;

   struct FakeGenerator {
      responses: RefCell<VecDeque<Result<String>>>,
      requests:  RefCell<Vec<GenerationRequest>>,
   }

   impl FakeGenerator {
      fn new(responses: Vec<Result<String>>) -> Self {
         Self { responses: RefCell::new(responses.into()), requests: RefCell::new(Vec::new()) }
      }

      fn replying(texts: &[&str]) -> Self {
         Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
      }
   }

   impl TextGenerator for FakeGenerator {
      fn provider(&self) -> Provider {
         Provider::Anthropic
      }

      fn generate(&self, request: &GenerationRequest) -> Result<String> {
         self.requests.borrow_mut().push(request.clone());
         self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(CommitGenError::EmptyResponse))
      }
   }

   struct FakeRepo {
      repository: bool,
      staged:     String,
      working:    String,
   }

   impl VersionControl for FakeRepo {
      fn workdir(&self) -> &Path {
         Path::new("/work/project")
      }

      fn is_repository(&self) -> Result<bool> {
         Ok(self.repository)
      }

      fn status_summary(&self) -> Result<String> {
         Ok("M  src/lib.rs\n".to_string())
      }

      fn staged_diff(&self) -> Result<String> {
         Ok(self.staged.clone())
      }

      fn working_diff(&self) -> Result<String> {
         Ok(self.working.clone())
      }
   }

   fn rules() -> RuleSet {
      let mut rules = RuleSet::with_scopes(&["core", "ui"]);
      rules.allowed_types = ["feat", "fix"].iter().map(|t| (*t).to_string()).collect();
      rules
   }

   fn ctx() -> GenerationContext {
      GenerationContext {
         status_summary: "M  src/lib.rs\n".to_string(),
         diff:           "+pub fn load() {}\n".to_string(),
         diff_kind:      DiffKind::Staged,
      }
   }

   fn settings() -> GenerationSettings {
      GenerationSettings {
         api_key:           "sk-test".to_string(),
         model:             "claude-sonnet-4-5".to_string(),
         max_output_tokens: 512,
         temperature:       0.2,
      }
   }

   #[test]
   fn test_first_attempt_success() {
      let generator = FakeGenerator::replying(&["```\nfeat(core): add config loader\n```"]);
      let result =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap();
      assert_eq!(result, GeneratedMessage {
         message:  "feat(core): add config loader".to_string(),
         attempts: 1,
         repaired: false,
      });

      let requests = generator.requests.borrow();
      assert_eq!(requests.len(), 1);
      assert_eq!(requests[0].api_key, "sk-test");
      assert_eq!(requests[0].model, "claude-sonnet-4-5");
      assert_eq!(requests[0].max_output_tokens, 512);
      assert!(requests[0].user_prompt.contains("+pub fn load() {}"));
   }

   #[test]
   fn test_retry_feeds_back_first_reason() {
      let generator =
         FakeGenerator::replying(&["feat(api): add endpoint", "feat(core): add endpoint"]);
      let result =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap();
      assert_eq!(result.message, "feat(core): add endpoint");
      assert_eq!(result.attempts, 2);

      let first_reason = validate_commit_message("feat(api): add endpoint", &rules())
         .unwrap_err()
         .to_string();
      let requests = generator.requests.borrow();
      assert_eq!(requests.len(), 2);
      assert!(requests[1].system_prompt.contains(&first_reason));
      assert!(requests[1].system_prompt.starts_with(&requests[0].system_prompt));
      assert!(requests[1].user_prompt.contains("feat(api): add endpoint"));
   }

   #[test]
   fn test_second_failure_reports_final_reason() {
      let generator = FakeGenerator::replying(&["chore: tidy", "feat(api): add endpoint"]);
      let err =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap_err();
      match err {
         CommitGenError::ValidationFailed { reason } => assert!(reason.contains("api")),
         other => panic!("unexpected error: {other}"),
      }
      assert_eq!(generator.requests.borrow().len(), 2);
   }

   #[test]
   fn test_long_subject_repaired_without_retry() {
      let raw = format!("feat(core): {}", "tighten the loader ".repeat(20));
      let generator = FakeGenerator::replying(&[raw.as_str()]);
      let result =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap();
      assert_eq!(result.attempts, 1);
      assert!(result.repaired);
      assert_eq!(validate_commit_message(&result.message, &rules()), Ok(()));
      assert_eq!(generator.requests.borrow().len(), 1);
   }

   #[test]
   fn test_rejected_key_on_either_attempt() {
      let unauthorized = || CommitGenError::ApiError { status: 401, body: "{}".to_string() };

      let generator = FakeGenerator::new(vec![Err(unauthorized())]);
      let err =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap_err();
      assert!(matches!(err, CommitGenError::KeyRejected { provider: Provider::Anthropic }));

      let generator =
         FakeGenerator::new(vec![Ok("not a header".to_string()), Err(unauthorized())]);
      let err =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap_err();
      assert!(matches!(err, CommitGenError::KeyRejected { .. }));
   }

   #[test]
   fn test_other_api_errors_pass_through() {
      let generator =
         FakeGenerator::new(vec![Err(CommitGenError::ApiError { status: 500, body: "x".into() })]);
      let err =
         generate_commit_message(&generator, &rules(), &ctx(), &settings(), None).unwrap_err();
      assert!(matches!(err, CommitGenError::ApiError { status: 500, .. }));
   }

   #[test]
   fn test_user_context_reaches_prompt() {
      let generator = FakeGenerator::replying(&["fix(ui): align button"]);
      generate_commit_message(&generator, &rules(), &ctx(), &settings(), Some("closes #12"))
         .unwrap();
      assert!(generator.requests.borrow()[0].user_prompt.contains("closes #12"));
   }

   #[test]
   fn test_gather_prefers_staged() {
      let repo = FakeRepo {
         repository: true,
         staged:     "+staged\n".to_string(),
         working:    "+working\n".to_string(),
      };
      let ctx = gather_context(&repo, 1000).unwrap();
      assert_eq!(ctx.diff_kind, DiffKind::Staged);
      assert_eq!(ctx.diff, "+staged\n");
      assert_eq!(ctx.status_summary, "M  src/lib.rs\n");
   }

   #[test]
   fn test_gather_falls_back_to_working() {
      let repo = FakeRepo {
         repository: true,
         staged:     "  \n".to_string(),
         working:    "+working\n".to_string(),
      };
      let ctx = gather_context(&repo, 1000).unwrap();
      assert_eq!(ctx.diff_kind, DiffKind::Working);
      assert_eq!(ctx.diff, "+working\n");
   }

   #[test]
   fn test_gather_nothing_to_commit() {
      let repo = FakeRepo { repository: true, staged: String::new(), working: String::new() };
      assert!(matches!(gather_context(&repo, 1000), Err(CommitGenError::NothingToCommit)));
   }

   #[test]
   fn test_gather_not_a_repository() {
      let repo = FakeRepo { repository: false, staged: String::new(), working: String::new() };
      match gather_context(&repo, 1000) {
         Err(CommitGenError::NotARepository { path }) => {
            assert_eq!(PathBuf::from(path), PathBuf::from("/work/project"));
         },
         other => panic!("unexpected result: {other:?}"),
      }
   }

   #[test]
   fn test_truncate_diff_within_budget() {
      assert_eq!(truncate_diff("a\nb\n", 4), "a\nb\n");
   }

   fn dropped_count(truncated: &str) -> usize {
      let tail = truncated.rsplit("truncated: ").next().unwrap();
      tail.split(' ').next().unwrap().parse().unwrap()
   }

   #[test]
   fn test_truncate_diff_at_line_boundary() {
      let diff: String = (0..20).map(|i| format!("line {i:02} of the diff\n")).collect();
      let truncated = truncate_diff(&diff, 150);
      assert!(truncated.chars().count() <= 150, "{truncated}");

      let (kept, marker) = truncated.split_at(truncated.find("[... diff truncated").unwrap());
      assert!(kept.starts_with("line 00 of the diff\n"));
      assert!(kept.ends_with('\n'));
      assert!(diff.starts_with(kept));
      assert!(marker.ends_with("characters omitted ...]\n"));
      assert_eq!(dropped_count(&truncated), diff.chars().count() - kept.chars().count());
   }

   #[test]
   fn test_truncate_diff_single_long_line() {
      let diff = "x".repeat(200);
      let truncated = truncate_diff(&diff, 100);
      assert!(truncated.chars().count() <= 100, "{truncated}");
      let kept = truncated.chars().take_while(|c| *c == 'x').count();
      assert!(kept > 0);
      assert_eq!(truncated.chars().nth(kept), Some('\n'));
      assert_eq!(dropped_count(&truncated), 200 - kept);
   }

   #[test]
   fn test_truncate_diff_multibyte() {
      let diff = "é".repeat(200);
      let truncated = truncate_diff(&diff, 90);
      assert!(truncated.chars().count() <= 90, "{truncated}");
      let kept = truncated.chars().take_while(|c| *c == 'é').count();
      assert!(kept > 0);
      assert_eq!(dropped_count(&truncated), 200 - kept);
   }

   #[test]
   fn test_truncate_diff_budget_smaller_than_marker() {
      let diff = "x".repeat(50);
      assert_eq!(truncate_diff(&diff, 10), "[... diff truncated: 50 characters omitted ...]\n");
   }
}
