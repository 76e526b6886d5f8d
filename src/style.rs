//! Terminal styling for CLI output.
//!
//! Status output goes to stderr so stdout only ever carries the commit
//! message. Respects `NO_COLOR` and terminal capabilities.

use std::{
   io::{self, IsTerminal, Write},
   sync::{OnceLock, mpsc},
   thread,
   time::Duration,
};

use owo_colors::OwoColorize;

static COLOR_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if colors should be used (cached on first call).
pub fn colors_enabled() -> bool {
   *COLOR_ENABLED.get_or_init(|| {
      // NO_COLOR takes precedence (https://no-color.org/)
      if std::env::var("NO_COLOR").is_ok() {
         return false;
      }
      supports_color::on(supports_color::Stream::Stderr).is_some_and(|level| level.has_basic)
   })
}

// === Color Palette ===

/// Success: checkmarks, completed actions (green + bold).
pub fn success(s: &str) -> String {
   if colors_enabled() {
      s.green().bold().to_string()
   } else {
      s.to_string()
   }
}

/// Warning: retries, clamped values, fallbacks (yellow).
pub fn warning(s: &str) -> String {
   if colors_enabled() {
      s.yellow().to_string()
   } else {
      s.to_string()
   }
}

/// Error: failures (red + bold).
pub fn error(s: &str) -> String {
   if colors_enabled() {
      s.red().bold().to_string()
   } else {
      s.to_string()
   }
}

/// Dim: paths, secondary details.
pub fn dim(s: &str) -> String {
   if colors_enabled() {
      s.dimmed().to_string()
   } else {
      s.to_string()
   }
}

/// Bold: headers, key values.
pub fn bold(s: &str) -> String {
   if colors_enabled() {
      s.bold().to_string()
   } else {
      s.to_string()
   }
}

/// Model name styling (magenta).
pub fn model(s: &str) -> String {
   if colors_enabled() {
      s.magenta().to_string()
   } else {
      s.to_string()
   }
}

/// Get terminal width, capped at 100 columns.
pub fn term_width() -> usize {
   terminal_size::terminal_size_of(io::stderr())
      .map_or(80, |(w, _)| w.0 as usize)
      .min(100)
}

/// Clear an in-progress spinner line on stderr
fn clear_line() {
   if io::stderr().is_terminal() {
      eprint!("\r\x1b[K");
      io::stderr().flush().ok();
   }
}

/// Print a non-fatal warning on its own line.
pub fn warn(msg: &str) {
   clear_line();
   eprintln!("{} {}", warning(icons::WARNING), warning(msg));
}

/// Print a progress note on its own line.
pub fn print_info(msg: &str) {
   clear_line();
   if colors_enabled() {
      eprintln!("{} {msg}", icons::INFO.cyan());
   } else {
      eprintln!("{} {msg}", icons::INFO);
   }
}

/// Print a failure the user can act on.
pub fn print_error(msg: &str) {
   clear_line();
   eprintln!("{} {}", error(icons::ERROR), error(msg));
}

// === Unicode Box Drawing ===

pub mod box_chars {
   pub const TOP_LEFT: char = '\u{256D}';
   pub const TOP_RIGHT: char = '\u{256E}';
   pub const BOTTOM_LEFT: char = '\u{2570}';
   pub const BOTTOM_RIGHT: char = '\u{256F}';
   pub const HORIZONTAL: char = '\u{2500}';
   pub const VERTICAL: char = '\u{2502}';
}

/// Wrap text to fit within a given width, preserving words.
fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
   if line.trim().is_empty() {
      return vec![String::new()];
   }

   let mut lines = Vec::new();
   let mut current = String::new();

   for word in line.split_whitespace() {
      let word_len = word.chars().count();
      let current_len = current.chars().count();

      if current.is_empty() {
         // First word on a line is taken even if too long
         current = word.to_string();
      } else if current_len + 1 + word_len <= max_width {
         current.push(' ');
         current.push_str(word);
      } else {
         lines.push(current);
         current = word.to_string();
      }
   }

   if !current.is_empty() {
      lines.push(current);
   }

   lines
}

/// Render a box-framed message with word wrapping.
pub fn boxed_message(title: &str, content: &str, width: usize) -> String {
   use box_chars::{BOTTOM_LEFT, BOTTOM_RIGHT, HORIZONTAL, TOP_LEFT, TOP_RIGHT, VERTICAL};

   let mut out = String::new();
   let inner_width = width.saturating_sub(4); // "│ " and " │"

   let title_len = title.chars().count();
   let border_width = width.saturating_sub(2);
   let padding = border_width.saturating_sub(title_len + 2);
   let left_pad = padding / 2;
   let right_pad = padding - left_pad;

   out.push(TOP_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(left_pad));
   out.push(' ');
   out.push_str(&bold(title));
   out.push(' ');
   out.push_str(&HORIZONTAL.to_string().repeat(right_pad));
   out.push(TOP_RIGHT);
   out.push('\n');

   for line in content.lines() {
      for wrapped_line in wrap_line(line, inner_width) {
         let pad = inner_width.saturating_sub(wrapped_line.chars().count());
         out.push(VERTICAL);
         out.push(' ');
         out.push_str(&wrapped_line);
         out.push_str(&" ".repeat(pad));
         out.push(' ');
         out.push(VERTICAL);
         out.push('\n');
      }
   }

   out.push(BOTTOM_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(border_width));
   out.push(BOTTOM_RIGHT);

   out
}

/// Horizontal separator line.
pub fn separator(width: usize) -> String {
   dim(&box_chars::HORIZONTAL.to_string().repeat(width))
}

// === Status Icons ===

pub mod icons {
   pub const SUCCESS: &str = "\u{2713}";
   pub const WARNING: &str = "\u{26A0}";
   pub const ERROR: &str = "\u{2717}";
   pub const INFO: &str = "\u{2139}";
   pub const CLIPBOARD: &str = "\u{1F4CB}";
}

// === Spinner ===

const SPINNER_FRAMES: &[char] = &[
   '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
   '\u{2807}', '\u{280F}',
];

/// Run a function with a spinner on stderr, ending in a success or failure
/// mark. Falls back to a static line when stderr is not a color terminal.
pub fn with_spinner_result<F, T, E>(message: &str, f: F) -> Result<T, E>
where
   F: FnOnce() -> Result<T, E>,
{
   if !colors_enabled() || !io::stderr().is_terminal() {
      eprintln!("{message}");
      return f();
   }

   let (tx, rx) = mpsc::channel::<bool>();
   let msg = message.to_string();

   let spinner = thread::spawn(move || {
      let mut idx = 0;
      loop {
         match rx.try_recv() {
            Ok(success) => {
               let icon = if success {
                  icons::SUCCESS.green().to_string()
               } else {
                  icons::ERROR.red().to_string()
               };
               eprint!("\r\x1b[K{icon} {msg}\n");
               io::stderr().flush().ok();
               break;
            },
            Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {},
         }
         eprint!("\r{} {}", SPINNER_FRAMES[idx].cyan(), msg);
         io::stderr().flush().ok();
         idx = (idx + 1) % SPINNER_FRAMES.len();
         thread::sleep(Duration::from_millis(80));
      }
   });

   let result = f();
   tx.send(result.is_ok()).ok();
   spinner.join().ok();
   result
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_wrap_line() {
      assert_eq!(wrap_line("", 10), vec![String::new()]);
      assert_eq!(wrap_line("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
      assert_eq!(wrap_line("averyveryverylongword x", 5), vec!["averyveryverylongword", "x"]);
   }

   #[test]
   fn test_boxed_message_shape() {
      let rendered = boxed_message("Commit", "feat(core): add loader\n\nBody text", 40);
      let lines: Vec<&str> = rendered.lines().collect();
      assert_eq!(lines.len(), 5);
      assert!(lines[0].starts_with(box_chars::TOP_LEFT));
      assert!(lines[0].contains("Commit"));
      assert!(lines[1].contains("feat(core): add loader"));
      assert!(lines[4].starts_with(box_chars::BOTTOM_LEFT));
      for line in &lines[1..4] {
         assert_eq!(line.chars().count(), 40);
      }
   }
}
