//! Normalization of raw model output into a candidate commit message
use unicode_normalization::UnicodeNormalization;

use crate::validation::normalize_line_endings;

const FENCE: &str = "```";

/// Turn raw generated text into a candidate commit message.
///
/// Normalizes line endings, removes one code-fence wrapper if the model added
/// one anyway, maps typographic punctuation to ASCII and trims.
pub fn normalize_response(raw: &str) -> String {
   let text = normalize_line_endings(raw);
   let text = strip_code_fence(text.trim());
   normalize_unicode(text).trim().to_string()
}

/// Remove a single surrounding ```` ```lang ... ``` ```` wrapper
fn strip_code_fence(text: &str) -> &str {
   if !text.starts_with(FENCE) || text.len() < 2 * FENCE.len() || !text.ends_with(FENCE) {
      return text;
   }
   // Drop the opening fence line (with any info string) and the closing fence
   let Some((_, inner)) = text.split_once('\n') else {
      return text;
   };
   inner.strip_suffix(FENCE).unwrap_or(inner).trim()
}

/// Normalize Unicode to NFC and replace typographic characters models like
/// to emit with their ASCII counterparts
pub fn normalize_unicode(text: &str) -> String {
   let composed: String = text.nfc().collect();

   composed
      // Smart quotes to straight quotes
      .replace(['\u{2018}', '\u{2019}', '\u{201A}', '\u{2039}', '\u{203A}'], "'")
      .replace(['\u{201C}', '\u{201D}', '\u{201E}', '\u{00AB}', '\u{00BB}'], "\"")
      // Dashes and hyphens
      .replace(['\u{2010}', '\u{2011}', '\u{2012}', '\u{2212}'], "-")
      .replace(['\u{2013}', '\u{2014}', '\u{2015}'], "--")
      // Arrows
      .replace('\u{2192}', "->")
      .replace('\u{2190}', "<-")
      .replace('\u{21D2}', "=>")
      // Ellipsis
      .replace('\u{2026}', "...")
      // Bullet points (convert to hyphens for consistency)
      .replace(['\u{2022}', '\u{25E6}', '\u{25AA}'], "-")
      // Special spaces to regular space
      .replace(
         [
            '\u{00A0}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}',
            '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{202F}', '\u{205F}',
            '\u{3000}',
         ],
         " ",
      )
      // Zero-width characters (remove)
      .replace(['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'], "")
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_plain_text_trimmed() {
      assert_eq!(normalize_response("  \nfeat: add x\n\n"), "feat: add x");
   }

   #[test]
   fn test_strips_fence_with_language() {
      let raw = "```text\nfeat(core): add loader\n\nBody line.\n```";
      assert_eq!(normalize_response(raw), "feat(core): add loader\n\nBody line.");
   }

   #[test]
   fn test_strips_bare_fence_and_crlf() {
      let raw = "\r\n```\r\nfix: handle eof\r\n```\r\n";
      assert_eq!(normalize_response(raw), "fix: handle eof");
   }

   #[test]
   fn test_unclosed_fence_left_alone() {
      let raw = "```\nfix: handle eof";
      assert_eq!(normalize_response(raw), raw);
   }

   #[test]
   fn test_inner_fences_untouched() {
      let raw = "feat: add parser\n\nExample:\n```\nparse(x)\n```";
      assert_eq!(normalize_response(raw), raw);
   }

   #[test]
   fn test_unicode_punctuation() {
      assert_eq!(
         normalize_unicode("fix: don\u{2019}t drop \u{201C}x\u{201D} \u{2014} ok\u{2026}"),
         "fix: don't drop \"x\" -- ok..."
      );
      assert_eq!(normalize_unicode("a\u{00A0}b\u{200B}c"), "a bc");
   }

   #[test]
   fn test_nfc_composition() {
      // e + combining acute composes to a single scalar
      assert_eq!(normalize_unicode("cafe\u{0301}"), "caf\u{00E9}");
   }
}
