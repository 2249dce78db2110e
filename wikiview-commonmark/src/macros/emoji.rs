//! Emoji shortcode fallback table.
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::utils::compile_or_never;

/// Shortcodes substituted regardless of what the compiler supports.
pub const EMOJI: &[(&str, &str)] = &[
  ("smile", "😄"),
  ("tada", "🎉"),
  ("rocket", "🚀"),
  ("warning", "⚠️"),
  ("white_check_mark", "✅"),
  ("x", "❌"),
  ("bulb", "💡"),
  ("fire", "🔥"),
  ("star", "⭐"),
  ("heart", "❤️"),
  ("thumbsup", "👍"),
  ("thumbsdown", "👎"),
  ("eyes", "👀"),
  ("memo", "📝"),
  ("books", "📚"),
  ("hammer", "🔨"),
  ("computer", "💻"),
  ("thinking", "🤔"),
  ("question", "❓"),
  ("exclamation", "❗"),
];

static SHORTCODE_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("SHORTCODE_RE", r":([a-z_]+):"));

/// Look up a shortcode name without the colons.
#[must_use]
pub fn lookup(code: &str) -> Option<&'static str> {
  EMOJI
    .iter()
    .find_map(|(name, emoji)| (*name == code).then_some(*emoji))
}

/// Replace every known `:shortcode:` in `text`. Unknown codes stay literal.
#[must_use]
pub fn replace_shortcodes(text: &str) -> String {
  SHORTCODE_RE
    .replace_all(text, |caps: &Captures| {
      lookup(&caps[1]).map_or_else(|| caps[0].to_string(), str::to_string)
    })
    .into_owned()
}
