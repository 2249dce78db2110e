//! Code block highlighting behind a pluggable [`SyntaxHighlighter`].
//!
//! The only shipped backend is **Syntect**, with two-face added for extended
//! syntax definitions and themes.

pub mod error;
pub mod types;

pub use error::{SyntaxError, SyntaxResult};
pub use types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager};

#[cfg(feature = "syntect")] mod syntect;
#[cfg(feature = "syntect")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns [`SyntaxError::NoBackendAvailable`] when built without the
/// `syntect` feature.
pub fn create_default_manager() -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "syntect")]
  {
    Ok(create_syntect_manager())
  }

  #[cfg(not(feature = "syntect"))]
  {
    Err(SyntaxError::NoBackendAvailable)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_syntax_config_default() {
    let config = SyntaxConfig::default();
    assert!(config.fallback_to_plain);
    assert_eq!(config.language_aliases["js"], "javascript");
    assert_eq!(config.language_aliases["ps1"], "powershell");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_syntect_highlight_simple() {
    let highlighter = SyntectHighlighter::default();
    assert_eq!(highlighter.name(), "Syntect");
    let html = highlighter
      .highlight("fn main() {}", "rust", None)
      .expect("Failed to highlight code");
    assert!(html.contains("main"));
    assert!(html.contains("<span"));
    assert!(!html.contains("<pre"));
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_language_resolution() {
    let manager =
      create_default_manager().expect("Failed to create default syntax manager");
    assert_eq!(manager.resolve_language("JS"), "javascript");
    assert_eq!(manager.resolve_language("rust"), "rust");
  }

  #[cfg(feature = "syntect")]
  #[test]
  fn test_unknown_language_falls_back_to_plain() {
    let manager =
      create_default_manager().expect("Failed to create default syntax manager");
    let html = manager
      .highlight_code("a < b", "no-such-language", None)
      .expect("plain text fallback");
    assert!(html.contains("a &lt; b"));
  }

  #[cfg(not(feature = "syntect"))]
  #[test]
  fn test_no_backend() {
    assert!(matches!(
      create_default_manager(),
      Err(SyntaxError::NoBackendAvailable)
    ));
  }
}
