//! Error taxonomy of the rendering pipeline.
//!
//! Only [`RenderFatalError`] ever replaces a whole document. Every other error
//! is isolated to the item it concerns and rendered inline: a missing link is
//! marked, a failed diagram shows its source, a failed directory listing shows
//! a message. Macro expansion is total and has no error type at all.
use std::{io, path::PathBuf};

use serde::{Deserialize, Serialize};

/// I/O failure while reading, probing or resolving a path.
///
/// Existence checks convert this into "does not exist"; it only surfaces to
/// callers from [`crate::WikiProcessor::render_file`].
#[derive(Debug, thiserror::Error)]
#[error("failed to access {}: {source}", path.display())]
pub struct ResolutionError {
  pub path:   PathBuf,
  #[source]
  pub source: io::Error,
}

impl ResolutionError {
  #[must_use]
  pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self {
      path: path.into(),
      source,
    }
  }
}

/// Failure of the external diagram renderer for one diagram.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DiagramError {
  #[error("HTTP error: {0}")]
  Http(String),
  #[error("I/O error: {0}")]
  Io(String),
  #[error("renderer rejected diagram: {0}")]
  Rejected(String),
  #[error("renderer task failed: {0}")]
  Task(String),
}

/// Sibling listing failure. Degrades to an explanatory placeholder.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryListError {
  #[error("document has no parent directory")]
  NoParent,
  #[error("failed to list {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The markdown compiler itself failed.
#[derive(
  Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize, Deserialize,
)]
#[error("{message}")]
pub struct RenderFatalError {
  /// Human readable failure message.
  pub message: String,
  /// Diagnostic detail shown underneath the message.
  pub detail:  String,
}

impl RenderFatalError {
  #[must_use]
  pub fn new(message: impl Into<String>, detail: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      detail:  detail.into(),
    }
  }

  /// The document-level error panel shown instead of the rendered content.
  #[must_use]
  pub fn to_panel_html(&self) -> String {
    format!(
      "<div class=\"error-message\">\n<h3>Error rendering markdown</h3>\n<p>{}</p>\n<pre>{}</pre>\n</div>",
      html_escape::encode_text(&self.message),
      html_escape::encode_text(&self.detail),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fatal_panel_escapes_message() {
    let err = RenderFatalError::new("bad <input>", "at line 1");
    let panel = err.to_panel_html();
    assert!(panel.contains("<h3>Error rendering markdown</h3>"));
    assert!(panel.contains("bad &lt;input&gt;"));
    assert!(panel.contains("<pre>at line 1</pre>"));
  }

  #[test]
  fn test_resolution_error_display() {
    let err = ResolutionError::new(
      "/wiki/missing.md",
      io::Error::new(io::ErrorKind::NotFound, "gone"),
    );
    assert_eq!(err.to_string(), "failed to access /wiki/missing.md: gone");
  }
}
