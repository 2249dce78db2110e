//! Types for wikiview-commonmark public API and internal use.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
  error::{RenderFatalError, ResolutionError},
  resolve::FileSystem,
};

/// A wiki page read from disk. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  /// Absolute path of the page.
  pub path:     PathBuf,
  /// Raw markdown source.
  pub raw_text: String,
}

impl Document {
  #[must_use]
  pub fn new(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
    Self {
      path:     path.into(),
      raw_text: raw_text.into(),
    }
  }

  /// Read a document through the given filesystem collaborator.
  ///
  /// # Errors
  ///
  /// Returns [`ResolutionError`] if the file cannot be read.
  pub async fn read(
    fs: &dyn FileSystem,
    path: &Path,
  ) -> Result<Self, ResolutionError> {
    let raw_text = fs
      .read_file(path)
      .await
      .map_err(|e| ResolutionError::new(path, e))?;
    Ok(Self::new(path, raw_text))
  }
}

/// One heading of a rendered document, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
  /// Heading level (1-6).
  pub level:     u8,
  /// Heading text content.
  pub text:      String,
  /// Anchor id, unique within the document.
  pub anchor_id: String,
}

/// How a hyperlink is navigated. Decided once from the literal href shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkClass {
  /// `http://` or `https://`, opened by the host.
  External,
  /// `#fragment` within the current document.
  Anchor,
  /// Another document of the wiki, resolved on the filesystem.
  Internal,
}

impl LinkClass {
  /// CSS class marking the classification in rendered HTML.
  #[must_use]
  pub const fn css_class(self) -> &'static str {
    match self {
      Self::External => "external-link",
      Self::Anchor => "anchor-link",
      Self::Internal => "internal-link",
    }
  }

  /// Inverse of [`LinkClass::css_class`] over a whitespace separated class
  /// attribute.
  #[must_use]
  pub fn from_class_attr(class: &str) -> Option<Self> {
    class.split_whitespace().find_map(|c| {
      match c {
        "external-link" => Some(Self::External),
        "anchor-link" => Some(Self::Anchor),
        "internal-link" => Some(Self::Internal),
        _ => None,
      }
    })
  }
}

/// Existence of an internal link target.
#[derive(
  Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
  /// Not checked. Always the case for external and anchor links.
  #[default]
  Unknown,
  Exists,
  Missing,
}

/// A hyperlink found in a rendered document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Link {
  /// Reference as written by the author.
  pub raw_href:        String,
  pub classification:  LinkClass,
  /// Only ever set for internal links.
  pub resolved_target: Option<PathBuf>,
  pub exists:          LinkStatus,
}

impl Link {
  #[must_use]
  pub fn new(raw_href: impl Into<String>, classification: LinkClass) -> Self {
    Self {
      raw_href: raw_href.into(),
      classification,
      resolved_target: None,
      exists: LinkStatus::Unknown,
    }
  }

  #[must_use]
  pub fn is_broken(&self) -> bool {
    self.exists == LinkStatus::Missing
  }
}

/// Result of rendering one diagram container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DiagramStatus {
  Rendered,
  Failed { message: String },
  /// No renderer configured. The container is left for a client-side
  /// renderer.
  Skipped,
}

/// A diagram container and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagramOutcome {
  pub id:     String,
  pub source: String,
  #[serde(flatten)]
  pub status: DiagramStatus,
}

/// Final result of the rendering pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderOutput {
  /// Rendered HTML fragment, ready for insertion into a content view.
  pub html: String,

  /// Headings in document order (for `ToC`, navigation, etc).
  pub headers: Vec<TocEntry>,

  /// Title of the document, if found (first H1).
  pub title: Option<String>,

  /// Classified anchors in document order, followed by the links of the
  /// table of subpages when one was generated.
  pub links: Vec<Link>,

  /// Diagram containers in document order.
  pub diagrams: Vec<DiagramOutcome>,

  /// All element ids present in `html`, used for scroll-to-anchor.
  pub element_ids: Vec<String>,

  /// Set when the compiler failed and `html` is the error panel.
  pub fatal: Option<RenderFatalError>,
}

impl RenderOutput {
  #[must_use]
  pub fn has_element_id(&self, id: &str) -> bool {
    self.element_ids.iter().any(|e| e == id)
  }

  /// Internal links whose targets do not exist.
  pub fn broken_links(&self) -> impl Iterator<Item = &Link> {
    self.links.iter().filter(|l| l.is_broken())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_link_class_roundtrips_through_css() {
    for class in [LinkClass::External, LinkClass::Anchor, LinkClass::Internal] {
      let attr = format!("foo {} broken-link", class.css_class());
      assert_eq!(LinkClass::from_class_attr(&attr), Some(class));
    }
    assert_eq!(LinkClass::from_class_attr("attachment-link"), None);
  }

  #[test]
  fn test_diagram_outcome_serializes_flat() {
    let outcome = DiagramOutcome {
      id:     "mermaid-0".into(),
      source: "graph TD".into(),
      status: DiagramStatus::Failed {
        message: "boom".into(),
      },
    };
    let json = serde_json::to_value(&outcome).expect("serialize outcome");
    assert_eq!(json["status"], "failed");
    assert_eq!(json["message"], "boom");
    assert_eq!(json["id"], "mermaid-0");
  }
}
