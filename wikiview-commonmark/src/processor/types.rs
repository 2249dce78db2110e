//! Type definitions for the wiki processor.
//!
//! # Examples
//!
//! ```
//! use wikiview_commonmark::{WikiOptions, WikiProcessor};
//!
//! let options = WikiOptions {
//!   highlight_code: false,
//!   ..Default::default()
//! };
//!
//! let processor = WikiProcessor::new(options);
//! ```

use std::sync::Arc;

use crate::{
  enrich::diagrams::DiagramRenderer,
  macros::Preprocessor,
  processor::overrides::RenderOverrides,
  resolve::PathResolver,
  syntax::SyntaxManager,
  types::{Link, TocEntry},
};

/// Immutable pipeline configuration, passed to every render.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct WikiOptions {
  /// Tables, strikethrough, task lists, autolinks and footnotes.
  pub gfm: bool,

  /// Typographic quotes and dashes.
  pub smart_punctuation: bool,

  /// TeX math between `$` (inline) and `$$` (display) delimiters, emitted as
  /// `data-math-style` spans for the host's math renderer.
  pub math: bool,

  /// Slug-based heading ids. When `false`, every heading without an id gets
  /// the positional `heading-<index>` id.
  pub heading_ids: bool,

  /// Enable syntax highlighting for code blocks.
  pub highlight_code: bool,

  /// Optional: Custom syntax highlighting theme name.
  pub highlight_theme: Option<String>,

  /// Extensions recognized as wiki documents, without the dot.
  pub markdown_extensions: Vec<String>,

  /// Extension appended to wiki-link targets and extensionless references.
  pub canonical_extension: String,

  /// File stems never listed as sub-pages (compared case-insensitively).
  pub index_names: Vec<String>,
}

impl Default for WikiOptions {
  fn default() -> Self {
    Self {
      gfm:                 true,
      smart_punctuation:   true,
      math:                true,
      heading_ids:         true,
      highlight_code:      cfg!(feature = "syntect"),
      highlight_theme:     None,
      markdown_extensions: vec!["md".to_string(), "markdown".to_string()],
      canonical_extension: "md".to_string(),
      index_names:         vec!["index".to_string(), "readme".to_string()],
    }
  }
}

/// Builder for constructing `WikiOptions` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct WikiOptionsBuilder {
  options: WikiOptions,
}

impl WikiOptionsBuilder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  #[must_use]
  pub const fn smart_punctuation(mut self, enabled: bool) -> Self {
    self.options.smart_punctuation = enabled;
    self
  }

  #[must_use]
  pub const fn math(mut self, enabled: bool) -> Self {
    self.options.math = enabled;
    self
  }

  #[must_use]
  pub const fn heading_ids(mut self, enabled: bool) -> Self {
    self.options.heading_ids = enabled;
    self
  }

  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set the syntax highlighting theme.
  #[must_use]
  pub fn highlight_theme<S: Into<String>>(mut self, theme: Option<S>) -> Self {
    self.options.highlight_theme = theme.map(Into::into);
    self
  }

  #[must_use]
  pub fn markdown_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.options.markdown_extensions =
      extensions.into_iter().map(Into::into).collect();
    self
  }

  #[must_use]
  pub fn canonical_extension<S: Into<String>>(mut self, extension: S) -> Self {
    self.options.canonical_extension = extension.into();
    self
  }

  #[must_use]
  pub fn index_names<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.options.index_names = names.into_iter().map(Into::into).collect();
    self
  }

  #[must_use]
  pub fn build(self) -> WikiOptions {
    self.options
  }
}

/// The rendering pipeline.
///
/// Cheaply cloneable: collaborators are shared behind `Arc`s.
#[derive(Clone)]
pub struct WikiProcessor {
  pub(crate) options:        WikiOptions,
  pub(crate) preprocessor:   Preprocessor,
  pub(crate) resolver:       PathResolver,
  pub(crate) overrides:      Arc<dyn RenderOverrides>,
  pub(crate) diagrams:       Option<Arc<dyn DiagramRenderer>>,
  pub(crate) syntax_manager: Option<Arc<SyntaxManager>>,
}

impl std::fmt::Debug for WikiProcessor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WikiProcessor")
      .field("options", &self.options)
      .field("resolver", &self.resolver)
      .field("diagrams", &self.diagrams.is_some())
      .field("syntax_manager", &self.syntax_manager)
      .finish_non_exhaustive()
  }
}

/// A diagram container found in the structural render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDiagram {
  pub id:     String,
  pub source: String,
}

/// Output of the synchronous structural stage, before any filesystem or
/// diagram work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedRender {
  /// HTML with classified links, heading ids, highlighting and the TOC in
  /// place. TOSP placeholders and diagram containers are still present.
  pub html:       String,
  pub headers:    Vec<TocEntry>,
  pub title:      Option<String>,
  /// Classified anchors, statuses still unknown.
  pub links:      Vec<Link>,
  pub diagrams:   Vec<PendingDiagram>,
  /// Whether a TOSP placeholder is present.
  pub needs_tosp: bool,
}
