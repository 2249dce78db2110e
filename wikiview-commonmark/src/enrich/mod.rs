//! Enrichment of rendered HTML.
//!
//! - [`toc`]: table of contents from the document's headings
//! - [`tosp`]: table of subpages from the document's directory
//! - [`broken`]: existence checks for internal links
//! - [`diagrams`]: diagram rendering through an external renderer
//!
//! The filesystem and diagram work produces plain data; [`apply`] then writes
//! the results into the HTML in a single synchronous pass.
pub mod broken;
pub mod diagrams;
pub mod toc;
pub mod tosp;

pub use diagrams::{DiagramRenderer, RenderedDiagram};
pub use tosp::{SiblingEntry, Tosp};

use crate::{
  dom,
  macros::TOSP_PLACEHOLDER,
  types::{Link, LinkClass},
};

/// CSS class added to internal links whose target does not exist.
pub const BROKEN_LINK_CLASS: &str = "broken-link";

/// Results of the asynchronous passes, ready to be written into the HTML.
#[derive(Debug, Clone, Copy)]
pub struct Patch<'a> {
  /// Table of subpages markup, if the document asked for one.
  pub subpages: Option<&'a str>,
  pub links:    &'a [Link],
  pub diagrams: &'a [RenderedDiagram],
}

/// Write enrichment results into rendered HTML.
#[must_use]
pub fn apply(html: &str, patch: &Patch<'_>) -> String {
  let document = dom::parse_fragment(html);

  if let Some(subpages) = patch.subpages {
    for placeholder in dom::find_placeholders(&document, TOSP_PLACEHOLDER) {
      dom::replace_placeholder(&placeholder, subpages);
    }
  }

  let broken: Vec<&str> = patch
    .links
    .iter()
    .filter(|link| link.is_broken())
    .map(|link| link.raw_href.as_str())
    .collect();
  if !broken.is_empty() {
    for anchor in document.descendants() {
      if !dom::has_class(&anchor, LinkClass::Internal.css_class()) {
        continue;
      }
      let Some(href) = dom::attr(&anchor, "data-href") else {
        continue;
      };
      if broken.contains(&href.as_str()) {
        dom::add_class(&anchor, BROKEN_LINK_CLASS);
        dom::set_attr(&anchor, "title", format!("File not found: {href}"));
      }
    }
  }

  for diagram in patch.diagrams {
    let Some(markup) = &diagram.markup else {
      continue;
    };
    if let Some(container) = dom::find_by_id(&document, &diagram.outcome.id) {
      dom::replace_with_html(&container, markup);
    }
  }

  dom::serialize_body(&document)
}
