//! Table of contents rendering.
use std::fmt::Write;

use crate::{
  processor::overrides::{LinkAttrs, RenderOverrides},
  types::TocEntry,
};

/// Render headings as a nested list.
///
/// Nesting starts at the shallowest heading level present. Descending opens
/// one list per level, so `h1` followed by `h3` yields two nested lists
/// rather than one; every open list is closed after the last entry.
/// An empty heading sequence renders nothing.
#[must_use]
pub fn render_toc(entries: &[TocEntry], overrides: &dyn RenderOverrides) -> String {
  let Some(base) = entries.iter().map(|e| e.level).min() else {
    return String::new();
  };

  let mut html = String::from("<nav class=\"table-of-contents\">\n<ul>\n");
  // Current nesting depth relative to `base`; depth 0 is the outer list.
  let mut depth: u8 = 0;
  let mut item_open = false;

  for entry in entries {
    let target = entry.level.saturating_sub(base);

    if target > depth {
      // Nested lists live inside the previous item; make one if the first
      // heading is already deeper than the base.
      if !item_open {
        html.push_str("<li>");
      }
      while depth < target {
        html.push_str("\n<ul>\n");
        depth += 1;
        if depth < target {
          html.push_str("<li>");
        }
      }
    } else {
      if item_open {
        html.push_str("</li>\n");
      }
      while depth > target {
        html.push_str("</ul>\n</li>\n");
        depth -= 1;
      }
    }

    let link = overrides.render_link(&LinkAttrs::new(
      format!("#{}", entry.anchor_id),
      None,
    ));
    let _ = write!(
      html,
      "<li>{link}{}</a>",
      html_escape::encode_text(&entry.text)
    );
    item_open = true;
  }

  if item_open {
    html.push_str("</li>\n");
  }
  while depth > 0 {
    html.push_str("</ul>\n</li>\n");
    depth -= 1;
  }
  html.push_str("</ul>\n</nav>");
  html
}
