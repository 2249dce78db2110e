//! Table of subpages: the markdown documents next to the current one.
use std::{fmt::Write, path::Path};

use log::{debug, warn};

use crate::{
  error::DirectoryListError,
  links,
  processor::overrides::{LinkAttrs, RenderOverrides},
  resolve::PathResolver,
  types::{Link, LinkClass},
};

const EMPTY_STATE: &str = "<p><em>No subpages found in this directory</em></p>";
const ERROR_STATE: &str = "<p><em>Error generating table of subpages</em></p>";
const UNAVAILABLE_STATE: &str =
  "<p><em>Table of subpages not available</em></p>";

/// One sibling document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingEntry {
  /// File stem with hyphens shown as spaces.
  pub display_name:  String,
  /// Percent-encoded file name, relative to the current document.
  pub relative_href: String,
}

/// Materialized table of subpages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tosp {
  pub html:  String,
  /// Internal links to the listed siblings.
  pub links: Vec<Link>,
}

/// Build the sibling listing from directory entry names.
///
/// Drops the current document and any file whose stem is one of
/// `index_names`, both compared case-insensitively, and sorts by file name
/// case-insensitively.
#[must_use]
pub fn sibling_listing(
  names: Vec<String>,
  current_file: &str,
  index_names: &[String],
) -> Vec<SiblingEntry> {
  let mut names: Vec<String> = names
    .into_iter()
    .filter(|name| !name.eq_ignore_ascii_case(current_file))
    .filter(|name| {
      let stem = file_stem(name);
      !index_names.iter().any(|index| index.eq_ignore_ascii_case(stem))
    })
    .collect();
  names.sort_by_cached_key(|name| name.to_lowercase());

  names
    .into_iter()
    .map(|name| {
      SiblingEntry {
        display_name:  file_stem(&name).replace('-', " "),
        relative_href: links::encode_reference(&name),
      }
    })
    .collect()
}

fn file_stem(name: &str) -> &str {
  Path::new(name)
    .file_stem()
    .and_then(|stem| stem.to_str())
    .unwrap_or(name)
}

/// Render a sibling listing, or the empty state when there is nothing to
/// list.
#[must_use]
pub fn render_listing(
  entries: &[SiblingEntry],
  overrides: &dyn RenderOverrides,
) -> String {
  if entries.is_empty() {
    return EMPTY_STATE.to_string();
  }

  let mut html = String::from(
    "<nav class=\"table-of-subpages\">\n<h3>Pages in this \
     section:</h3>\n<ul>\n",
  );
  for entry in entries {
    let link =
      overrides.render_link(&LinkAttrs::new(entry.relative_href.clone(), None));
    let _ = writeln!(
      html,
      "<li>{link}{}</a></li>",
      html_escape::encode_text(&entry.display_name)
    );
  }
  html.push_str("</ul>\n</nav>");
  html
}

/// List the current document's siblings and render them.
///
/// Never fails: an unreadable directory renders an explanatory message.
pub async fn materialize(
  resolver: &PathResolver,
  current_path: &Path,
  index_names: &[String],
  overrides: &dyn RenderOverrides,
) -> Tosp {
  let names = match resolver.list_markdown_siblings(current_path).await {
    Ok(names) => names,
    Err(DirectoryListError::NoParent) => {
      debug!("No directory to list for {}", current_path.display());
      return Tosp {
        html:  UNAVAILABLE_STATE.to_string(),
        links: Vec::new(),
      };
    },
    Err(e) => {
      warn!("Failed to generate table of subpages: {e}");
      return Tosp {
        html:  ERROR_STATE.to_string(),
        links: Vec::new(),
      };
    },
  };

  let current_file = current_path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  let entries = sibling_listing(names, &current_file, index_names);
  let dir = current_path.parent().unwrap_or(current_path);

  Tosp {
    html:  render_listing(&entries, overrides),
    links: entries
      .iter()
      .map(|entry| {
        let mut link =
          Link::new(entry.relative_href.clone(), LinkClass::Internal);
        link.resolved_target =
          Some(dir.join(links::decode_reference(&entry.relative_href)));
        link
      })
      .collect(),
  }
}
