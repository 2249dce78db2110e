pub mod codeblock;

use std::path::{Path, PathBuf};

use log::trace;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

/// Slugify heading text for use as an anchor ID.
///
/// Lowercases, drops everything that is not a word character, whitespace or
/// `-`, then turns each whitespace run into a single `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
  let kept: String = text
    .trim()
    .to_lowercase()
    .chars()
    .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
    .collect();
  kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Whether `path` carries one of `extensions` (case-insensitive, no dot).
#[must_use]
pub fn has_markdown_extension(path: &Path, extensions: &[String]) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
  entry.depth() > 0
    && entry.file_type().is_dir()
    && entry
      .file_name()
      .to_str()
      .is_some_and(|name| name.starts_with('.') || name == "node_modules")
}

/// Collect all markdown files below `input_dir`, skipping hidden directories
/// and `node_modules`. Sorted by path.
#[must_use]
pub fn collect_markdown_files(
  input_dir: &Path,
  extensions: &[String],
) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
    .follow_links(true)
    .into_iter()
    .filter_entry(|e| !is_skipped_dir(e))
    .filter_map(Result::ok)
    .filter(|e| e.file_type().is_file())
    .map(DirEntry::into_path)
    .filter(|p| has_markdown_extension(p, extensions))
    .collect();
  files.sort();

  trace!("Found {} markdown files in {}", files.len(), input_dir.display());
  files
}

/// Compile a static pattern, falling back to a regex that never matches.
pub(crate) fn compile_or_never(name: &str, pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile {name} regex: {e}\n Falling back to never matching \
       regex."
    );
    never_matching_regex()
  })
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
#[must_use]
pub fn never_matching_regex() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_slugify() {
    assert_eq!(slugify("Getting Started"), "getting-started");
    assert_eq!(slugify("What's new?  (v2)"), "whats-new-v2");
    assert_eq!(slugify("snake_case-ok"), "snake_case-ok");
    assert_eq!(slugify("!!!"), "");
  }

  #[test]
  fn test_never_matching_regex() {
    let re = never_matching_regex();
    assert!(!re.is_match(""));
    assert!(!re.is_match("anything"));
  }

  #[test]
  fn test_collect_markdown_files_skips_hidden_and_node_modules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("guide")).expect("mkdir");
    fs::create_dir_all(root.join(".attachments")).expect("mkdir");
    fs::create_dir_all(root.join("node_modules/pkg")).expect("mkdir");
    fs::write(root.join("index.md"), "# Home").expect("write");
    fs::write(root.join("guide/Setup.MARKDOWN"), "# Setup").expect("write");
    fs::write(root.join("guide/notes.txt"), "nope").expect("write");
    fs::write(root.join(".attachments/hidden.md"), "x").expect("write");
    fs::write(root.join("node_modules/pkg/README.md"), "x").expect("write");

    let exts = vec!["md".to_string(), "markdown".to_string()];
    let files = collect_markdown_files(root, &exts);
    assert_eq!(files, vec![
      root.join("guide/Setup.MARKDOWN"),
      root.join("index.md"),
    ]);
  }
}
