//! Path resolution against the wiki on disk.
//!
//! [`resolve_reference`] is pure path arithmetic. Everything touching the
//! filesystem goes through a [`FileSystem`] collaborator, and I/O failures
//! during existence checks are treated as "does not exist".
use std::{
  ffi::OsString,
  io,
  path::{Component, Path, PathBuf},
  sync::Arc,
};

use async_trait::async_trait;
use log::{debug, trace};

use crate::{
  error::{DirectoryListError, ResolutionError},
  links::decode_reference,
  types::Document,
  utils::has_markdown_extension,
};

/// Root documents of a wiki directory, in lookup order.
pub const ROOT_DOCUMENT_NAMES: [&str; 4] =
  ["index.md", "README.md", "index.markdown", "README.markdown"];

/// Filesystem access used by the pipeline.
#[async_trait]
pub trait FileSystem: Send + Sync {
  /// Read a file as UTF-8 text.
  async fn read_file(&self, path: &Path) -> io::Result<String>;

  /// Whether anything exists at `path`.
  async fn file_exists(&self, path: &Path) -> io::Result<bool>;

  /// Names of the entries of a directory, in no particular order.
  async fn list_directory(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// [`FileSystem`] over the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
  async fn read_file(&self, path: &Path) -> io::Result<String> {
    tokio::fs::read_to_string(path).await
  }

  async fn file_exists(&self, path: &Path) -> io::Result<bool> {
    tokio::fs::try_exists(path).await
  }

  async fn list_directory(&self, path: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
  }
}

/// Outcome of [`PathResolver::resolve_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
  pub path:   PathBuf,
  pub exists: bool,
}

/// Resolve `reference` relative to the directory containing `source_doc`.
///
/// The reference is percent-decoded first. `.` and `..` components are
/// folded lexically; no I/O happens here.
#[must_use]
pub fn resolve_reference(source_doc: &Path, reference: &str) -> PathBuf {
  let decoded = decode_reference(reference);
  let base = source_doc.parent().unwrap_or_else(|| Path::new(""));
  normalize(&base.join(decoded))
}

/// Lexically normalize a path, folding `.` and `..`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        match out.components().next_back() {
          Some(Component::Normal(_)) => {
            out.pop();
          },
          Some(Component::RootDir | Component::Prefix(_)) => {},
          _ => out.push(".."),
        }
      },
      other => out.push(other.as_os_str()),
    }
  }
  out
}

/// Append `.{extension}` to the file name, keeping any existing dots.
fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
  let mut name: OsString = path.as_os_str().to_owned();
  name.push(".");
  name.push(extension);
  PathBuf::from(name)
}

/// Resolves document references and checks the filesystem.
///
/// Cheap to clone; the filesystem is shared.
#[derive(Clone)]
pub struct PathResolver {
  fs:                  Arc<dyn FileSystem>,
  extensions:          Vec<String>,
  canonical_extension: String,
}

impl std::fmt::Debug for PathResolver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PathResolver")
      .field("extensions", &self.extensions)
      .field("canonical_extension", &self.canonical_extension)
      .finish_non_exhaustive()
  }
}

impl PathResolver {
  #[must_use]
  pub fn new(
    fs: Arc<dyn FileSystem>,
    extensions: Vec<String>,
    canonical_extension: impl Into<String>,
  ) -> Self {
    Self {
      fs,
      extensions,
      canonical_extension: canonical_extension.into(),
    }
  }

  /// A resolver over the local disk with `md`/`markdown` documents.
  #[must_use]
  pub fn local() -> Self {
    Self::new(
      Arc::new(LocalFileSystem),
      vec!["md".to_string(), "markdown".to_string()],
      "md",
    )
  }

  #[must_use]
  pub fn file_system(&self) -> &Arc<dyn FileSystem> {
    &self.fs
  }

  #[must_use]
  pub fn extensions(&self) -> &[String] {
    &self.extensions
  }

  /// See [`resolve_reference`].
  #[must_use]
  pub fn resolve(&self, source_doc: &Path, reference: &str) -> PathBuf {
    resolve_reference(source_doc, reference)
  }

  /// Filesystem existence check. I/O errors count as "does not exist".
  pub async fn exists(&self, path: &Path) -> bool {
    match self.fs.file_exists(path).await {
      Ok(exists) => exists,
      Err(e) => {
        debug!("{}", ResolutionError::new(path, e));
        false
      },
    }
  }

  /// Resolve, then retry with the canonical extension appended when the
  /// target is missing and has no document extension.
  ///
  /// Returns the first path that exists, else the plain resolved path marked
  /// as missing.
  pub async fn resolve_with_fallback(
    &self,
    source_doc: &Path,
    reference: &str,
  ) -> Resolved {
    let path = self.resolve(source_doc, reference);
    if self.exists(&path).await {
      return Resolved { path, exists: true };
    }

    if !has_markdown_extension(&path, &self.extensions) {
      let fallback = with_appended_extension(&path, &self.canonical_extension);
      if self.exists(&fallback).await {
        trace!(
          "Resolved '{reference}' through extension fallback to {}",
          fallback.display()
        );
        return Resolved {
          path:   fallback,
          exists: true,
        };
      }
    }

    Resolved {
      path,
      exists: false,
    }
  }

  /// Read a document from disk.
  ///
  /// # Errors
  ///
  /// Returns [`ResolutionError`] if the file cannot be read.
  pub async fn read_document(
    &self,
    path: &Path,
  ) -> Result<Document, ResolutionError> {
    Document::read(self.fs.as_ref(), path).await
  }

  /// Markdown files next to `document`, by name, unsorted.
  ///
  /// # Errors
  ///
  /// Returns [`DirectoryListError`] if the directory cannot be listed.
  pub async fn list_markdown_siblings(
    &self,
    document: &Path,
  ) -> Result<Vec<String>, DirectoryListError> {
    let dir = document.parent().ok_or(DirectoryListError::NoParent)?;
    let names = self.fs.list_directory(dir).await.map_err(|source| {
      DirectoryListError::Io {
        path: dir.to_path_buf(),
        source,
      }
    })?;
    Ok(
      names
        .into_iter()
        .filter(|name| has_markdown_extension(Path::new(name), &self.extensions))
        .collect(),
    )
  }

  /// The root document of a wiki directory, if any.
  pub async fn find_root_document(&self, dir: &Path) -> Option<PathBuf> {
    for name in ROOT_DOCUMENT_NAMES {
      let candidate = dir.join(name);
      if self.exists(&candidate).await {
        return Some(candidate);
      }
    }
    None
  }
}
