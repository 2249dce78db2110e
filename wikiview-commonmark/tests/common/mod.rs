#![allow(dead_code, reason = "shared between test binaries")]
use std::{
  collections::BTreeMap,
  io,
  path::{Path, PathBuf},
  sync::{
    Arc,
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use async_trait::async_trait;
use wikiview_commonmark::{
  DiagramError,
  DiagramRenderer,
  FileSystem,
  Host,
  WikiOptions,
  WikiProcessor,
};

/// In-memory wiki that counts every lookup it serves.
#[derive(Default)]
pub struct MemoryFs {
  files:        BTreeMap<PathBuf, String>,
  broken_dirs:  Vec<PathBuf>,
  pub lookups:  Mutex<Vec<PathBuf>>,
  pub listings: AtomicUsize,
}

impl MemoryFs {
  pub fn new(files: &[(&str, &str)]) -> Self {
    Self {
      files: files
        .iter()
        .map(|(path, text)| (PathBuf::from(path), (*text).to_string()))
        .collect(),
      ..Self::default()
    }
  }

  /// Make listing `dir` fail with an I/O error.
  pub fn with_broken_dir(mut self, dir: &str) -> Self {
    self.broken_dirs.push(PathBuf::from(dir));
    self
  }

  pub fn looked_up(&self) -> Vec<PathBuf> {
    self.lookups.lock().expect("lookups lock").clone()
  }
}

#[async_trait]
impl FileSystem for MemoryFs {
  async fn read_file(&self, path: &Path) -> io::Result<String> {
    self
      .files
      .get(path)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
  }

  async fn file_exists(&self, path: &Path) -> io::Result<bool> {
    self
      .lookups
      .lock()
      .expect("lookups lock")
      .push(path.to_path_buf());
    Ok(self.files.contains_key(path))
  }

  async fn list_directory(&self, path: &Path) -> io::Result<Vec<String>> {
    self.listings.fetch_add(1, Ordering::SeqCst);
    if self.broken_dirs.iter().any(|dir| dir == path) {
      return Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "permission denied",
      ));
    }
    Ok(
      self
        .files
        .keys()
        .filter(|file| file.parent() == Some(path))
        .filter_map(|file| file.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect(),
    )
  }
}

/// Renders diagrams as a tagged SVG, failing on sources containing `fail`.
pub struct FakeDiagrams;

#[async_trait]
impl DiagramRenderer for FakeDiagrams {
  async fn render_diagram(
    &self,
    source: &str,
    id: &str,
  ) -> Result<String, DiagramError> {
    if source.contains("fail") {
      Err(DiagramError::Rejected("syntax error".to_string()))
    } else {
      Ok(format!("<svg data-diagram=\"{id}\"></svg>"))
    }
  }
}

/// Host recording every call.
#[derive(Default)]
pub struct RecordingHost {
  pub events: Mutex<Vec<String>>,
}

impl RecordingHost {
  pub fn events(&self) -> Vec<String> {
    self.events.lock().expect("events lock").clone()
  }

  fn record(&self, event: String) {
    self.events.lock().expect("events lock").push(event);
  }
}

impl Host for RecordingHost {
  fn open_external(&self, url: &str) {
    self.record(format!("open {url}"));
  }

  fn request_load_document(&self, path: &Path) {
    self.record(format!("load {}", path.display()));
  }

  fn scroll_into_view(&self, id: &str) {
    self.record(format!("scroll {id}"));
  }

  fn notify(&self, message: &str) {
    self.record(format!("notify {message}"));
  }
}

pub fn processor(fs: Arc<MemoryFs>) -> WikiProcessor {
  WikiProcessor::new(WikiOptions {
    highlight_code: false,
    ..WikiOptions::default()
  })
  .with_file_system(fs)
}
