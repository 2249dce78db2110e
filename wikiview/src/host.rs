//! The terminal as a wikiview host.
//!
//! There is no window to scroll or navigate, so document loads and notices
//! are recorded for the command that triggered them, and external links go
//! to the system opener.
use std::{
  path::{Path, PathBuf},
  sync::{Mutex, MutexGuard, PoisonError},
};

use log::{debug, info, warn};
use wikiview_commonmark::Host;

#[derive(Debug, Default)]
struct Events {
  opened:    Vec<String>,
  requested: Vec<PathBuf>,
  scrolled:  Vec<String>,
  notices:   Vec<String>,
}

/// [`Host`] for command line use.
#[derive(Debug, Default)]
pub struct CliHost {
  open_external: bool,
  events:        Mutex<Events>,
}

impl CliHost {
  /// A host that hands external links to the system opener only when
  /// `open_external` is set, and logs them otherwise.
  #[must_use]
  pub fn new(open_external: bool) -> Self {
    Self {
      open_external,
      events: Mutex::default(),
    }
  }

  fn events(&self) -> MutexGuard<'_, Events> {
    self.events.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// External URLs the host was asked to open.
  #[must_use]
  pub fn opened(&self) -> Vec<String> {
    self.events().opened.clone()
  }

  /// Documents the host was asked to load, oldest first.
  #[must_use]
  pub fn take_requested(&self) -> Vec<PathBuf> {
    std::mem::take(&mut self.events().requested)
  }

  /// Element ids scrolled into view.
  #[must_use]
  pub fn scrolled(&self) -> Vec<String> {
    self.events().scrolled.clone()
  }

  /// User-visible notices.
  #[must_use]
  pub fn notices(&self) -> Vec<String> {
    self.events().notices.clone()
  }
}

impl Host for CliHost {
  fn open_external(&self, url: &str) {
    self.events().opened.push(url.to_string());
    if !self.open_external {
      info!("Not opening {url}");
      return;
    }
    match open::that(url) {
      Ok(()) => info!("Opened {url}"),
      Err(e) => warn!("Failed to open {url}: {e}"),
    }
  }

  fn request_load_document(&self, path: &Path) {
    debug!("Load requested: {}", path.display());
    self.events().requested.push(path.to_path_buf());
  }

  fn scroll_into_view(&self, id: &str) {
    info!("Scrolled to #{id}");
    self.events().scrolled.push(id.to_string());
  }

  fn notify(&self, message: &str) {
    warn!("{message}");
    self.events().notices.push(message.to_string());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_records_events_without_opening() {
    let host = CliHost::new(false);
    host.open_external("https://example.com");
    host.request_load_document(Path::new("/wiki/a.md"));
    host.request_load_document(Path::new("/wiki/b.md"));
    host.scroll_into_view("install");
    host.notify("File not found: c.md");

    assert_eq!(host.opened(), vec!["https://example.com"]);
    assert_eq!(host.scrolled(), vec!["install"]);
    assert_eq!(host.notices(), vec!["File not found: c.md"]);
    assert_eq!(host.take_requested(), vec![
      PathBuf::from("/wiki/a.md"),
      PathBuf::from("/wiki/b.md")
    ]);
    assert!(host.take_requested().is_empty());
  }
}
