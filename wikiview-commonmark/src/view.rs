//! The content view: which rendered document is currently shown.
//!
//! Loads may overlap. Each load takes a [`RenderTicket`] before it starts
//! and may only install its result while that ticket is the newest one, so a
//! slow render can never overwrite the view after a later load.
use std::{
  path::{Path, PathBuf},
  sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use log::{debug, warn};

use crate::{
  binder::{Binding, Host},
  error::ResolutionError,
  processor::WikiProcessor,
  types::RenderOutput,
};

/// Generation of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderTicket(u64);

impl RenderTicket {
  #[must_use]
  pub const fn generation(self) -> u64 {
    self.0
  }
}

/// A newer load was requested after this one started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("render superseded by a newer load")]
pub struct Superseded;

/// The document currently installed in a view.
#[derive(Debug, Clone)]
pub struct Installed {
  pub path:    PathBuf,
  pub output:  Arc<RenderOutput>,
  pub binding: Binding,
}

/// A view showing at most one rendered document.
#[derive(Debug, Default)]
pub struct ContentView {
  latest:  AtomicU64,
  current: Mutex<Option<Installed>>,
}

impl ContentView {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Start a load. Every earlier ticket becomes stale.
  pub fn begin_load(&self) -> RenderTicket {
    RenderTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
  }

  #[must_use]
  pub fn is_current(&self, ticket: RenderTicket) -> bool {
    self.latest.load(Ordering::Acquire) == ticket.0
  }

  /// Install a rendered document if `ticket` is still the newest load.
  ///
  /// The previous binding is detached together with the swap; a stale
  /// result has its own binding detached instead and is dropped.
  ///
  /// # Errors
  ///
  /// Returns [`Superseded`] if a newer load was started after `ticket`.
  pub fn commit(
    &self,
    ticket: RenderTicket,
    path: &Path,
    output: RenderOutput,
    binding: Binding,
  ) -> Result<(), Superseded> {
    let mut current = self.lock();
    if !self.is_current(ticket) {
      binding.detach();
      debug!(
        "Discarding stale render of {} (generation {})",
        path.display(),
        ticket.0
      );
      return Err(Superseded);
    }

    let installed = Installed {
      path: path.to_path_buf(),
      output: Arc::new(output),
      binding,
    };
    if let Some(previous) = current.replace(installed) {
      previous.binding.detach();
    }
    Ok(())
  }

  /// Remove the current document, detaching its binding.
  pub fn clear(&self) {
    if let Some(previous) = self.lock().take() {
      previous.binding.detach();
    }
  }

  #[must_use]
  pub fn current(&self) -> Option<Installed> {
    self.lock().clone()
  }

  #[must_use]
  pub fn current_path(&self) -> Option<PathBuf> {
    self.lock().as_ref().map(|installed| installed.path.clone())
  }

  fn lock(&self) -> MutexGuard<'_, Option<Installed>> {
    self.current.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Result of [`load_document`].
#[derive(Debug)]
pub enum LoadOutcome {
  /// The document is now shown.
  Loaded,
  /// A newer load won; nothing was installed.
  Superseded,
  /// The document could not be read.
  Failed(ResolutionError),
}

/// Read, render and install a document.
pub async fn load_document(
  view: &ContentView,
  processor: &WikiProcessor,
  host: Arc<dyn Host>,
  path: &Path,
) -> LoadOutcome {
  let ticket = view.begin_load();

  let output = match processor.render_file(path).await {
    Ok(output) => output,
    Err(e) => {
      warn!("{e}");
      if view.is_current(ticket) {
        host.notify(&format!("Could not open {}", path.display()));
      }
      return LoadOutcome::Failed(e);
    },
  };

  let binding =
    Binding::attach(&output, processor.resolver().clone(), host, path);
  match view.commit(ticket, path, output, binding) {
    Ok(()) => LoadOutcome::Loaded,
    Err(Superseded) => LoadOutcome::Superseded,
  }
}
