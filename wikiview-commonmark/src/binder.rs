//! Click handling for rendered documents.
//!
//! A [`Binding`] ties one rendered output to the capabilities a click may
//! need: the host (external open, document loads, scrolling, notices) and
//! the path resolver. Every click on an anchor goes through
//! [`Binding::dispatch`]; nothing navigates on its own.
use std::{
  collections::HashSet,
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use log::{debug, trace};

use crate::{
  links::{decode_reference, split_fragment},
  resolve::{PathResolver, normalize},
  types::{LinkClass, RenderOutput},
};

/// Capabilities supplied by the host shell. All calls are fire-and-forget.
pub trait Host: Send + Sync {
  /// Open a URL outside the viewer.
  fn open_external(&self, url: &str);

  /// Make `path` the current document.
  fn request_load_document(&self, path: &Path);

  /// Scroll the element with `id` into view.
  fn scroll_into_view(&self, id: &str);

  /// Show a user-visible notice.
  fn notify(&self, message: &str);
}

/// A click on a rendered anchor, as seen through its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorClick {
  /// `None` for anchors the pipeline did not classify.
  pub classification: Option<LinkClass>,
  /// The reference as written: `data-href` for internal links, `href`
  /// otherwise.
  pub href:           String,
}

impl AnchorClick {
  #[must_use]
  pub fn new(classification: LinkClass, href: impl Into<String>) -> Self {
    Self {
      classification: Some(classification),
      href:           href.into(),
    }
  }

  /// Rebuild a click from the `class`, `href` and `data-href` attributes of
  /// the clicked anchor.
  #[must_use]
  pub fn from_attributes(
    class: Option<&str>,
    href: Option<&str>,
    data_href: Option<&str>,
  ) -> Self {
    let classification = class.and_then(LinkClass::from_class_attr);
    let href = match classification {
      Some(LinkClass::Internal) => data_href.or(href),
      _ => href,
    };
    Self {
      classification,
      href: href.unwrap_or_default().to_string(),
    }
  }
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
  /// Handed to the host's external opener.
  OpenedExternal(String),
  /// Scrolled to the element with this id.
  ScrolledTo(String),
  /// No element with this id; nothing happened.
  AnchorMissing(String),
  /// The host was asked to load another document.
  Navigated {
    path:     PathBuf,
    fragment: Option<String>,
  },
  /// No document at the reference; the host showed a notice.
  NotFound(String),
  /// Not a classified anchor, or nothing to navigate to.
  Ignored,
  /// The binding was torn down before or during the click.
  Detached,
}

struct BindingState {
  element_ids:  HashSet<String>,
  resolver:     PathResolver,
  host:         Arc<dyn Host>,
  current_path: PathBuf,
  active:       AtomicBool,
}

/// Detachable click handling for one rendered document.
///
/// Clones share state: detaching one detaches all.
#[derive(Clone)]
pub struct Binding {
  state: Arc<BindingState>,
}

impl std::fmt::Debug for Binding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Binding")
      .field("current_path", &self.state.current_path)
      .field("element_ids", &self.state.element_ids.len())
      .field("active", &self.is_active())
      .finish_non_exhaustive()
  }
}

impl Binding {
  /// Bind click handling to `output`, rendered from `current_path`.
  #[must_use]
  pub fn attach(
    output: &RenderOutput,
    resolver: PathResolver,
    host: Arc<dyn Host>,
    current_path: &Path,
  ) -> Self {
    Self {
      state: Arc::new(BindingState {
        element_ids: output.element_ids.iter().cloned().collect(),
        resolver,
        host,
        current_path: current_path.to_path_buf(),
        active: AtomicBool::new(true),
      }),
    }
  }

  /// Tear the binding down. Later clicks are no-ops.
  pub fn detach(&self) {
    if self.state.active.swap(false, Ordering::AcqRel) {
      trace!("Detached binding for {}", self.state.current_path.display());
    }
  }

  #[must_use]
  pub fn is_active(&self) -> bool {
    self.state.active.load(Ordering::Acquire)
  }

  #[must_use]
  pub fn current_path(&self) -> &Path {
    &self.state.current_path
  }

  /// Handle a click.
  pub async fn dispatch(&self, click: &AnchorClick) -> ClickOutcome {
    if !self.is_active() {
      return ClickOutcome::Detached;
    }
    let Some(classification) = click.classification else {
      return ClickOutcome::Ignored;
    };

    match classification {
      LinkClass::External => {
        self.state.host.open_external(&click.href);
        ClickOutcome::OpenedExternal(click.href.clone())
      },
      LinkClass::Anchor => {
        self.scroll_to(click.href.strip_prefix('#').unwrap_or(&click.href))
      },
      LinkClass::Internal => self.follow_internal(&click.href).await,
    }
  }

  async fn follow_internal(&self, href: &str) -> ClickOutcome {
    let (file, fragment) = split_fragment(href);

    if let Some(fragment) = fragment
      && (file.is_empty() || self.is_current_document(file))
    {
      return self.scroll_to(fragment);
    }
    if file.is_empty() {
      return ClickOutcome::Ignored;
    }

    let resolved = self
      .state
      .resolver
      .resolve_with_fallback(&self.state.current_path, file)
      .await;

    // The view may have moved on while the check was in flight.
    if !self.is_active() {
      return ClickOutcome::Detached;
    }

    if resolved.exists {
      debug!("Following '{href}' to {}", resolved.path.display());
      self.state.host.request_load_document(&resolved.path);
      ClickOutcome::Navigated {
        path:     resolved.path,
        fragment: fragment.map(decode_reference),
      }
    } else {
      self.state.host.notify(&format!("File not found: {href}"));
      ClickOutcome::NotFound(href.to_string())
    }
  }

  fn is_current_document(&self, file: &str) -> bool {
    let current = normalize(&self.state.current_path);
    self.state.resolver.resolve(&current, file) == current
  }

  fn scroll_to(&self, fragment: &str) -> ClickOutcome {
    let id = decode_reference(fragment);
    if self.state.element_ids.contains(&id) {
      self.state.host.scroll_into_view(&id);
      ClickOutcome::ScrolledTo(id)
    } else {
      trace!("No element with id '{id}' to scroll to");
      ClickOutcome::AnchorMissing(id)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_click_from_attributes() {
    let click = AnchorClick::from_attributes(
      Some("internal-link broken-link"),
      Some("javascript:void(0)"),
      Some("setup.md"),
    );
    assert_eq!(click, AnchorClick::new(LinkClass::Internal, "setup.md"));

    let click = AnchorClick::from_attributes(
      Some("external-link"),
      Some("https://example.com"),
      None,
    );
    assert_eq!(
      click,
      AnchorClick::new(LinkClass::External, "https://example.com")
    );

    let click = AnchorClick::from_attributes(None, Some("#x"), None);
    assert_eq!(click.classification, None);
  }
}
