//! Rendering entry points with error recovery.
//!
//! The synchronous structural stage runs first; the filesystem and diagram
//! work happens afterwards on plain data, so no DOM node is ever held across
//! a suspension point.
use std::{any::Any, path::Path};

use log::{debug, error};

use super::types::{StagedRender, WikiProcessor};
use crate::{
  dom,
  enrich::{self, broken, diagrams, tosp},
  error::ResolutionError,
  types::{Document, LinkStatus, RenderOutput},
};

/// Run `f`, turning a panic into its message.
pub(crate) fn catch_panic<T, F>(f: F) -> Result<T, String>
where
  F: FnOnce() -> T,
{
  std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
    .map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else {
    "unknown panic".to_string()
  }
}

/// Safely process markup content with error recovery.
///
/// Applies `processor_fn` to `content`; if it panics, the error is logged
/// and `fallback` (or the untouched content when `fallback` is empty) is
/// returned instead.
pub fn process_safe<F>(content: &str, processor_fn: F, fallback: &str) -> String
where
  F: FnOnce(&str) -> String,
{
  if content.is_empty() {
    return String::new();
  }

  match catch_panic(|| processor_fn(content)) {
    Ok(processed_text) => processed_text,
    Err(message) => {
      error!("Error processing markup: {message}");
      if fallback.is_empty() {
        content.to_string()
      } else {
        fallback.to_string()
      }
    },
  }
}

impl WikiProcessor {
  /// Render a document into enriched, navigable HTML.
  ///
  /// Never fails: per-item problems are rendered inline, and a compiler
  /// failure replaces the output with an error panel and sets
  /// [`RenderOutput::fatal`].
  pub async fn render(&self, document: &Document) -> RenderOutput {
    let expanded = self.preprocess(&document.raw_text, &document.path);

    match self.render_structure(&expanded, &document.path) {
      Ok(staged) => self.enrich(staged, &document.path).await,
      Err(fatal) => {
        error!(
          "Failed to render {}: {}: {}",
          document.path.display(),
          fatal.message,
          fatal.detail
        );
        RenderOutput {
          html: fatal.to_panel_html(),
          fatal: Some(fatal),
          ..RenderOutput::default()
        }
      },
    }
  }

  /// Read and render a document.
  ///
  /// # Errors
  ///
  /// Returns [`ResolutionError`] if the document cannot be read.
  pub async fn render_file(
    &self,
    path: &Path,
  ) -> Result<RenderOutput, ResolutionError> {
    let document = self.resolver.read_document(path).await?;
    Ok(self.render(&document).await)
  }

  /// Run the asynchronous enrichment passes over a structural render.
  pub async fn enrich(
    &self,
    staged: StagedRender,
    current_path: &Path,
  ) -> RenderOutput {
    let StagedRender {
      html,
      headers,
      title,
      mut links,
      diagrams: pending,
      needs_tosp,
    } = staged;

    let subpages = if needs_tosp {
      Some(
        tosp::materialize(
          &self.resolver,
          current_path,
          &self.options.index_names,
          self.overrides.as_ref(),
        )
        .await,
      )
    } else {
      None
    };

    broken::check_links(&self.resolver, current_path, &mut links).await;

    let rendered =
      diagrams::render_diagrams(self.diagrams.as_deref(), &pending).await;
    debug!(
      "Enriched {}: {} links, {} diagrams",
      current_path.display(),
      links.len(),
      rendered.len()
    );

    let patch = enrich::Patch {
      subpages: subpages.as_ref().map(|t| t.html.as_str()),
      links:    &links,
      diagrams: &rendered,
    };
    let html = process_safe(&html, |html| enrich::apply(html, &patch), "");
    let element_ids = dom::element_ids(&dom::parse_fragment(&html));

    if let Some(subpages) = subpages {
      links.extend(subpages.links.into_iter().map(|mut link| {
        link.exists = LinkStatus::Exists;
        link
      }));
    }

    RenderOutput {
      html,
      headers,
      title,
      links,
      diagrams: rendered.into_iter().map(|d| d.outcome).collect(),
      element_ids,
      fatal: None,
    }
  }
}
