//! Link and image rendering hooks.
//!
//! The compiler's anchors and images are re-rendered through a
//! [`RenderOverrides`] implementation injected into the processor, so hosts
//! can change how classified links look without touching the pipeline.
use std::path::{Path, PathBuf};

use crate::{links, resolve::resolve_reference, types::LinkClass};

/// Inline "Image not found" graphic swapped in by a broken image's `onerror`.
const BROKEN_IMAGE_SVG: &str = "data:image/svg+xml,<svg \
                                xmlns=%22http://www.w3.org/2000/svg%22 \
                                width=%22100%22 height=%22100%22><rect \
                                fill=%22%23ddd%22 width=%22100%22 \
                                height=%22100%22/><text x=%2250%%22 \
                                y=%2250%%22 text-anchor=%22middle%22 \
                                dy=%22.3em%22 fill=%22%23999%22>Image not \
                                found</text></svg>";

/// Attributes of an anchor as emitted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttrs {
  pub href:           String,
  pub title:          Option<String>,
  pub classification: LinkClass,
}

impl LinkAttrs {
  /// Attributes for `href`, classified by its shape.
  #[must_use]
  pub fn new(href: impl Into<String>, title: Option<String>) -> Self {
    let href = href.into();
    Self {
      classification: links::classify(&href),
      href,
      title,
    }
  }
}

/// Attributes of an image as emitted by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttrs {
  pub src:   String,
  pub alt:   String,
  pub title: Option<String>,
}

/// Per-render environment handed to the hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
  pub current_file_path: PathBuf,
}

/// Rendering hooks for links and images.
pub trait RenderOverrides: Send + Sync {
  /// The opening `<a ...>` tag for a classified link.
  fn render_link(&self, attrs: &LinkAttrs) -> String;

  /// The complete `<img ...>` element.
  fn render_image(&self, attrs: &ImageAttrs, ctx: &RenderContext) -> String;
}

/// Stock hooks: classified links, resolved images with a missing-image
/// fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOverrides;

impl RenderOverrides for DefaultOverrides {
  fn render_link(&self, attrs: &LinkAttrs) -> String {
    let href = html_escape::encode_double_quoted_attribute(&attrs.href);
    let title = attrs
      .title
      .as_deref()
      .filter(|t| !t.is_empty())
      .map(|t| {
        format!(
          " title=\"{}\"",
          html_escape::encode_double_quoted_attribute(t)
        )
      })
      .unwrap_or_default();

    match attrs.classification {
      LinkClass::External => {
        format!(
          "<a href=\"{href}\"{title} target=\"_blank\" rel=\"noopener \
           noreferrer\" class=\"external-link\">"
        )
      },
      LinkClass::Anchor => {
        format!("<a href=\"{href}\"{title} class=\"anchor-link\">")
      },
      LinkClass::Internal => {
        format!(
          "<a href=\"javascript:void(0)\"{title} class=\"internal-link\" \
           data-href=\"{href}\">"
        )
      },
    }
  }

  fn render_image(&self, attrs: &ImageAttrs, ctx: &RenderContext) -> String {
    let src = resolve_image_src(&attrs.src, &ctx.current_file_path);
    let alt_js = attrs.alt.replace('\\', "\\\\").replace('\'', "\\'");
    let onerror = format!(
      "this.onerror=null; this.src='{BROKEN_IMAGE_SVG}'; this.title='{alt_js}';"
    );
    let title = attrs
      .title
      .as_deref()
      .filter(|t| !t.is_empty())
      .map(|t| {
        format!(
          " title=\"{}\"",
          html_escape::encode_double_quoted_attribute(t)
        )
      })
      .unwrap_or_default();

    format!(
      "<img src=\"{}\" alt=\"{}\"{title} onerror=\"{}\" />",
      html_escape::encode_double_quoted_attribute(&src),
      html_escape::encode_double_quoted_attribute(&attrs.alt),
      html_escape::encode_double_quoted_attribute(&onerror),
    )
  }
}

/// Resolve an image source against the current document.
///
/// URLs and data URIs are kept as they are; anything else becomes a `file://`
/// URL of the resolved absolute path. Relative document paths are taken
/// against the working directory.
#[must_use]
pub fn resolve_image_src(src: &str, current_file_path: &Path) -> String {
  let lower = src.get(..5).unwrap_or(src).to_ascii_lowercase();
  if links::is_external(src) || lower.starts_with("data:") {
    return src.to_string();
  }

  let document = std::path::absolute(current_file_path)
    .unwrap_or_else(|_| current_file_path.to_path_buf());
  let resolved = resolve_reference(&document, src);
  let path = resolved.to_string_lossy().replace('\\', "/");
  let encoded = links::encode_reference(&path);
  if encoded.starts_with('/') {
    format!("file://{encoded}")
  } else {
    format!("file:///{encoded}")
  }
}
