//! Link classification.
//!
//! A link's class is decided once, from the literal shape of its href, and
//! never changes afterwards. External and anchor links are never handed to
//! the path resolver.
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use crate::types::LinkClass;

/// Classify an href by its literal shape.
///
/// `http://` or `https://` is external, a leading `#` is an anchor in the
/// current document, anything else is another document of the wiki.
#[must_use]
pub fn classify(href: &str) -> LinkClass {
  if is_external(href) {
    LinkClass::External
  } else if href.starts_with('#') {
    LinkClass::Anchor
  } else {
    LinkClass::Internal
  }
}

#[must_use]
pub fn is_external(href: &str) -> bool {
  let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
  lower.starts_with("http://") || lower.starts_with("https://")
}

/// Split `page.md#section` into `("page.md", Some("section"))`.
#[must_use]
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
  match href.split_once('#') {
    Some((file, fragment)) => (file, Some(fragment)),
    None => (href, None),
  }
}

/// Characters escaped when a filesystem name becomes a reference or URL path.
const REFERENCE_ENCODE_SET: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

/// Percent-encode a file name or path for use as a reference.
#[must_use]
pub fn encode_reference(name: &str) -> String {
  utf8_percent_encode(name, REFERENCE_ENCODE_SET).to_string()
}

/// Decode a percent-encoded reference (`My%20Page.md` to `My Page.md`).
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
#[must_use]
pub fn decode_reference(reference: &str) -> String {
  percent_decode_str(reference).decode_utf8_lossy().into_owned()
}
