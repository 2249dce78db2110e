//! Small helpers over the kuchikikiki DOM shared by the rendering passes.
//!
//! Rendered fragments are parsed behind an explicit `<body>` so that a
//! leading comment (a placeholder, typically) lands inside the body instead
//! of before the root element, and only the body's children are serialized
//! back.
use kuchikikiki::NodeRef;
use tendril::TendrilSink;

const BODY_PREFIX: &str = "<html><head></head><body>";

/// Parse an HTML fragment into a full document.
pub fn parse_fragment(html: &str) -> NodeRef {
  let mut wrapped = String::with_capacity(BODY_PREFIX.len() + html.len());
  wrapped.push_str(BODY_PREFIX);
  wrapped.push_str(html);
  kuchikikiki::parse_html().one(wrapped)
}

/// The `<body>` of a parsed document.
pub fn body(document: &NodeRef) -> Option<NodeRef> {
  document
    .select_first("body")
    .ok()
    .map(|body| body.as_node().clone())
}

/// Serialize the children of the document's body.
pub fn serialize_body(document: &NodeRef) -> String {
  let Some(body) = body(document) else {
    return String::new();
  };
  let mut out = Vec::new();
  for child in body.children() {
    if let Err(e) = child.serialize(&mut out) {
      log::warn!("Failed to serialize rendered node: {e}");
    }
  }
  String::from_utf8(out).unwrap_or_default()
}

/// Replace `node` with the nodes parsed from `html`.
pub fn replace_with_html(node: &NodeRef, html: &str) {
  let fragment = parse_fragment(html);
  if let Some(body) = body(&fragment) {
    let children: Vec<NodeRef> = body.children().collect();
    for child in children {
      node.insert_before(child);
    }
  }
  node.detach();
}

/// Parse `html` and return its first element matching `selector`, detached.
pub fn parse_element(html: &str, selector: &str) -> Option<NodeRef> {
  let fragment = parse_fragment(html);
  let element = fragment.select_first(selector).ok()?.as_node().clone();
  element.detach();
  Some(element)
}

/// Local tag name of an element node.
pub fn tag_name(node: &NodeRef) -> Option<String> {
  node
    .as_element()
    .map(|element| element.name.local.as_ref().to_string())
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
  node
    .as_element()
    .and_then(|element| element.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attr(node: &NodeRef, name: &str, value: impl Into<String>) {
  if let Some(element) = node.as_element() {
    element.attributes.borrow_mut().insert(name, value.into());
  }
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
  attr(node, "class")
    .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Append `class` to the element's class list unless already present.
pub fn add_class(node: &NodeRef, class: &str) {
  if has_class(node, class) {
    return;
  }
  let classes = match attr(node, "class") {
    Some(existing) if !existing.trim().is_empty() => {
      format!("{} {class}", existing.trim())
    },
    _ => class.to_string(),
  };
  set_attr(node, "class", classes);
}

/// Comment nodes whose text contains `marker`, in document order.
pub fn find_placeholders(document: &NodeRef, marker: &str) -> Vec<NodeRef> {
  document
    .inclusive_descendants()
    .filter(|node| {
      node
        .as_comment()
        .is_some_and(|text| text.borrow().contains(marker))
    })
    .collect()
}

/// Replace a placeholder comment with `html`.
///
/// A placeholder that is the only content of its paragraph replaces the
/// whole paragraph, so block content never ends up inside a `<p>`.
pub fn replace_placeholder(comment: &NodeRef, html: &str) {
  let target = comment
    .parent()
    .filter(|parent| {
      tag_name(parent).as_deref() == Some("p")
        && parent.children().all(|child| {
          child == *comment
            || child
              .as_text()
              .is_some_and(|text| text.borrow().trim().is_empty())
        })
    })
    .unwrap_or_else(|| comment.clone());
  replace_with_html(&target, html);
}

/// Every `id` attribute in document order.
pub fn element_ids(document: &NodeRef) -> Vec<String> {
  document
    .descendants()
    .filter_map(|node| attr(&node, "id"))
    .filter(|id| !id.is_empty())
    .collect()
}

/// Find an element by its `id` attribute.
pub fn find_by_id(document: &NodeRef, id: &str) -> Option<NodeRef> {
  document
    .descendants()
    .find(|node| attr(node, "id").as_deref() == Some(id))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_leading_comment_survives_roundtrip() {
    let document = parse_fragment("<!-- TOC_PLACEHOLDER -->\n<h1>Hi</h1>");
    let html = serialize_body(&document);
    assert!(html.starts_with("<!-- TOC_PLACEHOLDER -->"));
    assert!(html.contains("<h1>Hi</h1>"));
  }

  #[test]
  fn test_placeholder_in_own_paragraph_replaces_paragraph() {
    let document = parse_fragment("<p><!-- X --></p><p>a <!-- X --> b</p>");
    for comment in find_placeholders(&document, "X") {
      replace_placeholder(&comment, "<nav>n</nav>");
    }
    let html = serialize_body(&document);
    assert_eq!(html, "<nav>n</nav><p>a <nav>n</nav> b</p>");
  }

  #[test]
  fn test_add_class_is_idempotent() {
    let document = parse_fragment("<a class=\"internal-link\">x</a>");
    let anchor = document
      .select_first("a")
      .expect("anchor exists")
      .as_node()
      .clone();
    add_class(&anchor, "broken-link");
    add_class(&anchor, "broken-link");
    assert_eq!(
      attr(&anchor, "class").as_deref(),
      Some("internal-link broken-link")
    );
  }

  #[test]
  fn test_element_ids() {
    let document =
      parse_fragment("<h1 id=\"a\">A</h1><div><span id=\"b\"></span></div>");
    assert_eq!(element_ids(&document), vec!["a", "b"]);
    assert!(find_by_id(&document, "b").is_some());
    assert!(find_by_id(&document, "c").is_none());
  }
}
