//! Azure DevOps wiki macro expansion.
//!
//! The dialect's text macros are rewritten into plain markdown or inline HTML
//! before structural parsing. Expansion is an ordered list of [`MacroRule`]s,
//! each a pure text transform applied left to right. Rules see only the
//! segments their [`RuleScope`] names: prose rules never touch code or diagram
//! bodies, and the diagram rule never touches prose.
//!
//! Expansion is total. Anything a rule cannot fully interpret, an unterminated
//! `:::mermaid` block for instance, is left as literal text.
pub mod emoji;

use std::{path::Path, sync::LazyLock};

use log::trace;
use regex::{Captures, Regex};

use crate::utils::{
  codeblock::{SegmentKind, is_diagram_close, split_segments},
  compile_or_never,
};

/// Comment the TOC macro expands to; replaced during enrichment.
pub const TOC_PLACEHOLDER: &str = "TOC_PLACEHOLDER";
/// Comment the TOSP macro expands to; replaced during enrichment.
pub const TOSP_PLACEHOLDER: &str = "TOSP_PLACEHOLDER";
/// Class of the element wrapping a diagram's source.
pub const DIAGRAM_CLASS: &str = "mermaid-diagram";

/// Which segments of the source a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
  /// Text outside of code and diagram blocks.
  Prose,
  /// Terminated `:::mermaid` blocks, delimiters included.
  Diagram,
}

impl RuleScope {
  const fn accepts(self, kind: SegmentKind) -> bool {
    matches!(
      (self, kind),
      (Self::Prose, SegmentKind::Prose) | (Self::Diagram, SegmentKind::Diagram)
    )
  }
}

/// Per-document state threaded through the rules.
#[derive(Debug, Clone)]
pub struct MacroContext {
  /// Extension appended to wiki-link targets.
  pub canonical_extension: String,
  next_diagram:            usize,
}

impl MacroContext {
  #[must_use]
  pub fn new(canonical_extension: impl Into<String>) -> Self {
    Self {
      canonical_extension: canonical_extension.into(),
      next_diagram:        0,
    }
  }

  /// Issue the next diagram container id. Unique within one expansion.
  pub fn next_diagram_id(&mut self) -> String {
    let id = format!("mermaid-{}", self.next_diagram);
    self.next_diagram += 1;
    id
  }
}

impl Default for MacroContext {
  fn default() -> Self {
    Self::new("md")
  }
}

/// A single named, scoped text rewrite.
#[derive(Clone, Copy)]
pub struct MacroRule {
  pub name:  &'static str,
  pub scope: RuleScope,
  apply:     fn(&str, &mut MacroContext) -> String,
}

impl std::fmt::Debug for MacroRule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MacroRule")
      .field("name", &self.name)
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}

impl MacroRule {
  #[must_use]
  pub const fn new(
    name: &'static str,
    scope: RuleScope,
    apply: fn(&str, &mut MacroContext) -> String,
  ) -> Self {
    Self { name, scope, apply }
  }

  /// Apply this rule alone to a piece of text.
  #[must_use]
  pub fn apply(&self, text: &str, ctx: &mut MacroContext) -> String {
    (self.apply)(text, ctx)
  }
}

/// The dialect's rules, in application order.
pub const STANDARD_RULES: [MacroRule; 8] = [
  MacroRule::new("toc", RuleScope::Prose, expand_toc),
  MacroRule::new("tosp", RuleScope::Prose, expand_tosp),
  MacroRule::new("wiki-link", RuleScope::Prose, expand_wiki_links),
  MacroRule::new("mention", RuleScope::Prose, expand_mentions),
  MacroRule::new("work-item", RuleScope::Prose, expand_work_items),
  MacroRule::new("attachment", RuleScope::Prose, expand_attachments),
  MacroRule::new("mermaid", RuleScope::Diagram, expand_diagram),
  MacroRule::new("emoji", RuleScope::Prose, expand_emoji),
];

/// An ordered rule list.
#[derive(Debug, Clone)]
pub struct Preprocessor {
  rules: Vec<MacroRule>,
}

impl Default for Preprocessor {
  fn default() -> Self {
    Self::new(STANDARD_RULES.to_vec())
  }
}

impl Preprocessor {
  #[must_use]
  pub const fn new(rules: Vec<MacroRule>) -> Self {
    Self { rules }
  }

  #[must_use]
  pub fn rules(&self) -> &[MacroRule] {
    &self.rules
  }

  /// Expand every macro in `raw_text`.
  #[must_use]
  pub fn expand(&self, raw_text: &str, ctx: &mut MacroContext) -> String {
    let mut segments: Vec<(SegmentKind, String)> = split_segments(raw_text)
      .into_iter()
      .map(|s| (s.kind, s.text.to_string()))
      .collect();

    for rule in &self.rules {
      for (kind, text) in &mut segments {
        if rule.scope.accepts(*kind) {
          *text = rule.apply(text, ctx);
        }
      }
    }

    segments.into_iter().map(|(_, text)| text).collect()
  }
}

/// Expand the dialect's macros of one document with the standard rules.
#[must_use]
pub fn preprocess(
  raw_text: &str,
  source_path: &Path,
  canonical_extension: &str,
) -> String {
  trace!("Expanding wiki macros in {}", source_path.display());
  let mut ctx = MacroContext::new(canonical_extension);
  Preprocessor::default().expand(raw_text, &mut ctx)
}

static TOC_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("TOC_RE", r"(?i)\[\[_TOC_\]\]"));
static TOSP_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("TOSP_RE", r"(?i)\[\[_TOSP_\]\]"));
static WIKI_LINK_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WIKI_LINK_RE", r"\[\[([^\]]+)\]\]"));
static MENTION_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("MENTION_RE", r"(^|[^\w.@/])@(\w+)"));
static WORK_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("WORK_ITEM_RE", r"(^|[^\w&/#(\[])#(\d+)\b")
});
static ATTACHMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("ATTACHMENT_RE", r"(?i)\[\[attachment:([^\]]+)\]\]")
});
/// Text the inline span rules must leave alone: attachment macros, link
/// destinations and HTML tags or comments.
static PROTECTED_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "PROTECTED_RE",
    r"(?i)\[\[attachment:[^\]]+\]\]|\]\([^)]*\)|<[a-z/!][^>]*>",
  )
});
static WHITESPACE_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WHITESPACE_RE", r"\s+"));

fn expand_toc(text: &str, _ctx: &mut MacroContext) -> String {
  TOC_RE
    .replace_all(text, format!("<!-- {TOC_PLACEHOLDER} -->"))
    .into_owned()
}

fn expand_tosp(text: &str, _ctx: &mut MacroContext) -> String {
  TOSP_RE
    .replace_all(text, format!("<!-- {TOSP_PLACEHOLDER} -->"))
    .into_owned()
}

/// `[[Target]]` and `[[Target|Display]]` become `[Display](Target.md)`.
fn expand_wiki_links(text: &str, ctx: &mut MacroContext) -> String {
  WIKI_LINK_RE
    .replace_all(text, |caps: &Captures| {
      let inner = &caps[1];
      if (inner.starts_with('_') && inner.ends_with('_'))
        || inner.get(..11).is_some_and(|p| p.eq_ignore_ascii_case("attachment:"))
      {
        return caps[0].to_string();
      }

      let (target, display) = match inner.split_once('|') {
        Some((target, display)) => (target.trim(), display.trim()),
        None => (inner.trim(), inner.trim()),
      };
      if target.is_empty() {
        return caps[0].to_string();
      }

      let mut file = WHITESPACE_RE.replace_all(target, "-").into_owned();
      let suffix = format!(".{}", ctx.canonical_extension);
      if !file.to_lowercase().ends_with(&suffix.to_lowercase()) {
        file.push_str(&suffix);
      }
      format!("[{display}]({file})")
    })
    .into_owned()
}

/// Apply `re` to the text between protected spans only.
fn replace_unprotected(text: &str, re: &Regex, replacement: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;
  for protected in PROTECTED_RE.find_iter(text) {
    out.push_str(&re.replace_all(&text[last..protected.start()], replacement));
    out.push_str(protected.as_str());
    last = protected.end();
  }
  out.push_str(&re.replace_all(&text[last..], replacement));
  out
}

/// `@name` becomes an inert styled span.
fn expand_mentions(text: &str, _ctx: &mut MacroContext) -> String {
  replace_unprotected(
    text,
    &MENTION_RE,
    "$1<span class=\"mention\">@$2</span>",
  )
}

/// `#123` becomes an inert styled span with the id as tooltip.
fn expand_work_items(text: &str, _ctx: &mut MacroContext) -> String {
  replace_unprotected(
    text,
    &WORK_ITEM_RE,
    "$1<span class=\"work-item-link\" title=\"Work Item $2\">#$2</span>",
  )
}

/// `[[attachment:name]]` becomes a placeholder link that is never resolved.
fn expand_attachments(text: &str, _ctx: &mut MacroContext) -> String {
  ATTACHMENT_RE
    .replace_all(text, |caps: &Captures| {
      let name = caps[1].trim();
      format!(
        "<a href=\"#\" class=\"attachment-link\" data-attachment=\"{}\">📎 \
         {}</a>",
        html_escape::encode_double_quoted_attribute(name),
        html_escape::encode_text(name),
      )
    })
    .into_owned()
}

/// A `:::mermaid` ... `:::` block becomes a container holding the verbatim
/// source, tagged with a document-unique id.
fn expand_diagram(block: &str, ctx: &mut MacroContext) -> String {
  let mut lines = block.split_inclusive('\n');
  let _opener = lines.next();
  let body: Vec<&str> = lines.collect();
  let Some((closer, body)) = body.split_last() else {
    return block.to_string();
  };
  if !is_diagram_close(closer) {
    return block.to_string();
  }

  let source = body.concat();
  let source = source.trim();
  let trailing = closer.trim_start().trim_start_matches(':');
  let id = ctx.next_diagram_id();

  format!(
    "<pre class=\"{DIAGRAM_CLASS}\" id=\"{id}\">{}</pre>\n{trailing}",
    html_escape::encode_text(source),
  )
}

fn expand_emoji(text: &str, _ctx: &mut MacroContext) -> String {
  emoji::replace_shortcodes(text)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn expand(text: &str) -> String {
    preprocess(text, Path::new("/wiki/page.md"), "md")
  }

  fn rule(name: &str) -> MacroRule {
    STANDARD_RULES
      .iter()
      .copied()
      .find(|r| r.name == name)
      .expect("rule exists")
  }

  #[test]
  fn test_rule_order_is_data() {
    let names: Vec<_> = STANDARD_RULES.iter().map(|r| r.name).collect();
    assert_eq!(names, [
      "toc",
      "tosp",
      "wiki-link",
      "mention",
      "work-item",
      "attachment",
      "mermaid",
      "emoji"
    ]);
  }

  #[test]
  fn test_plain_text_is_unchanged() {
    let text = "# Title\n\nSome *text* with [a link](page.md) and e-mail \
                bob@example.com.\n\n- item\n";
    assert_eq!(expand(text), text);
  }

  #[test]
  fn test_toc_and_tosp_placeholders() {
    let out = expand("[[_toc_]]\n\n[[_TOSP_]]\n");
    assert_eq!(
      out,
      "<!-- TOC_PLACEHOLDER -->\n\n<!-- TOSP_PLACEHOLDER -->\n"
    );
  }

  #[test]
  fn test_wiki_link_without_display() {
    assert_eq!(
      expand("[[Getting Started]]"),
      "[Getting Started](Getting-Started.md)"
    );
  }

  #[test]
  fn test_wiki_link_with_display() {
    assert_eq!(
      expand("[[Getting Started|Start Here]]"),
      "[Start Here](Getting-Started.md)"
    );
  }

  #[test]
  fn test_wiki_link_keeps_existing_extension() {
    assert_eq!(expand("[[notes.md]]"), "[notes.md](notes.md)");
  }

  #[test]
  fn test_wiki_link_skips_underscore_markers() {
    let mut ctx = MacroContext::default();
    let out = rule("wiki-link").apply("[[_Custom_]]", &mut ctx);
    assert_eq!(out, "[[_Custom_]]");
  }

  #[test]
  fn test_mention_and_work_item() {
    assert_eq!(
      expand("ping @alice about #42"),
      "ping <span class=\"mention\">@alice</span> about <span \
       class=\"work-item-link\" title=\"Work Item 42\">#42</span>"
    );
  }

  #[test]
  fn test_work_item_ignores_entities_and_fragments() {
    let text = "&#123; and [x](#12) and page#3";
    assert_eq!(expand(text), text);
  }

  #[test]
  fn test_wiki_link_target_keeps_mentions_and_work_items() {
    assert_eq!(
      expand("[[Team @alice]]"),
      "[Team <span class=\"mention\">@alice</span>](Team-@alice.md)"
    );
    assert_eq!(
      expand("[[Bug #12]]"),
      "[Bug <span class=\"work-item-link\" title=\"Work Item \
       12\">#12</span>](Bug-#12.md)"
    );
  }

  #[test]
  fn test_attachment_name_is_not_a_mention() {
    assert_eq!(
      expand("[[attachment:@logo.png]]"),
      "<a href=\"#\" class=\"attachment-link\" \
       data-attachment=\"@logo.png\">📎 @logo.png</a>"
    );
  }

  #[test]
  fn test_html_tags_are_not_rewritten() {
    let text = "<img src=\"a.png\" alt=\"by @bob\"> <a title=\"#7\">x</a>";
    assert_eq!(expand(text), text);
    assert_eq!(
      expand("<b>@bob</b>"),
      "<b><span class=\"mention\">@bob</span></b>"
    );
  }

  #[test]
  fn test_attachment_is_not_a_wiki_link() {
    assert_eq!(
      expand("[[attachment:release notes.pdf]]"),
      "<a href=\"#\" class=\"attachment-link\" data-attachment=\"release \
       notes.pdf\">📎 release notes.pdf</a>"
    );
  }

  #[test]
  fn test_mermaid_block() {
    let out = expand(":::mermaid\ngraph TD; A-->B\n:::");
    assert_eq!(
      out,
      "<pre class=\"mermaid-diagram\" id=\"mermaid-0\">graph TD; \
       A--&gt;B</pre>\n"
    );
  }

  #[test]
  fn test_mermaid_ids_are_unique() {
    let out = expand(":::mermaid\na\n:::\n\n::: mermaid\nb\n:::\n");
    assert!(out.contains("id=\"mermaid-0\""));
    assert!(out.contains("id=\"mermaid-1\""));
  }

  #[test]
  fn test_mermaid_body_untouched_by_inline_rules() {
    let out = expand(":::mermaid\nA-->B: @bob #12 :rocket:\n:::\n");
    assert!(out.contains("@bob #12 :rocket:"));
    assert!(!out.contains("mention"));
  }

  #[test]
  fn test_unterminated_mermaid_is_literal() {
    let text = ":::mermaid\ngraph TD";
    assert_eq!(expand(text), text);
  }

  #[test]
  fn test_code_is_never_expanded() {
    let text = "`@user #1 :rocket:`\n\n```\n[[Page]] @user\n```\n";
    assert_eq!(expand(text), text);
  }

  #[test]
  fn test_emoji_fallback() {
    assert_eq!(expand("Ship it :rocket:"), "Ship it 🚀");
  }
}
