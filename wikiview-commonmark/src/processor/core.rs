//! Core implementation of the wiki processor.
//!
//! This module contains construction of `WikiProcessor` and the synchronous
//! structural stage: macro expansion, the comrak render, and the DOM passes
//! that classify links, resolve images, assign heading ids, highlight code
//! and materialize the table of contents.
use std::{collections::HashSet, path::Path, sync::Arc};

use comrak::{Arena, options::Options, parse_document};
use kuchikikiki::NodeRef;
use log::{debug, error, trace, warn};

use super::{
  overrides::{
    DefaultOverrides,
    ImageAttrs,
    LinkAttrs,
    RenderContext,
    RenderOverrides,
  },
  process::catch_panic,
  types::{PendingDiagram, StagedRender, WikiOptions, WikiProcessor},
};
use crate::{
  dom,
  enrich::{diagrams::DiagramRenderer, toc},
  error::RenderFatalError,
  macros::{
    DIAGRAM_CLASS,
    MacroContext,
    Preprocessor,
    TOC_PLACEHOLDER,
    TOSP_PLACEHOLDER,
  },
  resolve::{FileSystem, LocalFileSystem, PathResolver},
  syntax::{SyntaxManager, create_default_manager},
  types::{Link, LinkClass, TocEntry},
  utils,
};

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

impl WikiProcessor {
  /// Create a processor over the local filesystem with the stock overrides.
  #[must_use]
  pub fn new(options: WikiOptions) -> Self {
    let syntax_manager = if options.highlight_code {
      create_default_manager()
        .map_err(|e| warn!("Syntax highlighting unavailable: {e}"))
        .ok()
        .map(Arc::new)
    } else {
      None
    };
    let resolver = PathResolver::new(
      Arc::new(LocalFileSystem),
      options.markdown_extensions.clone(),
      options.canonical_extension.clone(),
    );

    Self {
      options,
      preprocessor: Preprocessor::default(),
      resolver,
      overrides: Arc::new(DefaultOverrides),
      diagrams: None,
      syntax_manager,
    }
  }

  /// Use a different filesystem collaborator.
  #[must_use]
  pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
    self.resolver = PathResolver::new(
      fs,
      self.options.markdown_extensions.clone(),
      self.options.canonical_extension.clone(),
    );
    self
  }

  /// Use different link and image rendering hooks.
  #[must_use]
  pub fn with_overrides(mut self, overrides: Arc<dyn RenderOverrides>) -> Self {
    self.overrides = overrides;
    self
  }

  /// Render diagram containers with `renderer`.
  #[must_use]
  pub fn with_diagram_renderer(
    mut self,
    renderer: Arc<dyn DiagramRenderer>,
  ) -> Self {
    self.diagrams = Some(renderer);
    self
  }

  /// Replace the syntax manager, or disable highlighting with `None`.
  #[must_use]
  pub fn with_syntax_manager(mut self, manager: Option<SyntaxManager>) -> Self {
    self.syntax_manager = manager.map(Arc::new);
    self
  }

  /// Use a custom macro rule list.
  #[must_use]
  pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
    self.preprocessor = preprocessor;
    self
  }

  #[must_use]
  pub const fn options(&self) -> &WikiOptions {
    &self.options
  }

  #[must_use]
  pub const fn resolver(&self) -> &PathResolver {
    &self.resolver
  }

  /// Expand the dialect's macros. Total: never fails.
  #[must_use]
  pub fn preprocess(&self, raw_text: &str, source_path: &Path) -> String {
    trace!("Expanding wiki macros in {}", source_path.display());
    let mut ctx = MacroContext::new(self.options.canonical_extension.clone());
    self.preprocessor.expand(raw_text, &mut ctx)
  }

  /// Render expanded markdown to HTML and run the structural DOM passes.
  ///
  /// # Errors
  ///
  /// Returns [`RenderFatalError`] only if the markdown compiler itself fails.
  /// A failure in the DOM passes degrades to the compiler's plain output.
  pub fn render_structure(
    &self,
    markdown: &str,
    source_path: &Path,
  ) -> Result<StagedRender, RenderFatalError> {
    let html = self.compile(markdown)?;
    let ctx = RenderContext {
      current_file_path: source_path.to_path_buf(),
    };

    catch_panic(|| self.structure_pass(&html, &ctx)).or_else(|message| {
      error!(
        "Post-processing of {} failed, using compiler output: {message}",
        source_path.display()
      );
      Ok(StagedRender {
        html,
        ..StagedRender::default()
      })
    })
  }

  /// Build comrak options from `WikiOptions`.
  fn comrak_options(&self) -> Options<'_> {
    let mut options = Options::default();
    if self.options.gfm {
      options.extension.table = true;
      options.extension.footnotes = true;
      options.extension.strikethrough = true;
      options.extension.tasklist = true;
      options.extension.autolink = true;
    }
    options.extension.math_dollars = self.options.math;
    options.parse.smart = self.options.smart_punctuation;
    options.render.r#unsafe = true;
    // Ids are assigned on the DOM so that fallbacks and dedup see every
    // heading, raw HTML ones included.
    options.extension.header_id_prefix = None;
    options
  }

  /// Run the markdown compiler.
  fn compile(&self, markdown: &str) -> Result<String, RenderFatalError> {
    let options = self.comrak_options();
    let result = catch_panic(|| {
      let arena = Arena::new();
      let root = parse_document(&arena, markdown, &options);
      let mut html = String::new();
      comrak::format_html(root, &options, &mut html).map(|()| html)
    });

    match result {
      Ok(Ok(html)) => Ok(html),
      Ok(Err(e)) => {
        Err(RenderFatalError::new(
          "Failed to format document as HTML",
          e.to_string(),
        ))
      },
      Err(message) => {
        Err(RenderFatalError::new("Markdown compiler panicked", message))
      },
    }
  }

  fn structure_pass(&self, html: &str, ctx: &RenderContext) -> StagedRender {
    let document = dom::parse_fragment(html);

    self.apply_link_overrides(&document);
    self.apply_image_overrides(&document, ctx);
    let headers = self.assign_heading_ids(&document);
    self.highlight_codeblocks(&document);

    let placeholders = dom::find_placeholders(&document, TOC_PLACEHOLDER);
    if !placeholders.is_empty() {
      let toc_html = toc::render_toc(&headers, self.overrides.as_ref());
      for placeholder in placeholders {
        dom::replace_placeholder(&placeholder, &toc_html);
      }
    }

    let title = headers
      .iter()
      .find(|h| h.level == 1)
      .map(|h| h.text.clone());

    StagedRender {
      links: collect_links(&document),
      diagrams: collect_diagrams(&document),
      needs_tosp: !dom::find_placeholders(&document, TOSP_PLACEHOLDER)
        .is_empty(),
      html: dom::serialize_body(&document),
      headers,
      title,
    }
  }

  /// Re-render every anchor through the link hook.
  fn apply_link_overrides(&self, document: &NodeRef) {
    let anchors: Vec<NodeRef> = elements_named(document, &["a"]);

    for anchor in anchors {
      let Some(href) = dom::attr(&anchor, "href") else {
        continue;
      };
      if dom::attr(&anchor, "data-attachment").is_some() {
        continue;
      }

      let attrs = LinkAttrs::new(href, dom::attr(&anchor, "title"));
      let open_tag = self.overrides.render_link(&attrs);
      let Some(replacement) =
        dom::parse_element(&format!("{open_tag}</a>"), "a")
      else {
        warn!("Link hook produced no anchor for '{}'", attrs.href);
        continue;
      };

      if let Some(id) = dom::attr(&anchor, "id")
        && dom::attr(&replacement, "id").is_none()
      {
        dom::set_attr(&replacement, "id", id);
      }
      let children: Vec<NodeRef> = anchor.children().collect();
      for child in children {
        replacement.append(child);
      }
      anchor.insert_before(replacement);
      anchor.detach();
    }
  }

  /// Re-render every image through the image hook.
  fn apply_image_overrides(&self, document: &NodeRef, ctx: &RenderContext) {
    for image in elements_named(document, &["img"]) {
      let Some(src) = dom::attr(&image, "src") else {
        continue;
      };
      let attrs = ImageAttrs {
        src,
        alt: dom::attr(&image, "alt").unwrap_or_default(),
        title: dom::attr(&image, "title"),
      };
      let html = self.overrides.render_image(&attrs, ctx);
      match dom::parse_element(&html, "img") {
        Some(replacement) => {
          image.insert_before(replacement);
          image.detach();
        },
        None => warn!("Image hook produced no image for '{}'", attrs.src),
      }
    }
  }

  /// Give every heading an id and return the headings in document order.
  ///
  /// Existing ids are kept. Otherwise the slug of the heading text is used,
  /// made unique with `-1`, `-2` suffixes; an empty slug (or disabled slug
  /// ids) falls back to `heading-<index>`.
  fn assign_heading_ids(&self, document: &NodeRef) -> Vec<TocEntry> {
    let mut used: HashSet<String> =
      dom::element_ids(document).into_iter().collect();
    let headings = elements_named(document, &HEADING_TAGS);
    let mut entries = Vec::with_capacity(headings.len());

    for (index, heading) in headings.iter().enumerate() {
      let text = heading.text_contents().trim().to_string();
      let level = dom::tag_name(heading)
        .and_then(|tag| tag.strip_prefix('h')?.parse::<u8>().ok())
        .unwrap_or(1);

      let anchor_id = match dom::attr(heading, "id").filter(|id| !id.is_empty())
      {
        Some(id) => id,
        None => {
          let slug = if self.options.heading_ids {
            utils::slugify(&text)
          } else {
            String::new()
          };
          let base = if slug.is_empty() {
            format!("heading-{index}")
          } else {
            slug
          };
          let id = unique_id(&base, &used);
          used.insert(id.clone());
          dom::set_attr(heading, "id", id.clone());
          id
        },
      };

      entries.push(TocEntry {
        level,
        text,
        anchor_id,
      });
    }

    entries
  }

  /// Highlight fenced code blocks and mark them with the `hljs` class.
  fn highlight_codeblocks(&self, document: &NodeRef) {
    let blocks: Vec<(NodeRef, Option<String>, String)> =
      elements_named(document, &["code"])
        .into_iter()
        .filter_map(|code| {
          let pre = code.parent()?;
          (dom::tag_name(&pre).as_deref() == Some("pre")).then(|| {
            let language = dom::attr(&code, "class").and_then(|class| {
              class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
                .map(str::to_string)
            });
            (pre, language, code.text_contents())
          })
        })
        .collect();

    for (pre, language, code) in blocks {
      let highlighted = language
        .as_deref()
        .and_then(|lang| self.highlight_code_html(&code, lang));

      match (highlighted, language) {
        (Some(inner), Some(lang)) => {
          let html = format!(
            "<pre class=\"hljs\"><code class=\"language-{}\">{inner}</code></pre>",
            html_escape::encode_double_quoted_attribute(&lang)
          );
          dom::replace_with_html(&pre, &html);
        },
        _ => dom::add_class(&pre, "hljs"),
      }
    }
  }

  /// Highlight code using the configured syntax highlighter.
  fn highlight_code_html(&self, code: &str, language: &str) -> Option<String> {
    if !self.options.highlight_code {
      return None;
    }
    let syntax_manager = self.syntax_manager.as_ref()?;

    syntax_manager
      .highlight_code(code, language, self.options.highlight_theme.as_deref())
      .map_err(|e| debug!("Leaving {language} block unhighlighted: {e}"))
      .ok()
  }
}

/// Elements with one of the given tag names, in document order.
fn elements_named(document: &NodeRef, tags: &[&str]) -> Vec<NodeRef> {
  document
    .descendants()
    .filter(|node| {
      dom::tag_name(node).is_some_and(|tag| tags.contains(&tag.as_str()))
    })
    .collect()
}

/// `base`, or `base-1`, `base-2`, ... whichever is free first.
fn unique_id(base: &str, used: &HashSet<String>) -> String {
  if !used.contains(base) {
    return base.to_string();
  }
  (1..)
    .map(|n| format!("{base}-{n}"))
    .find(|candidate| !used.contains(candidate))
    .unwrap_or_else(|| base.to_string())
}

/// Classified anchors in document order.
pub(crate) fn collect_links(document: &NodeRef) -> Vec<Link> {
  elements_named(document, &["a"])
    .into_iter()
    .filter_map(|anchor| {
      let class = LinkClass::from_class_attr(&dom::attr(&anchor, "class")?)?;
      let raw_href = match class {
        LinkClass::Internal => dom::attr(&anchor, "data-href")?,
        LinkClass::External | LinkClass::Anchor => dom::attr(&anchor, "href")?,
      };
      Some(Link::new(raw_href, class))
    })
    .collect()
}

/// Diagram containers left by macro expansion.
fn collect_diagrams(document: &NodeRef) -> Vec<PendingDiagram> {
  elements_named(document, &["pre"])
    .into_iter()
    .filter(|pre| dom::has_class(pre, DIAGRAM_CLASS))
    .filter_map(|pre| {
      Some(PendingDiagram {
        id:     dom::attr(&pre, "id")?,
        source: pre.text_contents().trim().to_string(),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  fn processor() -> WikiProcessor {
    WikiProcessor::new(WikiOptions {
      highlight_code: false,
      ..WikiOptions::default()
    })
  }

  fn stage(markdown: &str) -> StagedRender {
    let processor = processor();
    let path = PathBuf::from("/wiki/guide/intro.md");
    let expanded = processor.preprocess(markdown, &path);
    processor
      .render_structure(&expanded, &path)
      .expect("compiler does not fail")
  }

  #[test]
  fn test_unique_id() {
    let used: HashSet<String> =
      ["a", "a-1"].into_iter().map(String::from).collect();
    assert_eq!(unique_id("a", &used), "a-2");
    assert_eq!(unique_id("b", &used), "b");
  }

  #[test]
  fn test_links_are_classified() {
    let staged =
      stage("[ext](https://example.com) [anchor](#top) [page](setup.md)");
    assert!(staged.html.contains("class=\"external-link\""));
    assert!(staged.html.contains("target=\"_blank\""));
    assert!(staged.html.contains("class=\"anchor-link\""));
    assert!(staged.html.contains("data-href=\"setup.md\""));
    assert!(staged.html.contains("href=\"javascript:void(0)\""));

    let classes: Vec<_> = staged.links.iter().map(|l| l.classification).collect();
    assert_eq!(classes, vec![
      LinkClass::External,
      LinkClass::Anchor,
      LinkClass::Internal
    ]);
    assert!(staged.links.iter().all(|l| l.resolved_target.is_none()));
  }

  #[test]
  fn test_attachment_link_left_alone() {
    let staged = stage("[[attachment:file.zip]]");
    assert!(staged.html.contains("class=\"attachment-link\""));
    assert!(staged.links.is_empty());
  }

  #[test]
  fn test_math_spans() {
    let staged = stage("Area $x^2$ and\n\n$$\ne = mc^2\n$$\n");
    assert!(
      staged
        .html
        .contains("<span data-math-style=\"inline\">x^2</span>")
    );
    assert!(staged.html.contains("data-math-style=\"display\""));
  }

  #[test]
  fn test_math_disabled_keeps_dollars() {
    let processor = WikiProcessor::new(WikiOptions {
      highlight_code: false,
      math: false,
      ..WikiOptions::default()
    });
    let staged = processor
      .render_structure("Area $x^2$", Path::new("/wiki/a.md"))
      .expect("render");
    assert!(staged.html.contains("$x^2$"));
    assert!(!staged.html.contains("data-math-style"));
  }

  #[test]
  fn test_heading_ids_slug_dedupe_and_fallback() {
    let staged = stage("# Intro\n\n## Intro\n\n## ???\n");
    let ids: Vec<_> = staged.headers.iter().map(|h| h.anchor_id.as_str()).collect();
    assert_eq!(ids, vec!["intro", "intro-1", "heading-2"]);
    assert_eq!(staged.title.as_deref(), Some("Intro"));
    assert!(staged.html.contains("<h2 id=\"heading-2\">"));
  }

  #[test]
  fn test_heading_ids_are_stable() {
    let markdown = "# A\n\n## !!\n\n### A\n";
    assert_eq!(stage(markdown), stage(markdown));
  }

  #[test]
  fn test_positional_ids_when_slugs_disabled() {
    let processor = WikiProcessor::new(WikiOptions {
      highlight_code: false,
      heading_ids: false,
      ..WikiOptions::default()
    });
    let staged = processor
      .render_structure("# One\n\n## Two\n", Path::new("/wiki/a.md"))
      .expect("render");
    let ids: Vec<_> = staged.headers.iter().map(|h| h.anchor_id.as_str()).collect();
    assert_eq!(ids, vec!["heading-0", "heading-1"]);
  }

  #[test]
  fn test_toc_lists_headings_in_order() {
    let staged = stage("[[_TOC_]]\n\n# Top\n\n## Child\n\n# Next\n");
    let toc_start = staged
      .html
      .find("<nav class=\"table-of-contents\">")
      .expect("toc rendered");
    let toc = &staged.html[toc_start..];
    let top = toc.find("#top").expect("top entry");
    let child = toc.find("#child").expect("child entry");
    let next = toc.find("#next").expect("next entry");
    assert!(top < child && child < next);
    assert!(!staged.html.contains("TOC_PLACEHOLDER"));
    assert!(!staged.html.starts_with("<p>"));
  }

  #[test]
  fn test_diagram_containers_collected() {
    let staged = stage(":::mermaid\ngraph TD; A-->B\n:::\n");
    assert_eq!(staged.diagrams, vec![PendingDiagram {
      id:     "mermaid-0".into(),
      source: "graph TD; A-->B".into(),
    }]);
  }

  #[test]
  fn test_image_is_resolved() {
    let staged = stage("![Diagram](img/flow.png)");
    assert!(staged.html.contains("src=\"file:///wiki/guide/img/flow.png\""));
    assert!(staged.html.contains("onerror="));
  }

  #[test]
  fn test_code_blocks_get_hljs_class() {
    let staged = stage("```\nplain\n```\n");
    assert!(staged.html.contains("<pre class=\"hljs\"><code>plain\n</code></pre>"));
  }

  #[test]
  fn test_tosp_flag() {
    assert!(stage("[[_TOSP_]]").needs_tosp);
    assert!(!stage("no subpages").needs_tosp);
  }
}
