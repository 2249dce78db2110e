//! # wikiview-commonmark - Azure DevOps wiki rendering
//!
//! Renders a tree of interlinked markdown documents written in the Azure
//! DevOps wiki dialect into navigable HTML. References are resolved against
//! the filesystem the documents live on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wikiview_commonmark::{Document, WikiOptions, WikiProcessor};
//!
//! # async fn run() {
//! let processor = WikiProcessor::new(WikiOptions::default());
//! let document = Document::new(
//!   "/wiki/guide/intro.md",
//!   "[[_TOC_]]\n\n# Intro\n\nSee [[Getting Started]].",
//! );
//! let output = processor.render(&document).await;
//!
//! println!("HTML: {}", output.html);
//! println!("Broken links: {}", output.broken_links().count());
//! # }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Macro expansion** ([`macros`]): `[[_TOC_]]`, `[[_TOSP_]]`, wiki links,
//!    mentions, work items, attachments, `:::mermaid` blocks and emoji
//!    shortcodes become markdown, placeholders or inert HTML.
//! 2. **Structural render** ([`processor`]): comrak renders the markdown;
//!    links are classified, images resolved, headings given ids and code
//!    highlighted, and the table of contents is materialized.
//! 3. **Enrichment** ([`enrich`]): the table of subpages is listed, internal
//!    links are checked for existence and diagrams are rendered.
//! 4. **Interaction** ([`binder`], [`view`]): clicks on the output are
//!    dispatched to the host, and a view only ever shows its newest render.
//!
//! ## Configuration
//!
//! ```rust
//! use wikiview_commonmark::{WikiOptionsBuilder, WikiProcessor};
//!
//! let options = WikiOptionsBuilder::new()
//!   .smart_punctuation(false)
//!   .highlight_code(false)
//!   .index_names(["index", "readme", "home"])
//!   .build();
//!
//! let processor = WikiProcessor::new(options);
//! ```
pub mod binder;
pub(crate) mod dom;
pub mod enrich;
pub mod error;
pub mod links;
pub mod macros;
pub mod processor;
pub mod resolve;
pub mod syntax;
mod types;
pub mod utils;
pub mod view;

pub use crate::{
  binder::{AnchorClick, Binding, ClickOutcome, Host},
  enrich::{DiagramRenderer, RenderedDiagram, SiblingEntry},
  error::{
    DiagramError,
    DirectoryListError,
    RenderFatalError,
    ResolutionError,
  },
  links::classify,
  macros::{MacroRule, Preprocessor, preprocess},
  processor::{
    DefaultOverrides,
    ImageAttrs,
    LinkAttrs,
    RenderContext,
    RenderOverrides,
    WikiOptions,
    WikiOptionsBuilder,
    WikiProcessor,
  },
  resolve::{FileSystem, LocalFileSystem, PathResolver, Resolved},
  types::{
    DiagramOutcome,
    DiagramStatus,
    Document,
    Link,
    LinkClass,
    LinkStatus,
    RenderOutput,
    TocEntry,
  },
  view::{ContentView, LoadOutcome, RenderTicket, Superseded, load_document},
};
