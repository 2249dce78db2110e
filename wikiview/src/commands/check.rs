use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use wikiview_commonmark::{DiagramStatus, WikiProcessor, utils};
use wikiview_config::Config;

/// An internal link whose target does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
  pub document: PathBuf,
  pub href:     String,
}

/// Outcome of checking every document of a wiki.
#[derive(Debug, Default)]
pub struct CheckReport {
  /// Documents rendered.
  pub documents:       usize,
  pub broken:          Vec<BrokenLink>,
  /// Documents that could not be read.
  pub unreadable:      Vec<PathBuf>,
  /// Documents the markdown compiler failed on.
  pub fatal:           Vec<PathBuf>,
  pub failed_diagrams: usize,
}

impl CheckReport {
  #[must_use]
  pub fn is_clean(&self) -> bool {
    self.broken.is_empty() && self.unreadable.is_empty() && self.fatal.is_empty()
  }
}

fn progress_bar(len: usize) -> ProgressBar {
  let bar = ProgressBar::new(len as u64);
  bar.set_style(
    ProgressStyle::with_template(
      "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> "),
  );
  bar
}

/// Render every markdown document below `root`.
pub async fn check_wiki(
  processor: &WikiProcessor,
  root: &Path,
  progress: &ProgressBar,
) -> CheckReport {
  let files =
    utils::collect_markdown_files(root, &processor.options().markdown_extensions);
  progress.set_length(files.len() as u64);

  let mut report = CheckReport::default();
  for file in files {
    progress.set_message(file.strip_prefix(root).unwrap_or(&file).display().to_string());

    match processor.render_file(&file).await {
      Ok(rendered) => {
        report.documents += 1;
        if rendered.fatal.is_some() {
          report.fatal.push(file.clone());
        }
        report.failed_diagrams += rendered
          .diagrams
          .iter()
          .filter(|d| matches!(d.status, DiagramStatus::Failed { .. }))
          .count();
        report
          .broken
          .extend(rendered.broken_links().map(|link| BrokenLink {
            document: file.clone(),
            href:     link.raw_href.clone(),
          }));
      },
      Err(e) => {
        warn!("{e}");
        report.unreadable.push(file);
      },
    }
    progress.inc(1);
  }
  progress.finish_and_clear();

  report
}

/// Check the wiki at `dir`, falling back to the configured `wiki_root` and
/// then the working directory.
///
/// # Errors
///
/// Returns an error if the directory does not exist or the wiki has broken
/// links, unreadable documents or documents that fail to compile.
pub async fn run(
  processor: &WikiProcessor,
  config: &Config,
  dir: Option<&Path>,
) -> Result<()> {
  let root = dir
    .or(config.wiki_root.as_deref())
    .unwrap_or_else(|| Path::new("."));
  if !root.is_dir() {
    bail!("Wiki directory does not exist: {}", root.display());
  }

  match processor.resolver().find_root_document(root).await {
    Some(index) => info!("Checking wiki rooted at {}", index.display()),
    None => warn!("No index or README document in {}", root.display()),
  }

  let report = check_wiki(processor, root, &progress_bar(0)).await;

  for broken in &report.broken {
    warn!("{}: broken link '{}'", broken.document.display(), broken.href);
  }
  for file in &report.fatal {
    warn!("{}: markdown compiler failed", file.display());
  }
  if report.failed_diagrams > 0 {
    warn!("{} diagrams failed to render", report.failed_diagrams);
  }

  info!(
    "Checked {} documents: {} broken links",
    report.documents,
    report.broken.len()
  );

  if !report.is_clean() {
    bail!(
      "{} broken links, {} unreadable and {} failed documents",
      report.broken.len(),
      report.unreadable.len(),
      report.fatal.len()
    );
  }
  Ok(())
}
