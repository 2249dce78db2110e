use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, bail, eyre};
use log::{info, warn};
use wikiview_commonmark::{
  AnchorClick,
  ClickOutcome,
  ContentView,
  Host,
  LoadOutcome,
  WikiProcessor,
  classify,
  load_document,
};

use crate::host::CliHost;

async fn load(
  view: &ContentView,
  processor: &WikiProcessor,
  host: &Arc<CliHost>,
  path: &Path,
) -> Result<()> {
  let host = Arc::clone(host) as Arc<dyn Host>;
  match load_document(view, processor, host, path).await {
    LoadOutcome::Loaded => Ok(()),
    LoadOutcome::Superseded => {
      Err(eyre!("Load of {} was superseded", path.display()))
    },
    LoadOutcome::Failed(e) => Err(e.into()),
  }
}

/// Load `file` into `view`, click `href` in it, and load whatever the click
/// navigated to.
///
/// # Errors
///
/// Returns an error if `file` or the link's target cannot be loaded.
pub async fn follow(
  view: &ContentView,
  processor: &WikiProcessor,
  host: &Arc<CliHost>,
  file: &Path,
  href: &str,
) -> Result<ClickOutcome> {
  load(view, processor, host, file).await?;
  let binding = view
    .current()
    .ok_or_else(|| eyre!("No document installed for {}", file.display()))?
    .binding;

  let outcome = binding
    .dispatch(&AnchorClick::new(classify(href), href))
    .await;

  if let ClickOutcome::Navigated { fragment, .. } = &outcome {
    for requested in host.take_requested() {
      load(view, processor, host, &requested).await?;
    }
    if let Some(fragment) = fragment
      && let Some(current) = view.current()
    {
      if current.output.has_element_id(fragment) {
        host.scroll_into_view(fragment);
      } else {
        warn!("No element '#{fragment}' in {}", current.path.display());
      }
    }
  }

  Ok(outcome)
}

/// Follow `href` from `file` and report where it led.
///
/// # Errors
///
/// Returns an error if either document cannot be loaded or the link is
/// broken.
pub async fn run(
  processor: &WikiProcessor,
  open_external: bool,
  file: &Path,
  href: &str,
  dry_run: bool,
) -> Result<()> {
  let view = ContentView::new();
  let host = Arc::new(CliHost::new(open_external && !dry_run));

  match follow(&view, processor, &host, file, href).await? {
    ClickOutcome::OpenedExternal(url) => info!("External link: {url}"),
    ClickOutcome::ScrolledTo(id) => info!("Same document, anchor #{id}"),
    ClickOutcome::AnchorMissing(id) => {
      bail!("No element '#{id}' in {}", file.display())
    },
    ClickOutcome::Navigated { path, .. } => {
      let title = view
        .current()
        .and_then(|installed| installed.output.title.clone())
        .unwrap_or_else(|| "untitled".to_string());
      info!("Navigated to {} ('{title}')", path.display());
    },
    ClickOutcome::NotFound(href) => bail!("File not found: {href}"),
    ClickOutcome::Ignored => info!("Nothing to follow for '{href}'"),
    ClickOutcome::Detached => bail!("Document was replaced during the click"),
  }
  Ok(())
}
