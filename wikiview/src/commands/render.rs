use std::path::Path;

use color_eyre::eyre::{Context, Result, bail};
use log::{info, warn};
use wikiview_commonmark::{DiagramStatus, RenderOutput, WikiProcessor};

/// Render `file` and write the HTML (or the whole [`RenderOutput`] as JSON)
/// to `output` or stdout.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the output cannot be
/// written, or the markdown compiler failed. In the last case the error
/// panel is still written.
pub async fn run(
  processor: &WikiProcessor,
  file: &Path,
  output: Option<&Path>,
  json: bool,
) -> Result<()> {
  let rendered = processor
    .render_file(file)
    .await
    .wrap_err_with(|| format!("Failed to open {}", file.display()))?;

  report(file, &rendered);

  let content = if json {
    serde_json::to_string_pretty(&rendered)
      .wrap_err("Failed to serialize render output")?
  } else {
    rendered.html.clone()
  };
  super::write_output(output, &content)?;

  if let Some(fatal) = rendered.fatal {
    bail!("Failed to render {}: {fatal}", file.display());
  }
  Ok(())
}

/// Log what went wrong inside a render without failing it.
pub fn report(file: &Path, rendered: &RenderOutput) {
  if let Some(title) = &rendered.title {
    info!("Rendered '{title}' from {}", file.display());
  }
  for link in rendered.broken_links() {
    warn!("{}: broken link '{}'", file.display(), link.raw_href);
  }
  for diagram in &rendered.diagrams {
    if let DiagramStatus::Failed { message } = &diagram.status {
      warn!("{}: diagram {} failed: {message}", file.display(), diagram.id);
    }
  }
}
