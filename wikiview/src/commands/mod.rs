pub mod check;
pub mod follow;
pub mod init;
pub mod render;

use std::{
  fs,
  io::{self, Write},
  path::Path,
  sync::Arc,
};

use color_eyre::eyre::{Context, Result};
use log::info;
use wikiview_commonmark::WikiProcessor;
use wikiview_config::Config;

use crate::kroki::KrokiRenderer;

/// The pipeline described by `config`, with the Kroki renderer attached when
/// diagrams are enabled.
#[must_use]
pub fn build_processor(config: &Config) -> WikiProcessor {
  let mut processor = WikiProcessor::new(config.pipeline_options());

  let diagrams = config.diagrams();
  if diagrams.enable {
    info!("Rendering diagrams via {}", diagrams.kroki_url);
    processor = processor
      .with_diagram_renderer(Arc::new(KrokiRenderer::from_config(&diagrams)));
  }

  processor
}

/// Write `content` to `output`, or to stdout when no path is given.
///
/// # Errors
///
/// Returns an error if the file or stdout cannot be written.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
  match output {
    Some(path) => {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
      {
        fs::create_dir_all(parent).wrap_err_with(|| {
          format!("Failed to create directory: {}", parent.display())
        })?;
      }
      fs::write(path, content)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
      info!("Wrote {}", path.display());
    },
    None => {
      let mut stdout = io::stdout().lock();
      stdout
        .write_all(content.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .wrap_err("Failed to write to stdout")?;
    },
  }
  Ok(())
}
