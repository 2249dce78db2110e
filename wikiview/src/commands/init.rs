use std::{fs, path::Path};

use color_eyre::eyre::{Context, Result, bail};
use log::info;
use wikiview_config::Config;

/// Write a default configuration file.
///
/// # Errors
///
/// Returns an error if `output` exists and `force` is not set, or if the file
/// cannot be created.
pub fn run(output: &Path, format: &str, force: bool) -> Result<()> {
  // Check if file already exists and that we're not forcing overwrite
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  if let Some(parent) = output.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
    info!("Created directory: {}", parent.display());
  }

  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!(
    "Configuration file created successfully. Edit it to customize how your \
     wiki is rendered."
  );
  Ok(())
}
