use std::{
  fs,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use wikiview_commonmark::WikiOptions;

use crate::{diagrams::DiagramsConfig, error::ConfigError};

/// Config file names looked up in the working directory, in order.
const CONFIG_FILENAMES: [&str; 5] = [
  "wikiview.toml",
  ".wikiview.toml",
  "wikiview.json",
  ".wikiview.json",
  ".config/wikiview.toml",
];

/// Configuration for the wikiview renderer.
///
/// [`Config`] holds everything a host can tune: markdown extensions, the wiki
/// dialect's file naming rules, highlighting, diagram rendering and the
/// worker count. Fields are typically loaded from a TOML or JSON config file
/// and patched with `--config KEY=VALUE` flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct Config {
  /// Wiki directory used when a command is not given one.
  pub wiki_root: Option<PathBuf>,

  /// Number of worker threads.
  pub jobs: Option<usize>,

  /// Tables, strikethrough, task lists, autolinks and footnotes.
  pub gfm: bool,

  /// Typographic quotes and dashes.
  pub smart_punctuation: bool,

  /// `$…$` and `$$…$$` TeX math.
  pub math: bool,

  /// Slug-based heading ids.
  pub heading_ids: bool,

  /// Whether to enable syntax highlighting for code blocks.
  pub highlight_code: bool,

  /// Syntax highlighting theme.
  pub highlight_theme: Option<String>,

  /// File extensions treated as wiki documents, without the dot.
  pub markdown_extensions: Vec<String>,

  /// Extension appended to wiki links and extensionless references.
  pub canonical_extension: String,

  /// File stems never listed in a table of subpages.
  pub index_names: Vec<String>,

  /// Open external links with the system browser.
  pub open_external: bool,

  /// Server-side diagram rendering.
  pub diagrams: Option<DiagramsConfig>,
}

impl Default for Config {
  fn default() -> Self {
    let options = WikiOptions::default();
    Self {
      wiki_root:           None,
      jobs:                None,
      gfm:                 options.gfm,
      smart_punctuation:   options.smart_punctuation,
      math:                options.math,
      heading_ids:         options.heading_ids,
      highlight_code:      true,
      highlight_theme:     None,
      markdown_extensions: options.markdown_extensions,
      canonical_extension: options.canonical_extension,
      index_names:         options.index_names,
      open_external:       true,
      diagrams:            None,
    }
  }
}

/// Parse a boolean override value.
pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_lowercase().as_str() {
    "true" | "yes" | "1" => Ok(true),
    "false" | "no" | "0" => Ok(false),
    _ => {
      Err(ConfigError::Config(format!(
        "Invalid boolean value for '{key}': '{value}'. Expected true/false, \
         yes/no, or 1/0"
      )))
    },
  }
}

fn parse_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}

fn non_empty(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_string())
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to read config file: {}: {}",
        path.display(),
        e
      ))
    })?;

    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
      return Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )));
    };

    match ext.to_lowercase().as_str() {
      "json" => {
        serde_json::from_str(&content).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to parse JSON config from {}: {}",
            path.display(),
            e
          ))
        })
      },
      "toml" => {
        toml::from_str(&content).map_err(|e| {
          ConfigError::Config(format!(
            "Failed to parse TOML config from {}: {}",
            path.display(),
            e
          ))
        })
      },
      _ => {
        Err(ConfigError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from config files and `KEY=VALUE` overrides.
  ///
  /// Explicit files are merged in order. Without any, a config file is
  /// looked up in the working directory; failing that the defaults apply.
  /// Overrides are applied last.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded, an override is invalid, or
  /// the resulting configuration does not validate.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged_config = Self::from_file(first)?;
      for config_path in rest {
        merged_config.merge(Self::from_file(config_path)?);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged_config
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      Self::from_file(&discovered_config)?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    config.validate()?;
    Ok(config)
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// Nested tables use dotted keys, e.g. `diagrams.enable=true`. List values
  /// are comma separated and replace the configured list.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  ///
  /// - An override string is not in KEY=VALUE format
  /// - A key is not recognized
  /// - A value cannot be parsed as the expected type
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override.
  ///
  /// # Errors
  ///
  /// Returns an error if the key is unknown or the value does not parse.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    if let Some(nested) = key.strip_prefix("diagrams.") {
      return self
        .diagrams
        .get_or_insert_with(DiagramsConfig::default)
        .apply_override(nested, value);
    }

    match key {
      "wiki_root" => self.wiki_root = non_empty(value).map(PathBuf::from),
      "jobs" => {
        self.jobs = if value.is_empty() {
          None
        } else {
          Some(value.parse().map_err(|_| {
            ConfigError::Config(format!(
              "Invalid value for '{key}': '{value}'. Expected a positive \
               integer"
            ))
          })?)
        };
      },
      "gfm" => self.gfm = parse_bool(key, value)?,
      "smart_punctuation" => self.smart_punctuation = parse_bool(key, value)?,
      "math" => self.math = parse_bool(key, value)?,
      "heading_ids" => self.heading_ids = parse_bool(key, value)?,
      "highlight_code" => self.highlight_code = parse_bool(key, value)?,
      "open_external" => self.open_external = parse_bool(key, value)?,
      "highlight_theme" => self.highlight_theme = non_empty(value),
      "canonical_extension" => {
        self.canonical_extension = value.trim_start_matches('.').to_string();
      },
      "markdown_extensions" => self.markdown_extensions = parse_list(value),
      "index_names" => self.index_names = parse_list(value),
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: '{key}'. See documentation for \
           supported keys."
        )));
      },
    }
    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - [`Vec<T>`] fields: Other's entries not already present are appended
  /// - Plain fields (String, bool, etc.): Other's value always replaces
  pub fn merge(&mut self, other: Self) {
    fn extend_unique(into: &mut Vec<String>, from: Vec<String>) {
      for item in from {
        if !into.contains(&item) {
          into.push(item);
        }
      }
    }

    if other.wiki_root.is_some() {
      self.wiki_root = other.wiki_root;
    }
    if other.jobs.is_some() {
      self.jobs = other.jobs;
    }
    if other.highlight_theme.is_some() {
      self.highlight_theme = other.highlight_theme;
    }
    if other.diagrams.is_some() {
      self.diagrams = other.diagrams;
    }

    self.gfm = other.gfm;
    self.smart_punctuation = other.smart_punctuation;
    self.math = other.math;
    self.heading_ids = other.heading_ids;
    self.highlight_code = other.highlight_code;
    self.open_external = other.open_external;
    self.canonical_extension = other.canonical_extension;

    extend_unique(&mut self.markdown_extensions, other.markdown_extensions);
    extend_unique(&mut self.index_names, other.index_names);
  }

  /// Check values that deserialize fine but cannot work.
  ///
  /// # Errors
  ///
  /// Returns an error describing every invalid value.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if self.canonical_extension.is_empty() {
      errors.push("canonical_extension must not be empty".to_string());
    }
    if self.markdown_extensions.is_empty() {
      errors.push("markdown_extensions must list at least one extension".to_string());
    } else if !self
      .markdown_extensions
      .iter()
      .any(|ext| ext.eq_ignore_ascii_case(&self.canonical_extension))
    {
      errors.push(format!(
        "canonical_extension '{}' is not one of markdown_extensions",
        self.canonical_extension
      ));
    }
    if self.jobs == Some(0) {
      errors.push("jobs must be at least 1".to_string());
    }
    if let Some(ref diagrams) = self.diagrams
      && diagrams.enable
      && diagrams.kroki_url.is_empty()
    {
      errors.push("diagrams.kroki_url must be set when diagrams are enabled".to_string());
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ConfigError::Config(format!(
        "Configuration validation failed:\n{}",
        errors.join("\n")
      )))
    }
  }

  /// Diagram settings, defaulted when the table is absent.
  #[must_use]
  pub fn diagrams(&self) -> DiagramsConfig {
    self.diagrams.clone().unwrap_or_default()
  }

  /// The immutable pipeline configuration described by this config.
  #[must_use]
  pub fn pipeline_options(&self) -> WikiOptions {
    WikiOptions {
      gfm:                 self.gfm,
      smart_punctuation:   self.smart_punctuation,
      math:                self.math,
      heading_ids:         self.heading_ids,
      highlight_code:      self.highlight_code,
      highlight_theme:     self.highlight_theme.clone(),
      markdown_extensions: self.markdown_extensions.clone(),
      canonical_extension: self.canonical_extension.clone(),
      index_names:         self.index_names.clone(),
    }
  }

  /// Search for a config file in the working directory.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    Self::find_config_file_in(&current_dir)
  }

  /// Search for a config file in `dir`.
  #[must_use]
  pub fn find_config_file_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
      .iter()
      .map(|filename| dir.join(filename))
      .find(|path| path.is_file())
  }

  /// Write a default configuration file with commented explanations.
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)
      .map_err(|e| ConfigError::Template(e.to_string()))?;

    fs::write(path, config_content).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {}",
        path.display(),
        e
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  #![allow(
    clippy::unwrap_used,
    clippy::field_reassign_with_default,
    reason = "Fine in tests"
  )]

  use super::*;

  fn overrides(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
  }

  #[test]
  fn test_default_matches_pipeline_defaults() {
    let options = Config::default().pipeline_options();
    let defaults = WikiOptions::default();
    assert_eq!(options.markdown_extensions, defaults.markdown_extensions);
    assert_eq!(options.canonical_extension, defaults.canonical_extension);
    assert_eq!(options.index_names, defaults.index_names);
    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn test_config_merge_option_fields() {
    let mut base = Config::default();
    base.wiki_root = Some(PathBuf::from("base-wiki"));
    base.jobs = None;

    let mut other = Config::default();
    other.wiki_root = None;
    other.jobs = Some(3);

    base.merge(other);

    assert_eq!(base.wiki_root, Some(PathBuf::from("base-wiki")));
    assert_eq!(base.jobs, Some(3));
  }

  #[test]
  fn test_config_merge_vec_fields_append() {
    let mut base = Config::default();
    let mut other = Config::default();
    other.markdown_extensions = vec!["mdx".to_string()];
    other.index_names = vec!["home".to_string()];

    base.merge(other);

    assert_eq!(base.markdown_extensions, vec!["md", "markdown", "mdx"]);
    assert_eq!(base.index_names, vec!["index", "readme", "home"]);
  }

  #[test]
  fn test_config_merge_boolean_fields() {
    let mut base = Config::default();
    let mut other = Config::default();
    other.smart_punctuation = false;

    base.merge(other);

    assert!(!base.smart_punctuation);
    assert!(base.gfm);
  }

  #[test]
  fn test_apply_overrides() {
    let mut config = Config::default();
    config
      .apply_overrides(&overrides(&[
        "gfm=no",
        "math=false",
        "jobs=8",
        "highlight_theme=Nord",
        "canonical_extension=.markdown",
        "index_names=index, home",
        "wiki_root=/srv/wiki",
      ]))
      .unwrap();

    assert!(!config.gfm);
    assert!(!config.math);
    assert!(!config.pipeline_options().math);
    assert_eq!(config.jobs, Some(8));
    assert_eq!(config.highlight_theme.as_deref(), Some("Nord"));
    assert_eq!(config.canonical_extension, "markdown");
    assert_eq!(config.index_names, vec!["index", "home"]);
    assert_eq!(config.wiki_root, Some(PathBuf::from("/srv/wiki")));

    config.apply_overrides(&overrides(&["jobs=", "highlight_theme="])).unwrap();
    assert_eq!(config.jobs, None);
    assert_eq!(config.highlight_theme, None);
  }

  #[test]
  fn test_apply_override_creates_nested_config() {
    let mut config = Config::default();
    assert!(config.diagrams.is_none());

    config
      .apply_overrides(&overrides(&[
        "diagrams.enable=true",
        "diagrams.kroki_url=http://localhost:8000/",
      ]))
      .unwrap();

    let diagrams = config.diagrams();
    assert!(diagrams.enable);
    assert_eq!(diagrams.kroki_url, "http://localhost:8000");
    assert_eq!(diagrams.timeout_secs, 10);
  }

  #[test]
  fn test_apply_overrides_errors() {
    let mut config = Config::default();

    let err = config.apply_overrides(&overrides(&["no_equals_sign"]));
    assert!(err.unwrap_err().to_string().contains("Expected KEY=VALUE"));

    let err = config.apply_overrides(&overrides(&["unknown_key=value"]));
    assert!(
      err
        .unwrap_err()
        .to_string()
        .contains("Unknown configuration key")
    );

    let err = config.apply_overrides(&overrides(&["gfm=maybe"]));
    assert!(err.unwrap_err().to_string().contains("Invalid boolean"));

    let err = config.apply_overrides(&overrides(&["jobs=many"]));
    assert!(err.unwrap_err().to_string().contains("Invalid value"));

    let err = config.apply_overrides(&overrides(&["diagrams.nope=1"]));
    assert!(err.unwrap_err().to_string().contains("diagrams.nope"));
  }

  #[test]
  fn test_validate_rejects_unknown_canonical_extension() {
    let mut config = Config::default();
    config.canonical_extension = "txt".to_string();
    config.jobs = Some(0);

    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("canonical_extension 'txt'"));
    assert!(message.contains("jobs must be at least 1"));
  }

  #[test]
  fn test_templates_parse_to_defaults() {
    let from_toml: Config =
      toml::from_str(crate::templates::DEFAULT_TOML_TEMPLATE).unwrap();
    let from_json: Config =
      serde_json::from_str(crate::templates::DEFAULT_JSON_TEMPLATE).unwrap();

    let mut expected = Config::default();
    expected.diagrams = Some(DiagramsConfig::default());
    assert_eq!(from_toml, expected);
    assert_eq!(from_json, expected);
  }
}
