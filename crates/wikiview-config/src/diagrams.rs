use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for server-side diagram rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
  /// Whether `:::mermaid` blocks are sent to the Kroki server. When disabled
  /// they are left in place for a client-side renderer.
  pub enable: bool,

  /// Base URL of the Kroki server.
  pub kroki_url: String,

  /// Request timeout in seconds.
  pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
  fn default() -> Self {
    Self {
      enable:       false,
      kroki_url:    "https://kroki.io".to_string(),
      timeout_secs: 10,
    }
  }
}

impl DiagramsConfig {
  /// Apply a single `diagrams.<key>` override.
  ///
  /// # Errors
  ///
  /// Returns an error if the key is unknown or the value does not parse.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    match key {
      "enable" => self.enable = crate::config::parse_bool(key, value)?,
      "kroki_url" => self.kroki_url = value.trim_end_matches('/').to_string(),
      "timeout_secs" => {
        self.timeout_secs = value.parse().map_err(|_| {
          ConfigError::Config(format!(
            "Invalid value for 'diagrams.{key}': '{value}'. Expected a \
             non-negative integer"
          ))
        })?;
      },
      _ => {
        return Err(ConfigError::Config(format!(
          "Unknown configuration key: 'diagrams.{key}'"
        )));
      },
    }
    Ok(())
  }
}
