use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration in TOML, commented so that a fresh file explains
/// itself.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# wikiview configuration file

# Wiki directory checked by `wikiview check` when no directory is given
# wiki_root = "wiki"

# Number of worker threads (defaults to the number of CPU cores)
# jobs = 4

# Tables, strikethrough, task lists, autolinks and footnotes
gfm = true

# Typographic quotes and dashes
smart_punctuation = true

# TeX math between $ and $$ delimiters
math = true

# Slug-based heading ids; when disabled headings get `heading-<index>` ids
heading_ids = true

# Syntax highlighting for fenced code blocks
highlight_code = true
# highlight_theme = "InspiredGitHub"

# File extensions treated as wiki documents
markdown_extensions = ["md", "markdown"]

# Extension appended to wiki links and extensionless references
canonical_extension = "md"

# File stems never listed in a table of subpages
index_names = ["index", "readme"]

# Open external links with the system browser when following them
open_external = true

# Server-side rendering of :::mermaid blocks through Kroki
[diagrams]
enable = false
kroki_url = "https://kroki.io"
timeout_secs = 10
"#;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "gfm": true,
  "smart_punctuation": true,
  "math": true,
  "heading_ids": true,
  "highlight_code": true,
  "markdown_extensions": ["md", "markdown"],
  "canonical_extension": "md",
  "index_names": ["index", "readme"],
  "open_external": true,
  "diagrams": {
    "enable": false,
    "kroki_url": "https://kroki.io",
    "timeout_secs": 10
  }
}
"#;

/// Get the configuration template for `format`.
///
/// # Errors
///
/// Returns an error if the requested format is not supported.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}
