//! Syntect-based syntax highlighting backend enhanced with two-face.
//!
//! Uses Sublime Text syntax definitions (TextMate grammars) from two-face's
//! extended set. Output is inline-styled `<span>`s, one highlighted line at a
//! time, without a `<pre>` wrapper.

use std::sync::OnceLock;

use syntect::{
  easy::HighlightLines,
  highlighting::{Theme, ThemeSet},
  html::{IncludeBackground, styled_line_to_highlighted_html},
  parsing::SyntaxSet,
  util::LinesWithEndings,
};
use two_face::theme::{EmbeddedLazyThemeSet, EmbeddedThemeName};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager},
};

const DEFAULT_THEME: &str = "InspiredGitHub";

/// Two-face themes addressable by name.
const EMBEDDED_THEMES: &[(&str, EmbeddedThemeName)] = &[
  ("Dracula", EmbeddedThemeName::Dracula),
  ("Github", EmbeddedThemeName::Github),
  ("GruvboxDark", EmbeddedThemeName::GruvboxDark),
  ("GruvboxLight", EmbeddedThemeName::GruvboxLight),
  ("MonokaiExtended", EmbeddedThemeName::MonokaiExtended),
  ("Nord", EmbeddedThemeName::Nord),
  ("OneHalfDark", EmbeddedThemeName::OneHalfDark),
  ("OneHalfLight", EmbeddedThemeName::OneHalfLight),
  ("SolarizedDark", EmbeddedThemeName::SolarizedDark),
  ("SolarizedLight", EmbeddedThemeName::SolarizedLight),
  ("TwoDark", EmbeddedThemeName::TwoDark),
  ("VisualStudioDarkPlus", EmbeddedThemeName::VisualStudioDarkPlus),
];

/// Syntect-based syntax highlighter
#[derive(Debug, Clone)]
pub struct SyntectHighlighter {
  theme_name: String,
}

impl SyntectHighlighter {
  #[must_use]
  pub fn new(theme_name: Option<String>) -> Self {
    Self {
      theme_name: theme_name.unwrap_or_else(|| DEFAULT_THEME.to_string()),
    }
  }

  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }

  fn theme_set() -> &'static EmbeddedLazyThemeSet {
    static THEME_SET: OnceLock<EmbeddedLazyThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(two_face::theme::extra)
  }

  fn default_theme_set() -> &'static ThemeSet {
    static DEFAULT_THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    DEFAULT_THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  fn get_theme(&self, theme_name: Option<&str>) -> &'static Theme {
    let name = theme_name.unwrap_or(&self.theme_name);
    let defaults = Self::default_theme_set();

    if let Some(theme) = defaults.themes.get(name) {
      return theme;
    }
    if let Some((_, embedded)) = EMBEDDED_THEMES
      .iter()
      .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
    {
      return Self::theme_set().get(*embedded);
    }

    log::debug!("Unknown highlight theme '{name}', using {DEFAULT_THEME}");
    defaults
      .themes
      .get(DEFAULT_THEME)
      .unwrap_or_else(|| Self::theme_set().get(EmbeddedThemeName::InspiredGithub))
  }
}

impl Default for SyntectHighlighter {
  fn default() -> Self {
    Self::new(None)
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn available_themes(&self) -> Vec<String> {
    let mut themes: Vec<String> =
      Self::default_theme_set().themes.keys().cloned().collect();
    themes.extend(EMBEDDED_THEMES.iter().map(|(name, _)| (*name).to_string()));
    themes.sort();
    themes.dedup();
    themes
  }

  fn highlight(
    &self,
    code: &str,
    language: &str,
    theme: Option<&str>,
  ) -> SyntaxResult<String> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, self.get_theme(theme));

    let mut html = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
      let regions = highlighter
        .highlight_line(line, syntax_set)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
      let line_html =
        styled_line_to_highlighted_html(&regions, IncludeBackground::No)
          .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
      html.push_str(&line_html);
    }
    Ok(html)
  }
}

/// Create a Syntect-based syntax manager.
#[must_use]
pub fn create_syntect_manager() -> SyntaxManager {
  let highlighter = Box::new(SyntectHighlighter::default());
  let config = SyntaxConfig {
    default_theme: Some(DEFAULT_THEME.to_string()),
    ..SyntaxConfig::default()
  };
  SyntaxManager::new(highlighter, config)
}
