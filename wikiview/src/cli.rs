use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for wikiview
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "wikiview: render and check Azure DevOps flavored wikis"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(
    short = 'c',
    long = "config-file",
    global = true,
    action = clap::ArgAction::Append
  )]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the wikiview CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Render one wiki page to HTML.
  Render {
    /// Markdown document to render.
    file: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit the full render result (links, headings, diagrams) as JSON.
    #[arg(long)]
    json: bool,
  },

  /// Render every page below a directory and report broken links.
  Check {
    /// Wiki directory. Defaults to `wiki_root` from the configuration, then
    /// the working directory.
    dir: Option<PathBuf>,
  },

  /// Follow a link of a page the way a click in the viewer would.
  Follow {
    /// Page containing the link.
    file: PathBuf,

    /// The link's reference as written in the page.
    href: String,

    /// Report what would happen without opening external links.
    #[arg(long)]
    dry_run: bool,
  },

  /// Initialize a new wikiview configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "wikiview.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
