use color_eyre::eyre::{Context, Result};
use log::{LevelFilter, debug};
use wikiview::{
  cli::{Cli, Commands},
  commands,
};
use wikiview_config::Config;

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  // Init must work without a valid configuration to load
  if let Commands::Init {
    output,
    format,
    force,
  } = &cli.command
  {
    return commands::init::run(output, format, *force);
  }

  let config = Config::load(&cli.config_files, &cli.config_overrides)?;

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get);
  debug!("Using {thread_count} worker threads");
  let runtime = tokio::runtime::Builder::new_multi_thread()
    .worker_threads(thread_count)
    .enable_all()
    .build()
    .wrap_err("Failed to start the async runtime")?;

  runtime.block_on(run(cli.command, &config))
}

async fn run(command: Commands, config: &Config) -> Result<()> {
  let processor = commands::build_processor(config);

  match command {
    Commands::Render { file, output, json } => {
      commands::render::run(&processor, &file, output.as_deref(), json).await
    },
    Commands::Check { dir } => {
      commands::check::run(&processor, config, dir.as_deref()).await
    },
    Commands::Follow {
      file,
      href,
      dry_run,
    } => {
      commands::follow::run(
        &processor,
        config.open_external,
        &file,
        &href,
        dry_run,
      )
      .await
    },
    // Handled before the configuration is loaded
    Commands::Init { .. } => Ok(()),
  }
}
