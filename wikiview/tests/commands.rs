use std::{fs, sync::Arc};

use indicatif::ProgressBar;
use tempfile::TempDir;
use wikiview::{
  commands::{self, check::BrokenLink},
  host::CliHost,
};
use wikiview_commonmark::{ClickOutcome, ContentView, RenderOutput, WikiProcessor};
use wikiview_config::Config;

fn processor() -> WikiProcessor {
  let config = Config {
    highlight_code: false,
    ..Config::default()
  };
  commands::build_processor(&config)
}

fn wiki() -> TempDir {
  let dir = tempfile::tempdir().expect("tempdir");
  let root = dir.path();
  fs::create_dir_all(root.join("guide")).expect("mkdir");
  fs::write(
    root.join("index.md"),
    "# Home\n\nStart with [[Guide Intro]] or [the guide](guide/intro.md).",
  )
  .expect("write");
  fs::write(root.join("Guide-Intro.md"), "# Guide Intro\n\n[[_TOSP_]]")
    .expect("write");
  fs::write(
    root.join("guide/intro.md"),
    "# Intro\n\n## Install\n\nSee [setup](setup#steps), [gone](missing.md) \
     and [docs](https://example.com).",
  )
  .expect("write");
  fs::write(root.join("guide/setup.md"), "# Setup\n\n## Steps").expect("write");
  dir
}

#[tokio::test]
async fn test_check_reports_broken_links_per_document() {
  let dir = wiki();
  let report =
    commands::check::check_wiki(&processor(), dir.path(), &ProgressBar::hidden())
      .await;

  assert_eq!(report.documents, 4);
  assert_eq!(report.broken, vec![BrokenLink {
    document: dir.path().join("guide/intro.md"),
    href:     "missing.md".to_string(),
  }]);
  assert!(report.unreadable.is_empty());
  assert!(!report.is_clean());
}

#[tokio::test]
async fn test_check_fails_on_broken_wikis_only() {
  let dir = wiki();
  let config = Config::default();
  let err = commands::check::run(&processor(), &config, Some(dir.path()))
    .await
    .expect_err("one link is broken");
  assert!(err.to_string().contains("1 broken links"));

  fs::write(dir.path().join("guide/missing.md"), "# Found").expect("write");
  commands::check::run(&processor(), &config, Some(dir.path()))
    .await
    .expect("wiki is clean now");
}

#[tokio::test]
async fn test_check_requires_an_existing_directory() {
  let dir = wiki();
  let err = commands::check::run(
    &processor(),
    &Config::default(),
    Some(&dir.path().join("nope")),
  )
  .await
  .expect_err("missing directory");
  assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_render_writes_html_and_json() {
  let dir = wiki();
  let html_out = dir.path().join("out/intro.html");
  let json_out = dir.path().join("out/intro.json");
  let intro = dir.path().join("guide/intro.md");

  commands::render::run(&processor(), &intro, Some(&html_out), false)
    .await
    .expect("renders");
  let html = fs::read_to_string(&html_out).expect("html written");
  assert!(html.contains("<h2 id=\"install\">"));
  assert!(html.contains("broken-link"));

  commands::render::run(&processor(), &intro, Some(&json_out), true)
    .await
    .expect("renders");
  let output: RenderOutput =
    serde_json::from_str(&fs::read_to_string(&json_out).expect("json written"))
      .expect("valid json");
  assert_eq!(output.title.as_deref(), Some("Intro"));
  assert_eq!(output.broken_links().count(), 1);
}

#[tokio::test]
async fn test_render_fails_for_missing_files() {
  let dir = wiki();
  let err = commands::render::run(
    &processor(),
    &dir.path().join("absent.md"),
    Some(&dir.path().join("absent.html")),
    false,
  )
  .await
  .expect_err("nothing to render");
  assert!(err.to_string().contains("Failed to open"));
  assert!(!dir.path().join("absent.html").exists());
}

#[tokio::test]
async fn test_follow_navigates_and_scrolls_to_fragment() {
  let dir = wiki();
  let view = ContentView::new();
  let host = Arc::new(CliHost::new(false));
  let intro = dir.path().join("guide/intro.md");

  let outcome =
    commands::follow::follow(&view, &processor(), &host, &intro, "setup#steps")
      .await
      .expect("follows");

  assert_eq!(outcome, ClickOutcome::Navigated {
    path:     dir.path().join("guide/setup.md"),
    fragment: Some("steps".to_string()),
  });
  assert_eq!(view.current_path(), Some(dir.path().join("guide/setup.md")));
  assert_eq!(host.scrolled(), vec!["steps"]);
}

#[tokio::test]
async fn test_follow_wiki_links_by_their_rendered_target() {
  let dir = wiki();
  let view = ContentView::new();
  let host = Arc::new(CliHost::new(false));

  let outcome = commands::follow::follow(
    &view,
    &processor(),
    &host,
    &dir.path().join("index.md"),
    "Guide-Intro.md",
  )
  .await
  .expect("follows");

  assert!(matches!(outcome, ClickOutcome::Navigated { .. }));
  let current = view.current().expect("installed");
  assert_eq!(current.output.title.as_deref(), Some("Guide Intro"));
}

#[tokio::test]
async fn test_follow_reports_external_and_missing_links() {
  let dir = wiki();
  let intro = dir.path().join("guide/intro.md");

  commands::follow::run(&processor(), true, &intro, "https://example.com", true)
    .await
    .expect("dry run never opens anything");
  commands::follow::run(&processor(), false, &intro, "#install", false)
    .await
    .expect("anchor exists");

  let err = commands::follow::run(&processor(), false, &intro, "missing.md", false)
    .await
    .expect_err("target is missing");
  assert!(err.to_string().contains("File not found: missing.md"));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("conf/wikiview.json");

  commands::init::run(&path, "json", false).expect("created");
  let config = Config::from_file(&path).expect("valid config");
  assert_eq!(config.pipeline_options(), Config::default().pipeline_options());

  let err = commands::init::run(&path, "json", false).expect_err("exists");
  assert!(err.to_string().contains("--force"));
  commands::init::run(&path, "json", true).expect("forced");
}

#[test]
fn test_processor_follows_configuration() {
  let config = Config {
    highlight_code: false,
    index_names: vec!["home".to_string()],
    ..Config::default()
  };
  let processor = commands::build_processor(&config);
  assert_eq!(processor.options().index_names, vec!["home"]);
  assert!(!processor.options().highlight_code);
}
