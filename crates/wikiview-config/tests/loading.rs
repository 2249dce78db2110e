use std::fs;

use wikiview_config::{Config, ConfigError};

#[test]
fn test_loads_toml_and_json_by_extension() {
  let dir = tempfile::tempdir().expect("tempdir");
  let toml_path = dir.path().join("wiki.toml");
  let json_path = dir.path().join("wiki.json");
  fs::write(&toml_path, "smart_punctuation = false\njobs = 2\n")
    .expect("write toml");
  fs::write(&json_path, r#"{ "heading_ids": false }"#).expect("write json");

  let from_toml = Config::from_file(&toml_path).expect("toml loads");
  assert!(!from_toml.smart_punctuation);
  assert_eq!(from_toml.jobs, Some(2));
  assert!(from_toml.gfm);

  let from_json = Config::from_file(&json_path).expect("json loads");
  assert!(!from_json.heading_ids);
}

#[test]
fn test_rejects_unknown_formats() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("wiki.yaml");
  fs::write(&path, "gfm: true").expect("write");

  let err = Config::from_file(&path).expect_err("yaml is unsupported");
  assert!(matches!(err, ConfigError::Config(ref m) if m.contains("Unsupported")));
}

#[test]
fn test_later_files_and_overrides_win() {
  let dir = tempfile::tempdir().expect("tempdir");
  let base = dir.path().join("base.toml");
  let local = dir.path().join("local.toml");
  fs::write(&base, "jobs = 2\nwiki_root = \"wiki\"\n").expect("write base");
  fs::write(&local, "jobs = 6\nindex_names = [\"home\"]\n").expect("write local");

  let config = Config::load(&[base, local], &["diagrams.enable=true".to_string()])
    .expect("config loads");

  assert_eq!(config.jobs, Some(6));
  assert_eq!(config.wiki_root.as_deref(), Some(std::path::Path::new("wiki")));
  assert_eq!(config.index_names, vec!["index", "readme", "home"]);
  assert!(config.diagrams().enable);
}

#[test]
fn test_discovers_config_in_directory() {
  let dir = tempfile::tempdir().expect("tempdir");
  assert_eq!(Config::find_config_file_in(dir.path()), None);

  fs::write(dir.path().join(".wikiview.toml"), "").expect("write hidden");
  fs::write(dir.path().join("wikiview.json"), "{}").expect("write json");
  assert_eq!(
    Config::find_config_file_in(dir.path()),
    Some(dir.path().join(".wikiview.toml"))
  );

  fs::write(dir.path().join("wikiview.toml"), "").expect("write toml");
  assert_eq!(
    Config::find_config_file_in(dir.path()),
    Some(dir.path().join("wikiview.toml"))
  );
}

#[test]
fn test_generated_defaults_load_back() {
  let dir = tempfile::tempdir().expect("tempdir");
  for format in ["toml", "json"] {
    let path = dir.path().join(format!("wikiview.{format}"));
    Config::generate_default_config(format, &path).expect("generated");
    let config = Config::from_file(&path).expect("loads back");
    assert_eq!(config.pipeline_options(), Config::default().pipeline_options());
  }

  let err = Config::generate_default_config("yaml", &dir.path().join("x.yaml"))
    .expect_err("yaml is unsupported");
  assert!(matches!(err, ConfigError::Template(_)));
}
