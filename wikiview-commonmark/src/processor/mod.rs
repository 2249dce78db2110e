//! The rendering pipeline.
//!
//! - [`types`]: pipeline configuration and the processor itself
//! - [`core`]: construction and the synchronous structural stage
//! - [`process`]: the full asynchronous render with error recovery
//! - [`overrides`]: link and image rendering hooks
pub mod core;
pub mod overrides;
pub mod process;
pub mod types;

pub use overrides::{
  DefaultOverrides,
  ImageAttrs,
  LinkAttrs,
  RenderContext,
  RenderOverrides,
  resolve_image_src,
};
pub use process::process_safe;
pub use types::{
  PendingDiagram,
  StagedRender,
  WikiOptions,
  WikiOptionsBuilder,
  WikiProcessor,
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_matches_struct_update() {
    let built = WikiOptionsBuilder::new()
      .smart_punctuation(false)
      .highlight_code(false)
      .canonical_extension("markdown")
      .index_names(["home"])
      .build();

    assert_eq!(built, WikiOptions {
      smart_punctuation: false,
      highlight_code: false,
      canonical_extension: "markdown".to_string(),
      index_names: vec!["home".to_string()],
      ..WikiOptions::default()
    });
  }

  #[test]
  fn test_processor_is_cheap_to_clone() {
    let processor = WikiProcessor::new(WikiOptions {
      highlight_code: false,
      ..WikiOptions::default()
    });
    let clone = processor.clone();
    assert_eq!(clone.options(), processor.options());
  }
}
