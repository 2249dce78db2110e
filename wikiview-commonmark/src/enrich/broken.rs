//! Existence checks for internal links.
use std::{collections::HashMap, path::Path, sync::Arc};

use log::{trace, warn};
use tokio::task::JoinSet;

use crate::{
  links::split_fragment,
  resolve::{PathResolver, Resolved},
  types::{Link, LinkClass, LinkStatus},
};

/// Resolve every internal link and record whether its target exists.
///
/// Anchor-only references are skipped, external and anchor links are never
/// looked at. Each distinct file part is checked once; checks run
/// concurrently and all complete before this returns. A check whose task
/// fails counts as missing.
pub async fn check_links(
  resolver: &PathResolver,
  current_path: &Path,
  links: &mut [Link],
) {
  let mut targets: Vec<String> = links
    .iter()
    .filter(|link| link.classification == LinkClass::Internal)
    .map(|link| split_fragment(&link.raw_href).0)
    .filter(|file| !file.is_empty())
    .map(str::to_string)
    .collect();
  targets.sort();
  targets.dedup();
  if targets.is_empty() {
    return;
  }

  let current: Arc<Path> = Arc::from(current_path);
  let mut checks = JoinSet::new();
  for target in targets {
    let resolver = resolver.clone();
    let current = Arc::clone(&current);
    checks.spawn(async move {
      let resolved = resolver.resolve_with_fallback(&current, &target).await;
      (target, resolved)
    });
  }

  let mut results: HashMap<String, Resolved> = HashMap::new();
  while let Some(joined) = checks.join_next().await {
    match joined {
      Ok((target, resolved)) => {
        trace!(
          "Link '{target}' resolves to {} ({})",
          resolved.path.display(),
          if resolved.exists { "exists" } else { "missing" }
        );
        results.insert(target, resolved);
      },
      Err(e) => warn!("Link check task failed: {e}"),
    }
  }

  for link in links
    .iter_mut()
    .filter(|link| link.classification == LinkClass::Internal)
  {
    let (file, _) = split_fragment(&link.raw_href);
    if file.is_empty() {
      continue;
    }
    match results.get(file) {
      Some(resolved) => {
        link.resolved_target = Some(resolved.path.clone());
        link.exists = if resolved.exists {
          LinkStatus::Exists
        } else {
          LinkStatus::Missing
        };
      },
      None => {
        link.resolved_target = Some(resolver.resolve(current_path, file));
        link.exists = LinkStatus::Missing;
      },
    }
  }
}
