// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering test directories under a regression root.

use crate::{config::DiscoveryConfig, errors::DiscoveryError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Returns the directories under `root` whose base name matches the configured pattern, sorted
/// and deduplicated.
///
/// The root itself is never returned. Entries that can't be read, or whose paths aren't valid
/// UTF-8, are skipped with a warning.
///
/// Test cases are named by base name, so directories in different parents that share a base name
/// are reported under one name. A warning lists any such names.
pub fn discover_test_dirs(
    root: &Utf8Path,
    config: &DiscoveryConfig,
) -> Result<Vec<Utf8PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound {
            root: root.to_owned(),
        });
    }

    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(config.follow_symlinks());
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("skipping entry while walking {root}: {error}");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(path) => path,
            Err(path) => {
                warn!("skipping non-UTF-8 path {}", path.display());
                continue;
            }
        };
        let matches = path
            .file_name()
            .is_some_and(|name| config.directory_pattern().is_match(name));
        if matches {
            debug!("discovered test directory {path}");
            dirs.push(path);
        }
    }

    dirs.sort_unstable();
    dirs.dedup();

    let duplicates = duplicate_base_names(&dirs);
    if !duplicates.is_empty() {
        warn!(
            "test directories share base names, their results will be combined: {}",
            duplicates.join(", ")
        );
    }

    if dirs.is_empty() {
        return Err(DiscoveryError::NoDirectoriesFound {
            root: root.to_owned(),
            pattern: config.directory_pattern().as_str().to_owned(),
        });
    }
    Ok(dirs)
}

/// Returns the base names that appear more than once in `dirs`, sorted.
fn duplicate_base_names(dirs: &[Utf8PathBuf]) -> Vec<&str> {
    let mut counts = BTreeMap::new();
    for name in dirs.iter().filter_map(|dir| dir.file_name()) {
        *counts.entry(name).or_insert(0_usize) += 1;
    }
    counts
        .into_iter()
        .filter_map(|(name, count)| (count > 1).then_some(name))
        .collect()
}
