//! Reading annotation directories, with a read-once cache.
//!
//! Several generators consume the same webpage directories. The cache is an
//! explicit object owned by the corpus builder and handed to each generator,
//! so every directory name is parsed and filtered at most once per build.

use super::filter::{filter_page, FilterStats};
use super::validate::{parse_page, StructureRules};
use super::PageAnnotation;
use crate::config::FilterConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sub-directory holding the raw page annotation files.
pub const ANNO_DIR: &str = "anno";
/// Sub-directory holding the raw screenshots.
pub const RAW_DIR: &str = "raw";

/// Read, validate and filter every page of `<data_dir>/anno/*.json`.
///
/// Files are visited in name order. Unparsable or structurally invalid
/// files are counted and skipped; only I/O errors on the directory itself
/// are returned. Reading stops once `max_pages` pages were accepted.
pub fn read_annotation_dir(
    data_dir: &Path,
    config: &FilterConfig,
    max_pages: Option<usize>,
) -> Result<(Vec<PageAnnotation>, FilterStats)> {
    let anno_dir = data_dir.join(ANNO_DIR);
    let mut files: Vec<PathBuf> = fs::read_dir(&anno_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let rules = StructureRules {
        element_count: Some(config.structural_min_elements..=config.structural_max_elements),
    };
    let mut stats = FilterStats::default();
    let mut pages = Vec::new();

    for path in &files {
        stats.pages_seen += 1;
        let value = match fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).map_err(Error::from))
        {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Skipping unreadable annotation {}: {}", path.display(), e);
                stats.structural_rejections += 1;
                continue;
            },
        };

        let page = match parse_page(&value, &rules) {
            Ok(page) => page,
            Err(e) => {
                log::debug!("Structural rejection {}: {}", path.display(), e);
                stats.structural_rejections += 1;
                continue;
            },
        };

        match filter_page(page, config) {
            Ok((mut page, dropped)) => {
                page.image_path = data_dir.join(RAW_DIR).join(&page.image_path);
                stats.elements_dropped += dropped;
                stats.elements_kept += page.elements.len();
                stats.pages_kept += 1;
                pages.push(page);
            },
            Err(rejection) => {
                log::debug!("Quality rejection {}: {}", path.display(), rejection);
                stats.record_rejection(rejection);
            },
        }

        if max_pages.is_some_and(|max| pages.len() >= max) {
            break;
        }
    }

    log::info!(
        "Read {}: {} pages filtered, {} left. Additionally {} elements filtered, {} left.",
        dir_key(data_dir),
        stats.pages_rejected(),
        stats.pages_kept,
        stats.elements_dropped,
        stats.elements_kept
    );
    Ok((pages, stats))
}

/// Cache key of a data directory: its final path component.
pub fn dir_key(data_dir: &Path) -> String {
    data_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| data_dir.to_string_lossy().into_owned())
}

/// Filtered pages per directory name, each populated at most once.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    config: FilterConfig,
    pages: HashMap<String, Arc<Vec<PageAnnotation>>>,
    stats: HashMap<String, FilterStats>,
}

impl AnnotationCache {
    /// Create an empty cache with default filter thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with custom filter thresholds.
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Pages of `data_dir`, reading them on first request.
    ///
    /// `max_pages` only applies to the first read of a directory name.
    pub fn get_or_read(&mut self, data_dir: &Path, max_pages: Option<usize>) -> Result<Arc<Vec<PageAnnotation>>> {
        let key = dir_key(data_dir);
        if let Some(pages) = self.pages.get(&key) {
            return Ok(Arc::clone(pages));
        }
        let (pages, stats) = read_annotation_dir(data_dir, &self.config, max_pages)?;
        let pages = Arc::new(pages);
        self.pages.insert(key.clone(), Arc::clone(&pages));
        self.stats.insert(key, stats);
        Ok(pages)
    }

    /// Whether a directory name has been read.
    pub fn contains(&self, key: &str) -> bool {
        self.pages.contains_key(key)
    }

    /// Filter counters of a directory name.
    pub fn stats(&self, key: &str) -> Option<&FilterStats> {
        self.stats.get(key)
    }

    /// Number of cached directories.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when nothing has been read yet.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Filter thresholds in use.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_key_uses_last_component() {
        assert_eq!(dir_key(Path::new("datasets/web/part1")), "part1");
        assert_eq!(dir_key(Path::new("part2")), "part2");
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let mut cache = AnnotationCache::new();
        let err = cache.get_or_read(Path::new("/nonexistent/ui_corpus/dir"), None).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(cache.is_empty());
    }
}
