//! Choosing which annotated pages to send to the vision model.

use super::PagePart;
use crate::annotation::{parse_page, StructureRules};
use crate::error::Result;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Numeric page id: the prefix before the first `_`, or before the first `.`.
pub fn page_number(name: &str) -> Option<u64> {
    let prefix = match name.split_once('_') {
        Some((head, _)) => head,
        None => name.split('.').next().unwrap_or(name),
    };
    prefix.parse().ok()
}

/// True unless the name carries a part suffix that is not selected.
fn part_selected(name: &str, parts: &[PagePart]) -> bool {
    PagePart::ALL
        .iter()
        .filter(|part| name.ends_with(part.suffix()))
        .all(|part| parts.contains(part))
}

fn is_usable(raw: &Value) -> bool {
    raw.get("description").is_some_and(Value::is_string) && parse_page(raw, &StructureRules::unbounded()).is_ok()
}

/// Names (without extension) of pages in `<page_dir>/anno/` eligible for generation.
///
/// A page is selected when its numeric id is at most `max_id`, its
/// `_top/_mid/_btm` suffix (if any) is among `parts`, `<page_dir>/som/<name>.png`
/// exists, and the annotation passes structural validation with a string
/// description. Element count is not limited. Names are sorted.
pub fn select_samples(page_dir: &Path, parts: &[PagePart], max_id: u64) -> Result<Vec<String>> {
    info!("Selecting samples in {}", page_dir.display());
    let anno_dir = page_dir.join("anno");
    let mut files: Vec<_> = fs::read_dir(&anno_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut selected = Vec::new();
    for file in files {
        let Some(name) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        match page_number(&name) {
            Some(number) if number <= max_id => {},
            Some(_) => continue,
            None => {
                debug!("Skipping {}: no numeric page id", name);
                continue;
            },
        }
        if !part_selected(&name, parts) {
            continue;
        }
        if !page_dir.join("som").join(format!("{}.png", name)).exists() {
            continue;
        }
        let usable = fs::read_to_string(&file)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .is_some_and(|raw| is_usable(&raw));
        if usable {
            selected.push(name);
        } else {
            debug!("Skipping {}: annotation failed validation", name);
        }
    }

    info!("Selected {} webpage(s)", selected.len());
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("12_top"), Some(12));
        assert_eq!(page_number("7"), Some(7));
        assert_eq!(page_number("3.v2"), Some(3));
        assert_eq!(page_number("home_top"), None);
    }

    #[test]
    fn test_part_suffix_filter() {
        assert!(part_selected("1_top", &[PagePart::Top]));
        assert!(!part_selected("1_mid", &[PagePart::Top]));
        assert!(part_selected("1_mid", &[PagePart::Top, PagePart::Mid]));
        assert!(part_selected("1", &[PagePart::Btm]));
    }
}
