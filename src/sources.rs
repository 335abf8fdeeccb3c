//! Finding the source image for a photo.
//!
//! Exported image names rarely match what the JSON says: case differs,
//! `.jpeg` becomes `.jpg`, and Flickr renames files to
//! `<title>_<id>_o.<ext>`. `SourceIndex` scans the images directory once and
//! answers lookups in this order:
//!
//! 1. the record's filename, case-insensitively
//! 2. the record's filename stem, ignoring the extension
//! 3. the photo identifier embedded in a filename (`<id>_...`, `..._<id>_o`, `..._<id>`)
//! 4. a file whose stem is the photo identifier
//!
//! When several files qualify the lexicographically first path wins.

use anyhow::{Context, Result};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct SourceIndex {
    by_name: HashMap<String, PathBuf>,
    by_stem: HashMap<String, PathBuf>,
    by_id: HashMap<String, PathBuf>,
    files: usize,
}

impl SourceIndex {
    /// Indexes every file directly inside `images_dir`
    pub fn scan(images_dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(images_dir)
            .with_context(|| format!("Failed to read images directory {}", images_dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Failed to list images directory {}", images_dir.display())
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }

        let index = Self::from_paths(paths);
        debug!(
            "Indexed {} source files in {}",
            index.len(),
            images_dir.display()
        );
        Ok(index)
    }

    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        let mut index = SourceIndex::default();

        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = name.to_lowercase();
            let stem = Path::new(&name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name.as_str())
                .to_string();

            for id in embedded_ids(&stem) {
                index.by_id.entry(id).or_insert_with(|| path.clone());
            }
            index.by_stem.entry(stem).or_insert_with(|| path.clone());
            index.by_name.entry(name).or_insert(path);
            index.files += 1;
        }

        index
    }

    pub fn len(&self) -> usize {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Finds the source image for a photo
    pub fn locate(&self, photo_id: &str, source_filename: Option<&str>) -> Option<&Path> {
        if let Some(filename) = source_filename {
            let name = filename.to_lowercase();
            if let Some(path) = self.by_name.get(&name) {
                return Some(path);
            }
            let stem = Path::new(&name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(name.as_str());
            if let Some(path) = self.by_stem.get(stem) {
                return Some(path);
            }
        }

        self.by_id
            .get(&photo_id.to_lowercase())
            .or_else(|| self.by_stem.get(&photo_id.to_lowercase()))
            .map(PathBuf::as_path)
    }
}

/// Numeric identifiers embedded in an export filename stem
fn embedded_ids(stem: &str) -> Vec<String> {
    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() < 2 {
        return Vec::new();
    }
    let is_id = |token: &str| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit());

    let mut ids = Vec::new();
    let mut push = |token: &str| {
        if is_id(token) && !ids.iter().any(|id| id == token) {
            ids.push(token.to_string());
        }
    };

    // <id>_...
    push(tokens[0]);
    // ..._<id>_o
    if tokens.len() >= 2 && tokens[tokens.len() - 1] == "o" {
        push(tokens[tokens.len() - 2]);
    }
    // ..._<id>
    push(tokens[tokens.len() - 1]);

    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn index(names: &[&str]) -> SourceIndex {
        SourceIndex::from_paths(names.iter().map(|n| PathBuf::from("/images").join(n)).collect())
    }

    #[test]
    fn test_embedded_ids() {
        assert_eq!(embedded_ids("131099312_abc_o"), vec!["131099312"]);
        assert_eq!(
            embedded_ids("fresh-crop_131099312_o"),
            vec!["131099312"]
        );
        assert_eq!(embedded_ids("holiday_555"), vec!["555"]);
        assert_eq!(embedded_ids("12_34"), vec!["12", "34"]);
        assert!(embedded_ids("12345").is_empty());
        assert!(embedded_ids("no_numbers_here").is_empty());
    }

    #[test]
    fn test_exact_name_is_case_insensitive() {
        let sources = index(&["Sunset.JPG", "other.jpg"]);
        assert_eq!(
            sources.locate("P9", Some("sunset.jpg")),
            Some(Path::new("/images/Sunset.JPG"))
        );
    }

    #[test]
    fn test_extension_variation() {
        let sources = index(&["sunset.jpeg"]);
        assert_eq!(
            sources.locate("P9", Some("SUNSET.jpg")),
            Some(Path::new("/images/sunset.jpeg"))
        );
    }

    #[test]
    fn test_flickr_renamed_files() {
        let sources = index(&[
            "t-rex-back-to-the-cretacious-3d-imax_133996756_o.jpg",
            "131099312_abcdef_o.png",
        ]);
        assert_eq!(
            sources.locate("133996756", Some("133996756_f00d_o.jpg")),
            Some(Path::new(
                "/images/t-rex-back-to-the-cretacious-3d-imax_133996756_o.jpg"
            ))
        );
        assert_eq!(
            sources.locate("131099312", None),
            Some(Path::new("/images/131099312_abcdef_o.png"))
        );
    }

    #[test]
    fn test_stem_matches_photo_id() {
        let sources = index(&["P1.jpg"]);
        assert_eq!(sources.locate("P1", None), Some(Path::new("/images/P1.jpg")));
        assert_eq!(sources.locate("P404", Some("P404.jpg")), None);
    }

    #[test]
    fn test_ties_resolve_to_first_path() {
        let sources = index(&["b_42.jpg", "a_42.jpg"]);
        assert_eq!(sources.locate("42", None), Some(Path::new("/images/a_42.jpg")));
    }

    #[test]
    fn test_scan_directory() -> Result<()> {
        let temp_dir = tempdir()?;
        fs::write(temp_dir.path().join("one.jpg"), b"x")?;
        fs::write(temp_dir.path().join("two.png"), b"x")?;
        fs::create_dir(temp_dir.path().join("nested"))?;

        let sources = SourceIndex::scan(temp_dir.path())?;
        assert_eq!(sources.len(), 2);
        assert!(sources.locate("one", None).is_some());

        assert!(SourceIndex::scan(&temp_dir.path().join("missing")).is_err());
        Ok(())
    }
}
