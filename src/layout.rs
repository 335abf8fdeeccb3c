//! Where everything goes in the output tree.
//!
//! ```text
//! <out>/<album>/<photo>.<ext>          display derivative
//! <out>/<album>/thumbs/<photo>.<ext>   thumbnail
//! <out>/unsorted/...                   photos in no album
//! <out>/site/...                       generated pages
//! ```
//!
//! Both the materializer and the renderer derive paths from here, so a link
//! in a page always matches the file that was written. Relative paths use
//! forward slashes on every platform.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const SITE_DIR: &str = "site";
pub const UNSORTED_DIR: &str = "unsorted";
pub const THUMBS_DIR: &str = "thumbs";
/// List of all tags, relative to the site directory
pub const TAG_INDEX_PAGE: &str = "tags/index.html";

/// Makes an identifier safe to use as a single path component
pub fn path_component(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() { "_".to_string() } else { safe }
}

/// Writes `bytes` to `path` through a sibling temporary file.
///
/// Readers never see a half-written file: either the old content or the new
/// content is at `path`. Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("Failed to move {} into place", path.display()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivativeKind {
    /// Display-size copy shown on the photo page
    Display,
    /// Small preview used in grids
    Thumbnail,
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join(SITE_DIR)
    }

    /// Directory name for an album's derivatives (also used for its page)
    pub fn album_dir_name(album_id: &str) -> String {
        let name = path_component(album_id);
        if name.eq_ignore_ascii_case(SITE_DIR) || name.eq_ignore_ascii_case(UNSORTED_DIR) {
            format!("album-{name}")
        } else {
            name
        }
    }

    /// Path of a derivative relative to the output root
    pub fn derivative_rel(dir_name: &str, file_name: &str, kind: DerivativeKind, ext: &str) -> String {
        let file = format!("{}.{}", path_component(file_name), ext);
        match kind {
            DerivativeKind::Display => format!("{dir_name}/{file}"),
            DerivativeKind::Thumbnail => format!("{dir_name}/{THUMBS_DIR}/{file}"),
        }
    }

    pub fn derivative_path(
        &self,
        dir_name: &str,
        file_name: &str,
        kind: DerivativeKind,
        ext: &str,
    ) -> PathBuf {
        let file = format!("{}.{}", path_component(file_name), ext);
        match kind {
            DerivativeKind::Display => self.root.join(dir_name).join(file),
            DerivativeKind::Thumbnail => self.root.join(dir_name).join(THUMBS_DIR).join(file),
        }
    }

    /// Album page for an album directory name, relative to the site directory
    pub fn album_page_rel(dir_name: &str) -> String {
        format!("albums/{}.html", path_component(dir_name))
    }

    /// Photo page for a photo file name, relative to the site directory
    pub fn photo_page_rel(file_name: &str) -> String {
        format!("photos/{}.html", path_component(file_name))
    }

    /// Tag page file name within `tags/`; `index` belongs to the tag list
    pub fn tag_file_name(slug: &str) -> String {
        let name = path_component(slug);
        if name.eq_ignore_ascii_case("index") {
            // Slugs never start with an underscore
            format!("_{name}.html")
        } else {
            format!("{name}.html")
        }
    }

    /// Tag page, relative to the site directory
    pub fn tag_page_rel(slug: &str) -> String {
        format!("tags/{}", Self::tag_file_name(slug))
    }
}
