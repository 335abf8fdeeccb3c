//! Configuration for flickr-archive.
//!
//! The configuration lives in a YAML file (by default `archive.yaml` in the
//! working directory). Every field is optional in the file; missing fields
//! take the values from `Config::default()`. Command-line flags are applied on
//! top of whatever the file provides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "archive.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the unpacked export
    pub input_dir: String,
    /// Directory holding the per-record JSON files (default `<input_dir>/json`)
    pub json_dir: Option<String>,
    /// Directory holding the source images (default `<input_dir>/images`)
    pub images_dir: Option<String>,
    /// Where derivatives and the site are written
    pub out_dir: String,
    /// Longer edge of thumbnails, in pixels
    pub thumbnail_size: u32,
    /// Longer edge of the display-size derivative, in pixels
    pub display_size: u32,
    /// JPEG encoder quality (1-100)
    pub jpeg_quality: u8,
    /// Worker threads for image processing; one per CPU when unset
    pub workers: Option<usize>,
    /// Run log location (default `<out_dir>/archive.log`)
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: ".".to_string(),
            json_dir: None,
            images_dir: None,
            out_dir: "archive".to_string(),
            thumbnail_size: 300,
            display_size: 1600,
            jpeg_quality: 85,
            workers: None,
            log_file: None,
        }
    }
}

impl Config {
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Ok(config)
    }

    pub fn get_config_path(config_arg: &Option<PathBuf>) -> PathBuf {
        config_arg
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Rejects values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_size == 0 {
            anyhow::bail!("thumbnail_size must be greater than zero");
        }
        if self.display_size == 0 {
            anyhow::bail!("display_size must be greater than zero");
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            anyhow::bail!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            );
        }
        if self.workers == Some(0) {
            anyhow::bail!("workers must be greater than zero when set");
        }
        Ok(())
    }

    pub fn json_path(&self) -> PathBuf {
        match &self.json_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.input_dir).join("json"),
        }
    }

    pub fn images_path(&self) -> PathBuf {
        match &self.images_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.input_dir).join("images"),
        }
    }

    pub fn out_path(&self) -> PathBuf {
        PathBuf::from(&self.out_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(file) => PathBuf::from(file),
            None => self.out_path().join("archive.log"),
        }
    }
}
