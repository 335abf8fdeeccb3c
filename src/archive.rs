//! Running the whole pipeline.
//!
//! The `Archiver` drives load, link, materialize and render in that order.
//! Missing input directories and an export with no records are fatal and stop
//! the run before anything is written. Everything else is a fault: it is
//! recorded, logged and reported at the end, and the run carries on. Once
//! derivatives are on disk that includes a site directory that cannot be
//! regenerated.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::faults::{Fault, FaultCollector, FaultKind, FaultSummary};
use crate::graph::EntityGraph;
use crate::layout::{OutputLayout, SITE_DIR};
use crate::loader::load_export;
use crate::materialize::{ImageSettings, Materializer};
use crate::render::SiteRenderer;
use crate::sources::SourceIndex;

/// Exit status for runs that produced nothing
pub const EXIT_FATAL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Everything was archived
    Clean,
    /// The archive was built, but this many faults were recorded
    Faulted(usize),
    /// A stop was requested before all images were processed
    Interrupted,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Clean => 0,
            RunOutcome::Faulted(_) => 1,
            RunOutcome::Interrupted => 130,
        }
    }
}

/// What a build produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub photos: usize,
    pub albums: usize,
    pub comments: usize,
    /// Photos with derivatives on disk
    pub materialized: usize,
    /// Source images decoded and encoded
    pub encoded: usize,
    /// Derivative sets written by copying an already encoded source
    pub copies: usize,
    pub pages: usize,
    pub faults: FaultSummary,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Archived {} of {} photos in {} albums ({} comments)",
            self.materialized, self.photos, self.albums, self.comments
        )?;
        writeln!(
            f,
            "Images: {} encoded, {} copied; pages: {}",
            self.encoded, self.copies, self.pages
        )?;
        match self.outcome {
            RunOutcome::Clean => write!(f, "Completed cleanly"),
            RunOutcome::Faulted(_) => write!(f, "Completed with {}", self.faults),
            RunOutcome::Interrupted => write!(f, "Interrupted; the site was not regenerated"),
        }
    }
}

/// The export read and linked, without writing anything
#[derive(Debug)]
pub struct Inspection {
    pub graph: EntityGraph,
    pub faults: FaultCollector,
    pub files_read: usize,
}

pub struct Archiver {
    config: Config,
}

impl Archiver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads and links the export
    pub fn inspect(&self) -> Result<Inspection> {
        self.config.validate()?;
        let json_dir = self.config.json_path();
        if !json_dir.is_dir() {
            anyhow::bail!("JSON directory not found at {}", json_dir.display());
        }

        let faults = FaultCollector::new();
        let export = load_export(&json_dir, &faults)?;
        let files_read = export.files_read;
        let graph = EntityGraph::build(export, &faults);

        Ok(Inspection {
            graph,
            faults,
            files_read,
        })
    }

    /// Builds the archive, checking `stop` between images
    pub fn run(&self, stop: &AtomicBool) -> Result<RunSummary> {
        self.config.validate()?;
        let json_dir = self.config.json_path();
        let images_dir = self.config.images_path();
        for (what, dir) in [("JSON", &json_dir), ("Images", &images_dir)] {
            if !dir.is_dir() {
                anyhow::bail!("{} directory not found at {}", what, dir.display());
            }
        }

        let faults = FaultCollector::new();

        info!("Loading records from {}", json_dir.display());
        let export = load_export(&json_dir, &faults)?;
        if export.is_empty() {
            anyhow::bail!(
                "No photo or album records found in {}, nothing to archive",
                json_dir.display()
            );
        }
        info!(
            "Loaded {} photos and {} albums from {} files",
            export.photos.len(),
            export.albums.len(),
            export.files_read
        );

        let graph = EntityGraph::build(export, &faults);
        info!(
            "Linked {} photos, {} albums, {} tags",
            graph.photo_count(),
            graph.album_count(),
            graph.tags().len()
        );

        let sources = SourceIndex::scan(&images_dir)?;
        let layout = OutputLayout::new(self.config.out_path());
        fs::create_dir_all(layout.root()).with_context(|| {
            format!("Failed to create output directory {}", layout.root().display())
        })?;

        let settings = ImageSettings {
            thumbnail_size: self.config.thumbnail_size,
            display_size: self.config.display_size,
            jpeg_quality: self.config.jpeg_quality,
        };
        let workers = self.config.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let images = Materializer::new(&graph, &sources, &layout, settings, workers)
            .run(&faults, stop)?;

        let interrupted = images.cancelled() || stop.load(Ordering::Relaxed);
        let pages = if interrupted {
            warn!("Stop requested, skipping site generation");
            0
        } else {
            match SiteRenderer::new(&graph, &images, &layout).render(&faults) {
                Ok(report) => report.pages,
                Err(e) => {
                    faults.record(
                        Fault::new(FaultKind::WriteFailed, SITE_DIR, format!("{e:#}"))
                            .with_file(layout.site_dir()),
                    );
                    0
                }
            }
        };

        let summary = faults.summary();
        let outcome = if interrupted {
            RunOutcome::Interrupted
        } else if summary.is_clean() {
            RunOutcome::Clean
        } else {
            RunOutcome::Faulted(summary.total)
        };

        let headline = match outcome {
            RunOutcome::Interrupted => "build interrupted".to_string(),
            _ => format!(
                "build of {} photos, {} albums",
                graph.photo_count(),
                graph.album_count()
            ),
        };
        let log_path = self.config.log_path();
        if let Err(e) = faults.write_run_log(&log_path, &headline) {
            warn!("Could not write run log: {:#}", e);
        }

        Ok(RunSummary {
            outcome,
            photos: graph.photo_count(),
            albums: graph.album_count(),
            comments: graph.comment_count(),
            materialized: images.materialized(),
            encoded: images.encoded,
            copies: images.copies,
            pages,
            faults: summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_for(root: &Path) -> Config {
        Config {
            input_dir: root.join("export").display().to_string(),
            out_dir: root.join("out").display().to_string(),
            thumbnail_size: 16,
            display_size: 32,
            workers: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::Clean.exit_code(), 0);
        assert_eq!(RunOutcome::Faulted(3).exit_code(), 1);
        assert_eq!(RunOutcome::Interrupted.exit_code(), 130);
    }

    #[test]
    fn test_missing_input_is_fatal() -> Result<()> {
        let temp_dir = tempdir()?;
        let archiver = Archiver::new(config_for(temp_dir.path()));

        let err = archiver.run(&AtomicBool::new(false)).unwrap_err();
        assert!(err.to_string().contains("JSON directory not found"));
        assert!(!temp_dir.path().join("out").exists());
        Ok(())
    }

    #[test]
    fn test_empty_export_is_fatal() -> Result<()> {
        let temp_dir = tempdir()?;
        fs::create_dir_all(temp_dir.path().join("export/json"))?;
        fs::create_dir_all(temp_dir.path().join("export/images"))?;
        fs::write(temp_dir.path().join("export/json/notes.json"), "{}")?;

        let archiver = Archiver::new(config_for(temp_dir.path()));
        let err = archiver.run(&AtomicBool::new(false)).unwrap_err();
        assert!(err.to_string().contains("nothing to archive"));
        assert!(!temp_dir.path().join("out").exists());
        Ok(())
    }

    #[test]
    fn test_clean_run_and_log() -> Result<()> {
        let temp_dir = tempdir()?;
        let json = temp_dir.path().join("export/json");
        let images = temp_dir.path().join("export/images");
        fs::create_dir_all(&json)?;
        fs::create_dir_all(&images)?;
        fs::write(
            json.join("photo_1.json"),
            r#"{"id": "1", "name": "One", "original": "1.jpg"}"#,
        )?;
        image::RgbImage::new(8, 8).save(images.join("1.jpg"))?;

        let archiver = Archiver::new(config_for(temp_dir.path()));
        let summary = archiver.run(&AtomicBool::new(false))?;

        assert_eq!(summary.outcome, RunOutcome::Clean);
        assert_eq!(summary.materialized, 1);
        assert!(summary.pages > 0);
        assert!(temp_dir.path().join("out/unsorted/1.jpg").exists());

        let log = fs::read_to_string(temp_dir.path().join("out/archive.log"))?;
        assert!(log.contains("build of 1 photos, 0 albums"));
        assert!(log.contains("0 fault(s)"));
        Ok(())
    }

    #[test]
    fn test_stop_skips_rendering() -> Result<()> {
        let temp_dir = tempdir()?;
        let json = temp_dir.path().join("export/json");
        fs::create_dir_all(&json)?;
        fs::create_dir_all(temp_dir.path().join("export/images"))?;
        fs::write(json.join("photo_1.json"), r#"{"id": "1"}"#)?;

        let archiver = Archiver::new(config_for(temp_dir.path()));
        let summary = archiver.run(&AtomicBool::new(true))?;

        assert_eq!(summary.outcome, RunOutcome::Interrupted);
        assert_eq!(summary.outcome.exit_code(), 130);
        assert!(!temp_dir.path().join("out/site").exists());
        Ok(())
    }

    #[test]
    fn test_unwritable_site_is_a_fault() -> Result<()> {
        let temp_dir = tempdir()?;
        let json = temp_dir.path().join("export/json");
        let images = temp_dir.path().join("export/images");
        fs::create_dir_all(&json)?;
        fs::create_dir_all(&images)?;
        fs::write(json.join("photo_1.json"), r#"{"id": "1", "original": "1.jpg"}"#)?;
        image::RgbImage::new(8, 8).save(images.join("1.jpg"))?;
        // A plain file where the site directory should go
        fs::create_dir_all(temp_dir.path().join("out"))?;
        fs::write(temp_dir.path().join("out/site"), "not a directory")?;

        let archiver = Archiver::new(config_for(temp_dir.path()));
        let summary = archiver.run(&AtomicBool::new(false))?;

        assert_eq!(summary.outcome, RunOutcome::Faulted(1));
        assert_eq!(summary.outcome.exit_code(), 1);
        assert_eq!(summary.faults.kind_count(FaultKind::WriteFailed), 1);
        assert_eq!(summary.pages, 0);
        assert!(temp_dir.path().join("out/unsorted/1.jpg").exists());

        let log = fs::read_to_string(temp_dir.path().join("out/archive.log"))?;
        assert!(log.contains("write-failed: site"));
        Ok(())
    }

    #[test]
    fn test_inspect_writes_nothing() -> Result<()> {
        let temp_dir = tempdir()?;
        let json = temp_dir.path().join("export/json");
        fs::create_dir_all(&json)?;
        fs::write(json.join("photo_1.json"), r#"{"id": "1", "tags": ["a", "b"]}"#)?;

        let inspection = Archiver::new(config_for(temp_dir.path())).inspect()?;
        assert_eq!(inspection.graph.photo_count(), 1);
        assert_eq!(inspection.graph.tags().len(), 2);
        assert_eq!(inspection.files_read, 1);
        assert!(!temp_dir.path().join("out").exists());
        Ok(())
    }
}
