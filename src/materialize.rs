//! Turning source images into the archive's derivatives.
//!
//! Every photo gets a display-size copy and a thumbnail in the directory of
//! each album that lists it (or `unsorted/` when none does). A source file is
//! read, decoded and encoded once; further destinations receive the same
//! encoded bytes. Work is spread over a rayon pool and each source is an
//! independent task, so a broken file only costs its own photos.
//!
//! Derivatives are JPEG, except PNG sources which stay PNG. Images are only
//! ever scaled down.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::exif::{ExifSummary, read_exif};
use crate::faults::{Fault, FaultCollector, FaultKind};
use crate::graph::{EntityGraph, PhotoKey};
use crate::layout::{DerivativeKind, OutputLayout, UNSORTED_DIR, write_atomic};
use crate::sources::SourceIndex;

/// Extensions of video files Flickr exports alongside photos
const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "mts", "webm", "wmv",
];

const PROGRESS_EVERY: usize = 100;

/// Sizes and encoder settings for derivatives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub thumbnail_size: u32,
    pub display_size: u32,
    pub jpeg_quality: u8,
}

/// What was written for one photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoDerivatives {
    /// File extension shared by both derivatives ("jpg" or "png")
    pub ext: &'static str,
    /// Directories holding this photo's derivatives; the first is its primary album
    pub dirs: Vec<String>,
    pub display_dims: (u32, u32),
    pub thumbnail_dims: (u32, u32),
    pub exif: ExifSummary,
}

impl PhotoDerivatives {
    /// Derivative path relative to the output root, preferring `dir` when it was written
    pub fn rel_path(&self, file_name: &str, dir: Option<&str>, kind: DerivativeKind) -> String {
        let dir = dir
            .filter(|d| self.dirs.iter().any(|written| written.as_str() == *d))
            .unwrap_or(self.dirs[0].as_str());
        OutputLayout::derivative_rel(dir, file_name, kind, self.ext)
    }
}

#[derive(Debug, Default)]
pub struct MaterializeReport {
    derivatives: HashMap<PhotoKey, PhotoDerivatives>,
    /// Source files decoded and encoded
    pub encoded: usize,
    /// Extra destinations filled from an already encoded source
    pub copies: usize,
    /// Tasks never started because a stop was requested
    pub skipped: usize,
}

impl MaterializeReport {
    pub fn get(&self, key: PhotoKey) -> Option<&PhotoDerivatives> {
        self.derivatives.get(&key)
    }

    /// Number of photos with at least one derivative on disk
    pub fn materialized(&self) -> usize {
        self.derivatives.len()
    }

    pub fn cancelled(&self) -> bool {
        self.skipped > 0
    }
}

/// One source file and every (photo, directory) it must be written to
#[derive(Debug)]
struct Task {
    source: PathBuf,
    destinations: Vec<(PhotoKey, Vec<String>)>,
}

enum TaskOutcome {
    Done {
        written: Vec<(PhotoKey, PhotoDerivatives)>,
        copies: usize,
    },
    Failed,
    Skipped,
}

pub struct Materializer<'a> {
    graph: &'a EntityGraph,
    sources: &'a SourceIndex,
    layout: &'a OutputLayout,
    settings: ImageSettings,
    workers: usize,
}

impl<'a> Materializer<'a> {
    pub fn new(
        graph: &'a EntityGraph,
        sources: &'a SourceIndex,
        layout: &'a OutputLayout,
        settings: ImageSettings,
        workers: usize,
    ) -> Self {
        Self {
            graph,
            sources,
            layout,
            settings,
            workers: workers.max(1),
        }
    }

    /// Writes derivatives for every photo, checking `stop` before each task
    pub fn run(&self, faults: &FaultCollector, stop: &AtomicBool) -> Result<MaterializeReport> {
        let tasks = self.plan(faults);
        let total = tasks.len();
        info!(
            "Materializing {} source images with {} workers",
            total, self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .context("Failed to start image worker pool")?;

        let done = AtomicUsize::new(0);
        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            tasks
                .par_iter()
                .map(|task| {
                    if stop.load(Ordering::Relaxed) {
                        return TaskOutcome::Skipped;
                    }
                    let outcome = self.process(task, faults);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % PROGRESS_EVERY == 0 || finished == total {
                        info!(
                            "Materialized {}/{} source images ({} faults so far)",
                            finished,
                            total,
                            faults.count()
                        );
                    }
                    outcome
                })
                .collect()
        });

        let mut report = MaterializeReport::default();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Done { written, copies } => {
                    report.encoded += 1;
                    report.copies += copies;
                    report.derivatives.extend(written);
                }
                TaskOutcome::Failed => {}
                TaskOutcome::Skipped => report.skipped += 1,
            }
        }

        if report.cancelled() {
            info!("Stopped early, {} source images not processed", report.skipped);
        }
        Ok(report)
    }

    /// Locates sources and groups destinations by source file
    fn plan(&self, faults: &FaultCollector) -> Vec<Task> {
        let mut by_source: BTreeMap<PathBuf, Vec<(PhotoKey, Vec<String>)>> = BTreeMap::new();

        for (key, photo) in self.graph.photos() {
            let Some(source) = self
                .sources
                .locate(&photo.id, photo.source_filename.as_deref())
            else {
                let wanted = photo.source_filename.as_deref().unwrap_or(photo.id.as_str());
                faults.record(Fault::new(
                    FaultKind::MissingSource,
                    photo.id.clone(),
                    format!("no image matching {wanted} in the images directory"),
                ));
                continue;
            };

            if is_video(source) {
                faults.record(
                    Fault::new(
                        FaultKind::UnsupportedFormat,
                        photo.id.clone(),
                        "videos are not archived",
                    )
                    .with_file(source),
                );
                continue;
            }

            let mut dirs: Vec<String> = photo
                .albums
                .iter()
                .map(|&album| self.graph.album(album).dir_name.clone())
                .collect();
            if dirs.is_empty() {
                dirs.push(UNSORTED_DIR.to_string());
            }

            by_source
                .entry(source.to_path_buf())
                .or_default()
                .push((key, dirs));
        }

        by_source
            .into_iter()
            .map(|(source, destinations)| Task {
                source,
                destinations,
            })
            .collect()
    }

    fn process(&self, task: &Task, faults: &FaultCollector) -> TaskOutcome {
        let subject = self.graph.photo(task.destinations[0].0).id.clone();
        let asset_fault = |kind: FaultKind, detail: String| {
            faults.record(Fault::new(kind, subject.clone(), detail).with_file(&task.source));
        };

        let bytes = match fs::read(&task.source) {
            Ok(bytes) => bytes,
            Err(e) => {
                asset_fault(FaultKind::DecodeFailed, format!("could not read source: {e}"));
                return TaskOutcome::Failed;
            }
        };

        let exif = read_exif(&bytes);
        let ext = match image::guess_format(&bytes) {
            Ok(ImageFormat::Png) => "png",
            _ => "jpg",
        };

        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(e) => {
                asset_fault(FaultKind::DecodeFailed, format!("could not decode: {e}"));
                return TaskOutcome::Failed;
            }
        };
        drop(bytes);

        let display = scale_down(&image, self.settings.display_size);
        let thumbnail = scale_down(&image, self.settings.thumbnail_size);
        let encoded = encode(&display, ext, self.settings.jpeg_quality).and_then(|display_bytes| {
            encode(&thumbnail, ext, self.settings.jpeg_quality).map(|thumb| (display_bytes, thumb))
        });
        let (display_bytes, thumb_bytes) = match encoded {
            Ok(encoded) => encoded,
            Err(e) => {
                asset_fault(FaultKind::DecodeFailed, format!("could not encode: {e}"));
                return TaskOutcome::Failed;
            }
        };

        let mut written = Vec::new();
        let mut destinations_written = 0;
        for (key, dirs) in &task.destinations {
            let photo = self.graph.photo(*key);
            let photo_id = &photo.id;
            let mut ok_dirs = Vec::new();

            for dir in dirs {
                match self.write_pair(dir, &photo.file_name, ext, &display_bytes, &thumb_bytes) {
                    Ok(()) => ok_dirs.push(dir.clone()),
                    Err(e) => faults.record(Fault::new(
                        FaultKind::WriteFailed,
                        photo_id.clone(),
                        format!("{e:#}"),
                    )),
                }
            }

            if ok_dirs.is_empty() {
                continue;
            }
            destinations_written += ok_dirs.len();
            debug!("Wrote {} to {}", photo_id, ok_dirs.join(", "));
            written.push((
                *key,
                PhotoDerivatives {
                    ext,
                    dirs: ok_dirs,
                    display_dims: (display.width(), display.height()),
                    thumbnail_dims: (thumbnail.width(), thumbnail.height()),
                    exif: exif.clone(),
                },
            ));
        }

        if written.is_empty() {
            return TaskOutcome::Failed;
        }
        TaskOutcome::Done {
            written,
            copies: destinations_written.saturating_sub(1),
        }
    }

    fn write_pair(
        &self,
        dir: &str,
        file_name: &str,
        ext: &str,
        display: &[u8],
        thumbnail: &[u8],
    ) -> Result<()> {
        let display_path = self
            .layout
            .derivative_path(dir, file_name, DerivativeKind::Display, ext);
        let thumb_path = self
            .layout
            .derivative_path(dir, file_name, DerivativeKind::Thumbnail, ext);
        write_atomic(&display_path, display)?;
        write_atomic(&thumb_path, thumbnail)?;
        Ok(())
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Dimensions that fit within `max` on the longer edge, never larger than the original
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max || longer == 0 {
        return (width, height);
    }
    let scale = |edge: u32| {
        let scaled = (u64::from(edge) * u64::from(max) + u64::from(longer) / 2) / u64::from(longer);
        scaled.max(1) as u32
    };
    if width >= height {
        (max, scale(height))
    } else {
        (scale(width), max)
    }
}

fn scale_down(image: &DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = fit_within(image.width(), image.height(), max);
    if (width, height) == (image.width(), image.height()) {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }
}

fn encode(image: &DynamicImage, ext: &str, jpeg_quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    if ext == "png" {
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    } else {
        let rgb = image.to_rgb8();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
        encoder.encode_image(&rgb)?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Export;
    use crate::model::{AlbumRecord, PhotoRecord};
    use tempfile::{TempDir, tempdir};

    const SETTINGS: ImageSettings = ImageSettings {
        thumbnail_size: 32,
        display_size: 64,
        jpeg_quality: 80,
    };

    fn photo(id: &str, filename: &str) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            source_filename: Some(filename.to_string()),
            origin: format!("photo_{id}.json"),
            ..Default::default()
        }
    }

    fn album(id: &str, photos: &[&str]) -> AlbumRecord {
        AlbumRecord {
            id: id.to_string(),
            title: id.to_string(),
            photo_ids: photos.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        images: PathBuf,
        out: PathBuf,
    }

    fn fixture() -> Result<Fixture> {
        let temp_dir = tempdir()?;
        let images = temp_dir.path().join("images");
        let out = temp_dir.path().join("out");
        fs::create_dir_all(&images)?;
        Ok(Fixture {
            images,
            out,
            _temp_dir: temp_dir,
        })
    }

    fn run(
        fixture: &Fixture,
        export: Export,
        stop: bool,
    ) -> Result<(EntityGraph, MaterializeReport, FaultCollector)> {
        let faults = FaultCollector::new();
        let graph = EntityGraph::build(export, &faults);
        let sources = SourceIndex::scan(&fixture.images)?;
        let layout = OutputLayout::new(&fixture.out);
        let report = Materializer::new(&graph, &sources, &layout, SETTINGS, 2)
            .run(&faults, &AtomicBool::new(stop))?;
        Ok((graph, report, faults))
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(4000, 3000, 300), (300, 225));
        assert_eq!(fit_within(3000, 4000, 300), (225, 300));
        assert_eq!(fit_within(200, 100, 300), (200, 100));
        assert_eq!(fit_within(10000, 1, 300), (300, 1));
        assert_eq!(fit_within(0, 0, 300), (0, 0));
    }

    #[test]
    fn test_photo_in_two_albums_is_encoded_once() -> Result<()> {
        let fixture = fixture()?;
        image::RgbImage::new(200, 100).save(fixture.images.join("p1.jpg"))?;

        let export = Export {
            photos: vec![photo("P1", "p1.jpg")],
            albums: vec![album("A1", &["P1"]), album("A2", &["P1"])],
            ..Default::default()
        };
        let (graph, report, faults) = run(&fixture, export, false)?;

        assert!(faults.summary().is_clean());
        assert_eq!(report.encoded, 1);
        assert_eq!(report.copies, 1);

        let derivatives = report.get(graph.photo_by_id("P1").unwrap()).unwrap();
        assert_eq!(derivatives.dirs, vec!["A1", "A2"]);
        assert_eq!(derivatives.display_dims, (64, 32));
        assert_eq!(derivatives.thumbnail_dims, (32, 16));
        for dir in ["A1", "A2"] {
            assert!(fixture.out.join(dir).join("P1.jpg").exists());
            assert!(fixture.out.join(dir).join("thumbs").join("P1.jpg").exists());
        }
        assert_eq!(
            fs::read(fixture.out.join("A1/P1.jpg"))?,
            fs::read(fixture.out.join("A2/P1.jpg"))?
        );
        Ok(())
    }

    #[test]
    fn test_png_stays_png_and_small_images_are_not_upscaled() -> Result<()> {
        let fixture = fixture()?;
        image::RgbImage::new(20, 10).save(fixture.images.join("small.png"))?;

        let export = Export {
            photos: vec![photo("P2", "small.png")],
            ..Default::default()
        };
        let (graph, report, _) = run(&fixture, export, false)?;

        let derivatives = report.get(graph.photo_by_id("P2").unwrap()).unwrap();
        assert_eq!(derivatives.ext, "png");
        assert_eq!(derivatives.dirs, vec![UNSORTED_DIR]);
        assert_eq!(derivatives.display_dims, (20, 10));
        assert_eq!(derivatives.thumbnail_dims, (20, 10));
        assert_eq!(
            image::image_dimensions(fixture.out.join("unsorted/thumbs/P2.png"))?,
            (20, 10)
        );
        Ok(())
    }

    #[test]
    fn test_asset_faults() -> Result<()> {
        let fixture = fixture()?;
        fs::write(fixture.images.join("broken.jpg"), b"definitely not a jpeg")?;
        fs::write(fixture.images.join("clip.mov"), b"video")?;
        image::RgbImage::new(10, 10).save(fixture.images.join("fine.jpg"))?;

        let export = Export {
            photos: vec![
                photo("P1", "fine.jpg"),
                photo("P2", "broken.jpg"),
                photo("P3", "clip.mov"),
                photo("P404", "gone.jpg"),
            ],
            ..Default::default()
        };
        let (graph, report, faults) = run(&fixture, export, false)?;

        assert_eq!(report.materialized(), 1);
        assert!(report.get(graph.photo_by_id("P1").unwrap()).is_some());
        let summary = faults.summary();
        assert_eq!(summary.kind_count(FaultKind::DecodeFailed), 1);
        assert_eq!(summary.kind_count(FaultKind::UnsupportedFormat), 1);
        assert_eq!(summary.kind_count(FaultKind::MissingSource), 1);
        assert!(!fixture.out.join("unsorted/P2.jpg").exists());
        Ok(())
    }

    #[test]
    fn test_stop_before_start_skips_everything() -> Result<()> {
        let fixture = fixture()?;
        image::RgbImage::new(10, 10).save(fixture.images.join("a.jpg"))?;

        let export = Export {
            photos: vec![photo("P1", "a.jpg")],
            ..Default::default()
        };
        let (_, report, _) = run(&fixture, export, true)?;

        assert!(report.cancelled());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.materialized(), 0);
        Ok(())
    }
}
