//! Non-fatal problems found while building an archive.
//!
//! A `Fault` describes one record or asset that could not be used as-is. Every
//! stage gets a shared `FaultCollector` and pushes faults into it instead of
//! returning errors, so one bad file never stops the rest of the export from
//! being processed. The collector is `Sync` and is written to from the image
//! workers directly.
//!
//! At the end of a run the orchestrator appends the collected faults to the
//! run log with `FaultCollector::write_run_log`.

use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Which part of the export a fault belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaultCategory {
    /// A JSON record was malformed, duplicated, or referenced something missing
    Record,
    /// A source image was missing or could not be decoded
    Asset,
    /// Something could not be written to the output tree
    Output,
}

impl FaultCategory {
    pub fn label(self) -> &'static str {
        match self {
            FaultCategory::Record => "record",
            FaultCategory::Asset => "asset",
            FaultCategory::Output => "output",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaultKind {
    /// The file is not valid JSON, or not the expected record shape
    MalformedJson,
    /// A record lacks a field it cannot do without (its identifier)
    MissingField,
    /// A field is present but unusable (e.g. an unparseable timestamp)
    InvalidField,
    /// Two records declare the same identifier
    DuplicateId,
    /// An album or comment points at a photo that does not exist
    DanglingReference,
    /// No source image could be found for a photo
    MissingSource,
    /// The source image is not a format we can resize (e.g. video)
    UnsupportedFormat,
    /// The source image could not be decoded
    DecodeFailed,
    /// A derivative or page could not be written
    WriteFailed,
}

impl FaultKind {
    pub fn category(self) -> FaultCategory {
        match self {
            FaultKind::MalformedJson
            | FaultKind::MissingField
            | FaultKind::InvalidField
            | FaultKind::DuplicateId
            | FaultKind::DanglingReference => FaultCategory::Record,
            FaultKind::MissingSource | FaultKind::UnsupportedFormat | FaultKind::DecodeFailed => {
                FaultCategory::Asset
            }
            FaultKind::WriteFailed => FaultCategory::Output,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FaultKind::MalformedJson => "malformed-json",
            FaultKind::MissingField => "missing-field",
            FaultKind::InvalidField => "invalid-field",
            FaultKind::DuplicateId => "duplicate-id",
            FaultKind::DanglingReference => "dangling-reference",
            FaultKind::MissingSource => "missing-source",
            FaultKind::UnsupportedFormat => "unsupported-format",
            FaultKind::DecodeFailed => "decode-failed",
            FaultKind::WriteFailed => "write-failed",
        }
    }
}

/// One recorded problem, with enough context to find it in the export
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fault {
    pub kind: FaultKind,
    /// Identifier of the photo/album the fault concerns, or "-" if unknown
    pub subject: String,
    /// The file involved, if any
    pub file: Option<PathBuf>,
    pub detail: String,
}

impl Fault {
    pub fn new(kind: FaultKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            file: None,
            detail: detail.into(),
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind.category().label(),
            self.kind.label(),
            self.subject
        )?;
        if let Some(ref file) = self.file {
            write!(f, " ({})", file.display())?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Fault totals, broken down by category and kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultSummary {
    pub total: usize,
    pub by_category: BTreeMap<FaultCategory, usize>,
    pub by_kind: BTreeMap<FaultKind, usize>,
}

impl FaultSummary {
    pub fn is_clean(&self) -> bool {
        self.total == 0
    }

    pub fn category_count(&self, category: FaultCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn kind_count(&self, kind: FaultKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for FaultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fault(s): {} record, {} asset, {} output",
            self.total,
            self.category_count(FaultCategory::Record),
            self.category_count(FaultCategory::Asset),
            self.category_count(FaultCategory::Output)
        )
    }
}

/// Thread-safe accumulator for faults found during one run
#[derive(Debug, Default)]
pub struct FaultCollector {
    faults: Mutex<Vec<Fault>>,
}

impl FaultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault and logs it as a warning
    pub fn record(&self, fault: Fault) {
        warn!("{fault}");
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    pub fn count(&self) -> usize {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// All faults so far, in a stable order regardless of which worker recorded them
    pub fn faults(&self) -> Vec<Fault> {
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        faults.sort();
        faults
    }

    pub fn summary(&self) -> FaultSummary {
        let mut summary = FaultSummary::default();
        for fault in self.faults() {
            summary.total += 1;
            *summary
                .by_category
                .entry(fault.kind.category())
                .or_insert(0) += 1;
            *summary.by_kind.entry(fault.kind).or_insert(0) += 1;
        }
        summary
    }

    /// Appends this run's faults to the run log at `path`
    pub fn write_run_log(&self, path: &Path, headline: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for {}", path.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;
        let mut out = BufWriter::new(file);

        writeln!(
            out,
            "=== {} {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            headline
        )?;
        for fault in self.faults() {
            writeln!(out, "{fault}")?;
        }
        writeln!(out, "{}", self.summary())?;
        writeln!(out)?;
        out.flush()
            .with_context(|| format!("Failed to write run log {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_kinds_map_to_categories() {
        assert_eq!(FaultKind::MalformedJson.category(), FaultCategory::Record);
        assert_eq!(FaultKind::DanglingReference.category(), FaultCategory::Record);
        assert_eq!(FaultKind::MissingSource.category(), FaultCategory::Asset);
        assert_eq!(FaultKind::DecodeFailed.category(), FaultCategory::Asset);
        assert_eq!(FaultKind::WriteFailed.category(), FaultCategory::Output);
    }

    #[test]
    fn test_fault_display_includes_context() {
        let fault = Fault::new(FaultKind::MissingSource, "P404", "no image file matches")
            .with_file("P404.jpg");
        let line = fault.to_string();

        assert!(line.starts_with("[asset] missing-source: P404"));
        assert!(line.contains("P404.jpg"));
        assert!(line.ends_with("no image file matches"));
    }

    #[test]
    fn test_collector_is_shared_across_threads() {
        let collector = Arc::new(FaultCollector::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    collector.record(Fault::new(
                        FaultKind::DecodeFailed,
                        format!("photo{i}"),
                        "bad data",
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.count(), 4);
        let subjects: Vec<_> = collector.faults().into_iter().map(|f| f.subject).collect();
        assert_eq!(subjects, vec!["photo0", "photo1", "photo2", "photo3"]);
    }

    #[test]
    fn test_summary_counts() {
        let collector = FaultCollector::new();
        collector.record(Fault::new(FaultKind::MalformedJson, "-", "eof"));
        collector.record(Fault::new(FaultKind::DuplicateId, "P1", "seen twice"));
        collector.record(Fault::new(FaultKind::MissingSource, "P2", "gone"));

        let summary = collector.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.category_count(FaultCategory::Record), 2);
        assert_eq!(summary.category_count(FaultCategory::Asset), 1);
        assert_eq!(summary.category_count(FaultCategory::Output), 0);
        assert_eq!(summary.kind_count(FaultKind::DuplicateId), 1);
        assert!(!summary.is_clean());
        assert!(FaultCollector::new().summary().is_clean());
    }

    #[test]
    fn test_run_log_appends() -> Result<()> {
        let temp_dir = tempdir()?;
        let log_path = temp_dir.path().join("logs").join("archive.log");

        let first = FaultCollector::new();
        first.record(Fault::new(FaultKind::MissingSource, "P404", "missing"));
        first.write_run_log(&log_path, "first run")?;

        let second = FaultCollector::new();
        second.write_run_log(&log_path, "second run")?;

        let log = fs::read_to_string(&log_path)?;
        assert!(log.contains("first run"));
        assert!(log.contains("[asset] missing-source: P404"));
        assert!(log.contains("second run"));
        assert!(log.contains("0 fault(s)"));
        assert!(log.find("first run") < log.find("second run"));

        Ok(())
    }
}
