//! Camera details read from a source image's EXIF block.
//!
//! Flickr exports keep the original files untouched, so the EXIF data is
//! usually still there. The renderer shows the camera and exposure on the
//! photo page, and falls back to the EXIF capture time when the JSON record
//! has no date.

use chrono::NaiveDateTime;
use exif::{Exif, In, Tag, Value};
use log::debug;
use std::io::Cursor;

/// The EXIF fields an archive page displays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifSummary {
    /// Make of the camera (e.g., "Canon")
    pub camera_make: Option<String>,
    /// Model of the camera (e.g., "Canon EOS 5D")
    pub camera_model: Option<String>,
    /// When the photo was taken, in camera local time
    pub date_time: Option<NaiveDateTime>,
    /// Exposure time (e.g., "1/125")
    pub exposure_time: Option<String>,
    /// Aperture as an f-number (e.g., 2.8)
    pub f_number: Option<f32>,
    /// ISO speed rating
    pub iso: Option<u32>,
}

impl ExifSummary {
    pub fn is_empty(&self) -> bool {
        *self == ExifSummary::default()
    }

    /// Camera name for display, avoiding "Canon Canon EOS 5D"
    pub fn camera(&self) -> Option<String> {
        match (&self.camera_make, &self.camera_model) {
            (Some(make), Some(model)) if model.starts_with(make.as_str()) => Some(model.clone()),
            (Some(make), Some(model)) => Some(format!("{make} {model}")),
            (None, Some(model)) => Some(model.clone()),
            (Some(make), None) => Some(make.clone()),
            (None, None) => None,
        }
    }

    /// Exposure settings for display, e.g. "1/125s f/2.8 ISO 200"
    pub fn exposure(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(ref time) = self.exposure_time {
            parts.push(format!("{time}s"));
        }
        if let Some(f_number) = self.f_number {
            parts.push(format!("f/{f_number:.1}"));
        }
        if let Some(iso) = self.iso {
            parts.push(format!("ISO {iso}"));
        }
        if parts.is_empty() { None } else { Some(parts.join(" ")) }
    }
}

/// Reads EXIF data from an image already loaded into memory.
///
/// Files without EXIF (PNGs, screenshots, stripped uploads) yield an empty
/// summary.
pub fn read_exif(bytes: &[u8]) -> ExifSummary {
    let mut summary = ExifSummary::default();

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No usable EXIF data: {}", e);
            return summary;
        }
    };

    summary.camera_make = get_exif_string(&exif, Tag::Make);
    summary.camera_model = get_exif_string(&exif, Tag::Model);
    summary.date_time = get_exif_string(&exif, Tag::DateTimeOriginal)
        .or_else(|| get_exif_string(&exif, Tag::DateTime))
        .and_then(|raw| parse_exif_datetime(&raw));
    summary.exposure_time = get_exif_rational_as_string(&exif, Tag::ExposureTime);
    summary.f_number = get_exif_f32(&exif, Tag::FNumber);
    summary.iso = get_exif_u32(&exif, Tag::PhotographicSensitivity);

    summary
}

fn get_exif_string(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Ascii(ref vec) = field.value else {
        return None;
    };
    let value = String::from_utf8_lossy(vec.first()?)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn get_exif_u32(exif: &Exif, tag: Tag) -> Option<u32> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Short(vec) => vec.first().map(|&v| u32::from(v)),
        Value::Long(vec) => vec.first().copied(),
        _ => None,
    }
}

fn get_exif_f32(exif: &Exif, tag: Tag) -> Option<f32> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(vec) => vec.first().filter(|r| r.denom != 0).map(|r| r.to_f32()),
        _ => None,
    }
}

fn get_exif_rational_as_string(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(ref vec) = field.value else {
        return None;
    };
    let rational = vec.first()?;
    format_rational(rational.num, rational.denom)
}

/// Formats an exposure time as photographers write it
fn format_rational(num: u32, denom: u32) -> Option<String> {
    if denom == 0 {
        return None;
    }
    let formatted = if denom == 1 {
        num.to_string()
    } else if num == 0 {
        "0".to_string()
    } else if denom % num == 0 {
        format!("1/{}", denom / num)
    } else {
        format!("{num}/{denom}")
    };
    Some(formatted)
}

/// Parses the EXIF date format "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S").ok()
}
