//! Records read from a Flickr export.
//!
//! These are the loader's output: every field already has its documented
//! default applied, but nothing is linked yet. `graph::EntityGraph` turns them
//! into the resolved structure the materializer and renderer share.

use chrono::{DateTime, NaiveDateTime};

/// Title used for photos and albums that have none
pub const UNTITLED: &str = "Untitled";

/// A single photo's metadata, from one `photo_<id>.json` file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhotoRecord {
    /// Unique identifier from the export
    pub id: String,
    /// Name of the source image file, if the record mentions one
    pub source_filename: Option<String>,
    /// Photo title (`UNTITLED` when missing)
    pub title: String,
    /// Free-form description (empty when missing)
    pub description: String,
    /// When the photo was taken or uploaded
    pub taken_at: Option<NaiveDateTime>,
    /// Tags in the order the export lists them
    pub tags: Vec<String>,
    /// View count (0 when missing)
    pub views: u64,
    /// How many times the photo was favorited (0 when missing)
    pub favorites: u64,
    /// Album identifiers the photo claims membership of
    pub album_refs: Vec<String>,
    /// Comments embedded in the photo record, in file order
    pub comments: Vec<CommentRecord>,
    /// Secondary metadata shown in the photo page's details sections
    pub details: PhotoDetails,
    /// The JSON file this record came from
    pub origin: String,
}

/// Everything else a Flickr photo record carries.
///
/// All of it is optional. Missing values stay `None` or empty and the
/// matching line is left off the photo page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhotoDetails {
    /// The photo's page on flickr.com
    pub photopage: Option<String>,
    /// Visibility at export time, e.g. "public" or "friends & family"
    pub privacy: Option<String>,
    /// License name as exported, e.g. "All Rights Reserved"
    pub license: Option<String>,
    /// Flickr user names of the people marked in the photo
    pub people: Vec<String>,
    /// Groups the photo was posted to
    pub groups: Vec<Group>,
    pub location: Option<Location>,
    /// EXIF entries from the JSON record, sorted by key
    pub exif: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub name: String,
    pub url: Option<String>,
}

/// Geotag as exported; coordinates are kept as written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub latitude: String,
    pub longitude: String,
    pub accuracy: Option<String>,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "latitude {}, longitude {}", self.latitude, self.longitude)?;
        if let Some(accuracy) = &self.accuracy {
            write!(f, ", accuracy {accuracy}")?;
        }
        Ok(())
    }
}

/// An album's metadata, from `albums.json` or an `album_<id>.json` file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlbumRecord {
    pub id: String,
    /// Album title (`UNTITLED` when missing)
    pub title: String,
    pub description: String,
    /// Photo identifiers in display order
    pub photo_ids: Vec<String>,
    /// Photo the export nominates as cover
    pub cover_photo_id: Option<String>,
    pub origin: String,
}

/// A comment on a photo
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentRecord {
    /// Identifier of the photo the comment belongs to
    pub photo_id: String,
    pub author: String,
    pub posted_at: Option<NaiveDateTime>,
    pub text: String,
}

/// Account owner details from `account_profile.json`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub real_name: String,
    pub description: String,
    pub city: Option<String>,
    pub hometown: Option<String>,
}

/// Parses the timestamp formats seen in exports.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, the `YYYY-MM-DD HH: MM: SS` variant some
/// exports contain, RFC 3339, and Unix epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H: %M: %S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }

    raw.parse::<i64>().ok().and_then(from_epoch)
}

/// Converts Unix epoch seconds to a naive UTC timestamp
pub fn from_epoch(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Formats a timestamp for display, e.g. "March 3, 2019"
pub fn nice_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_export_formats() {
        let plain = parse_timestamp("2019-03-02 14:05:09").unwrap();
        assert_eq!((plain.year(), plain.month(), plain.day()), (2019, 3, 2));
        assert_eq!((plain.hour(), plain.minute(), plain.second()), (14, 5, 9));

        let spaced = parse_timestamp("2019-03-02 14: 05: 09").unwrap();
        assert_eq!(spaced, plain);

        let rfc = parse_timestamp("2019-03-02T14:05:09Z").unwrap();
        assert_eq!(rfc, plain);
    }

    #[test]
    fn test_parse_epoch() {
        let parsed = parse_timestamp("1551535509").unwrap();
        assert_eq!(parsed, parse_timestamp("2019-03-02 14:05:09").unwrap());
        assert_eq!(from_epoch(0), parse_timestamp("1970-01-01 00:00:00"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("last tuesday").is_none());
        assert!(parse_timestamp("2019-13-45 99:00:00").is_none());
    }

    #[test]
    fn test_location_display() {
        let mut location = Location {
            latitude: "45.52".to_string(),
            longitude: "-122.68".to_string(),
            accuracy: Some("16".to_string()),
        };
        assert_eq!(
            location.to_string(),
            "latitude 45.52, longitude -122.68, accuracy 16"
        );
        location.accuracy = None;
        assert_eq!(location.to_string(), "latitude 45.52, longitude -122.68");
    }

    #[test]
    fn test_nice_date() {
        let ts = parse_timestamp("2019-03-02 14:05:09").unwrap();
        assert_eq!(nice_date(&ts), "March 2, 2019");
    }
}
