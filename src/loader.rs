//! Metadata loading for flickr-archive.
//!
//! Reads the flat directory of JSON files in an export and turns each one into
//! `PhotoRecord`, `AlbumRecord`, `CommentRecord` or `Profile` values. The
//! export format is not guaranteed, so the schema is lenient: every field is
//! optional, fields with the wrong shape are treated as missing, and each
//! missing field gets a documented default (see `model`). Faults are recorded
//! for files that are not JSON objects at all, records with no usable
//! identifier, and timestamps that are present but unreadable. None of them
//! stops the remaining files from loading.
//!
//! File naming follows the Flickr export:
//! - `photo_<id>.json`: one photo
//! - `albums.json`: all albums under an `"albums"` key
//! - `album_<id>.json`: one album
//! - `comments*.json`: standalone comments carrying a `photo_id`
//! - `account_profile.json`: the account owner
//!
//! Files are read in sorted filename order so "later-read" means the same
//! thing on every run.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::faults::{Fault, FaultCollector, FaultKind};
use crate::model::{
    AlbumRecord, CommentRecord, Group, Location, PhotoDetails, PhotoRecord, Profile, UNTITLED,
    from_epoch, parse_timestamp,
};

/// Author shown for comments that do not name one
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Everything read from an export's JSON directory
#[derive(Debug, Default)]
pub struct Export {
    /// Photo records in read order (duplicates included)
    pub photos: Vec<PhotoRecord>,
    /// Album records in read order (duplicates included)
    pub albums: Vec<AlbumRecord>,
    /// Comments from standalone comment files
    pub comments: Vec<CommentRecord>,
    pub profile: Option<Profile>,
    /// Number of JSON files that were recognised and read
    pub files_read: usize,
}

impl Export {
    /// Photo and album records loaded; comments alone do not make an archive
    pub fn record_count(&self) -> usize {
        self.photos.len() + self.albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordFile {
    Photo,
    Album,
    AlbumList,
    Comments,
    Profile,
}

fn classify(file_name: &str) -> Option<RecordFile> {
    let name = file_name.to_lowercase();
    if !name.ends_with(".json") {
        return None;
    }

    if name == "account_profile.json" {
        Some(RecordFile::Profile)
    } else if name == "albums.json" {
        Some(RecordFile::AlbumList)
    } else if name.starts_with("album_") {
        Some(RecordFile::Album)
    } else if name.starts_with("photo_") {
        Some(RecordFile::Photo)
    } else if name.starts_with("comments") {
        Some(RecordFile::Comments)
    } else {
        None
    }
}

/// Identifier embedded in a `photo_<id>.json` / `album_<id>.json` name
fn id_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let (_, id) = stem.split_once('_')?;
    let id = id.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Records that a record's identifier had to be taken from its file name
fn id_from_name_fault(id: &str, path: &Path, faults: &FaultCollector) {
    faults.record(
        Fault::new(
            FaultKind::MissingField,
            id,
            "record has no \"id\" field, using the identifier in the file name",
        )
        .with_file(path),
    );
}

/// Loads every recognised JSON file in `json_dir`.
///
/// Fails only when the directory itself cannot be read. Problems with
/// individual files are recorded in `faults`.
pub fn load_export(json_dir: &Path, faults: &FaultCollector) -> Result<Export> {
    let entries = fs::read_dir(json_dir)
        .with_context(|| format!("Failed to read JSON directory {}", json_dir.display()))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to list JSON directory {}", json_dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut export = Export::default();

    for path in &files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(kind) = classify(file_name) else {
            debug!("Ignoring {}", path.display());
            continue;
        };

        let Some(value) = read_json(path, faults) else {
            continue;
        };
        export.files_read += 1;

        match kind {
            RecordFile::Photo => {
                if let Some(photo) = photo_from_value(value, file_name, path, faults) {
                    export.photos.push(photo);
                }
            }
            RecordFile::Album => {
                let fallback_id = id_from_file_name(file_name);
                if let Some(album) =
                    album_from_value(value, fallback_id.as_deref(), file_name, path, faults)
                {
                    export.albums.push(album);
                }
            }
            RecordFile::AlbumList => {
                let entries = match value {
                    Value::Object(mut map) => map.remove("albums").unwrap_or(Value::Null),
                    other => other,
                };
                let Value::Array(entries) = entries else {
                    faults.record(
                        Fault::new(FaultKind::MalformedJson, "-", "expected an \"albums\" list")
                            .with_file(path),
                    );
                    continue;
                };
                for entry in entries {
                    if let Some(album) = album_from_value(entry, None, file_name, path, faults) {
                        export.albums.push(album);
                    }
                }
            }
            RecordFile::Comments => {
                let entries = match value {
                    Value::Object(mut map) => map.remove("comments").unwrap_or(Value::Null),
                    other => other,
                };
                let Value::Array(entries) = entries else {
                    faults.record(
                        Fault::new(FaultKind::MalformedJson, "-", "expected a \"comments\" list")
                            .with_file(path),
                    );
                    continue;
                };
                for entry in entries {
                    if let Some(comment) = standalone_comment(entry, path, faults) {
                        export.comments.push(comment);
                    }
                }
            }
            RecordFile::Profile => {
                if !value.is_object() {
                    faults.record(
                        Fault::new(FaultKind::MalformedJson, "profile", "expected an object")
                            .with_file(path),
                    );
                    continue;
                }
                match serde_json::from_value::<RawProfile>(value) {
                    Ok(raw) => export.profile = Some(raw.into_profile()),
                    Err(e) => faults.record(
                        Fault::new(FaultKind::MalformedJson, "profile", e.to_string())
                            .with_file(path),
                    ),
                }
            }
        }
    }

    info!(
        "Loaded {} photo, {} album and {} standalone comment records from {} files",
        export.photos.len(),
        export.albums.len(),
        export.comments.len(),
        export.files_read
    );

    Ok(export)
}

/// Reads and parses one file, recording a fault instead of failing
fn read_json(path: &Path, faults: &FaultCollector) -> Option<Value> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            faults.record(
                Fault::new(FaultKind::MalformedJson, "-", format!("could not read file: {e}"))
                    .with_file(path),
            );
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Some(value),
        // Exports contain raw newlines and tabs inside strings
        Err(first_error) => match serde_json::from_str::<Value>(&escape_control_chars(&text)) {
            Ok(value) => {
                debug!("Parsed {} after escaping control characters", path.display());
                Some(value)
            }
            Err(_) => {
                faults.record(
                    Fault::new(FaultKind::MalformedJson, "-", first_error.to_string())
                        .with_file(path),
                );
                None
            }
        },
    }
}

/// Escapes control characters that appear inside JSON string literals
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}

fn photo_from_value(
    value: Value,
    file_name: &str,
    path: &Path,
    faults: &FaultCollector,
) -> Option<PhotoRecord> {
    if !value.is_object() {
        faults.record(
            Fault::new(FaultKind::MalformedJson, "-", "expected a photo object").with_file(path),
        );
        return None;
    }
    let raw: RawPhoto = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            faults.record(Fault::new(FaultKind::MalformedJson, "-", e.to_string()).with_file(path));
            return None;
        }
    };

    let Some(id) = raw
        .id
        .as_ref()
        .and_then(IdRef::as_id)
        .or_else(|| {
            id_from_file_name(file_name).inspect(|id| id_from_name_fault(id, path, faults))
        })
    else {
        faults.record(
            Fault::new(FaultKind::MissingField, "-", "photo record has no identifier")
                .with_file(path),
        );
        return None;
    };

    let taken_at = resolve_timestamp(
        raw.date_taken
            .as_ref()
            .or(raw.timestamp.as_ref())
            .or(raw.date.as_ref()),
        &id,
        "date_taken",
        path,
        faults,
    )
    .or_else(|| resolve_timestamp(raw.date_imported.as_ref(), &id, "date_imported", path, faults));

    let mut favorites = raw
        .count_faves
        .as_ref()
        .or(raw.favorites.as_ref())
        .or(raw.faves.as_ref())
        .map(Count::value)
        .unwrap_or(0);
    if raw.favorite == Some(true) && favorites == 0 {
        favorites = 1;
    }

    let comments = raw
        .comments
        .iter()
        .map(|comment| comment.to_record(&id, path, faults))
        .collect();

    Some(PhotoRecord {
        source_filename: raw
            .original
            .as_deref()
            .or(raw.filename.as_deref())
            .or(raw.source.as_deref())
            .and_then(basename),
        title: non_empty(raw.name.or(raw.title)).unwrap_or_else(|| UNTITLED.to_string()),
        description: raw.description.unwrap_or_default(),
        taken_at,
        tags: raw
            .tags
            .into_iter()
            .map(RawTag::into_name)
            .filter(|tag| !tag.trim().is_empty())
            .collect(),
        views: raw
            .count_views
            .as_ref()
            .or(raw.views.as_ref())
            .or(raw.view_count.as_ref())
            .map(Count::value)
            .unwrap_or(0),
        favorites,
        album_refs: raw.albums.iter().filter_map(RawRef::as_id).collect(),
        comments,
        details: PhotoDetails {
            photopage: non_empty(raw.photopage),
            privacy: raw.privacy.as_ref().and_then(Scalar::text),
            license: raw.license.as_ref().and_then(Scalar::text),
            people: raw
                .people
                .into_iter()
                .map(RawPerson::into_name)
                .filter(|person| !person.trim().is_empty())
                .collect(),
            groups: raw.groups.into_iter().filter_map(RawGroup::into_group).collect(),
            location: raw.geo.and_then(location_from),
            exif: raw.exif.map(exif_entries).unwrap_or_default(),
        },
        origin: file_name.to_string(),
        id,
    })
}

/// Flattens the record's `exif` object into display strings, sorted by key
fn exif_entries(exif: serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = exif
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(text) => text,
                other => other.to_string(),
            };
            let text = text.trim().to_string();
            if text.is_empty() { None } else { Some((key, text)) }
        })
        .collect();
    entries.sort();
    entries
}

fn album_from_value(
    value: Value,
    fallback_id: Option<&str>,
    file_name: &str,
    path: &Path,
    faults: &FaultCollector,
) -> Option<AlbumRecord> {
    if !value.is_object() {
        faults.record(
            Fault::new(FaultKind::MalformedJson, "-", "expected an album object").with_file(path),
        );
        return None;
    }
    let raw: RawAlbum = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            faults.record(Fault::new(FaultKind::MalformedJson, "-", e.to_string()).with_file(path));
            return None;
        }
    };

    let Some(id) = raw
        .id
        .as_ref()
        .and_then(IdRef::as_id)
        .or_else(|| {
            fallback_id
                .map(str::to_string)
                .inspect(|id| id_from_name_fault(id, path, faults))
        })
    else {
        faults.record(
            Fault::new(FaultKind::MissingField, "-", "album record has no identifier")
                .with_file(path),
        );
        return None;
    };

    Some(AlbumRecord {
        title: non_empty(raw.title).unwrap_or_else(|| UNTITLED.to_string()),
        description: raw.description.unwrap_or_default(),
        photo_ids: raw
            .photos
            .iter()
            .filter_map(IdRef::as_id)
            // Flickr pads photo lists with "0"
            .filter(|photo_id| photo_id != "0")
            .collect(),
        cover_photo_id: raw
            .cover_photo
            .as_ref()
            .or(raw.cover_photo_id.as_ref())
            .and_then(IdRef::as_id)
            .and_then(|cover| basename(&cover)),
        origin: file_name.to_string(),
        id,
    })
}

fn standalone_comment(value: Value, path: &Path, faults: &FaultCollector) -> Option<CommentRecord> {
    if !value.is_object() {
        faults.record(
            Fault::new(FaultKind::MalformedJson, "-", "expected a comment object").with_file(path),
        );
        return None;
    }
    let raw: RawComment = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            faults.record(Fault::new(FaultKind::MalformedJson, "-", e.to_string()).with_file(path));
            return None;
        }
    };

    let Some(photo_id) = raw.photo_id.as_ref().and_then(IdRef::as_id) else {
        faults.record(
            Fault::new(FaultKind::MissingField, "-", "comment has no photo_id").with_file(path),
        );
        return None;
    };

    Some(raw.to_record(&photo_id, path, faults))
}

/// Parses an optional raw timestamp, recording a fault when it is present but unusable
fn resolve_timestamp(
    raw: Option<&RawTimestamp>,
    subject: &str,
    field: &str,
    path: &Path,
    faults: &FaultCollector,
) -> Option<chrono::NaiveDateTime> {
    let raw = raw?;
    let parsed = match raw {
        RawTimestamp::Epoch(seconds) => from_epoch(*seconds),
        RawTimestamp::Text(text) if text.trim().is_empty() => return None,
        RawTimestamp::Text(text) => parse_timestamp(text),
    };
    if parsed.is_none() {
        faults.record(
            Fault::new(
                FaultKind::InvalidField,
                subject,
                format!("unrecognised {field} value {raw:?}"),
            )
            .with_file(path),
        );
    }
    parsed
}

/// Last path segment of a URL or path, without any query string
fn basename(reference: &str) -> Option<String> {
    let without_query = reference.split(['?', '#']).next().unwrap_or(reference);
    let name = without_query.trim_end_matches('/').rsplit('/').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Deserializes a `T`, treating a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserializes a list, keeping only the elements that have the right shape
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Identifiers appear as strings or bare numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdRef {
    Text(String),
    Number(u64),
}

impl IdRef {
    fn as_id(&self) -> Option<String> {
        let id = match self {
            IdRef::Text(text) => text.trim().to_string(),
            IdRef::Number(number) => number.to_string(),
        };
        if id.is_empty() { None } else { Some(id) }
    }
}

/// Counts appear as numbers or numeric strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    fn value(&self) -> u64 {
        match self {
            Count::Number(n) => *n,
            Count::Text(text) => text.trim().replace(',', "").parse().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTag {
    Plain(String),
    Entry { tag: String },
}

impl RawTag {
    fn into_name(self) -> String {
        match self {
            RawTag::Plain(tag) | RawTag::Entry { tag } => tag,
        }
    }
}

/// Album membership appears as bare ids or `{"id": ...}` objects
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRef {
    Id(IdRef),
    Entry { id: IdRef },
}

impl RawRef {
    fn as_id(&self) -> Option<String> {
        match self {
            RawRef::Id(id) | RawRef::Entry { id } => id.as_id(),
        }
    }
}

/// Free-form values that may be written as strings or numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn text(&self) -> Option<String> {
        let text = match self {
            Scalar::Text(text) => text.trim().to_string(),
            Scalar::Number(number) => number.to_string(),
        };
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPerson {
    Plain(String),
    Entry { person: String },
}

impl RawPerson {
    fn into_name(self) -> String {
        match self {
            RawPerson::Plain(person) | RawPerson::Entry { person } => person,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawGroup {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
}

impl RawGroup {
    fn into_group(self) -> Option<Group> {
        let url = non_empty(self.url);
        let name = non_empty(self.name).or_else(|| url.clone())?;
        Some(Group { name, url })
    }
}

/// Reads `geo`, which is an object in some exports and a list of them in others
fn location_from(geo: Value) -> Option<Location> {
    match geo {
        Value::Array(points) => points.into_iter().find_map(location_from),
        Value::Object(_) => serde_json::from_value::<RawGeoPoint>(geo)
            .ok()
            .and_then(RawGeoPoint::into_location),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawGeoPoint {
    #[serde(default, deserialize_with = "lenient")]
    latitude: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient")]
    longitude: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient")]
    accuracy: Option<Scalar>,
}

impl RawGeoPoint {
    fn into_location(self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude.as_ref().and_then(Scalar::text)?,
            longitude: self.longitude.as_ref().and_then(Scalar::text)?,
            accuracy: self.accuracy.as_ref().and_then(Scalar::text),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPhoto {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<IdRef>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date_taken: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    timestamp: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    date: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    date_imported: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient_list")]
    tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "lenient")]
    count_views: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    views: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    view_count: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    count_faves: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    favorites: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    faves: Option<Count>,
    #[serde(default, deserialize_with = "lenient")]
    favorite: Option<bool>,
    #[serde(default, deserialize_with = "lenient_list")]
    albums: Vec<RawRef>,
    #[serde(default, deserialize_with = "lenient_list")]
    comments: Vec<RawComment>,
    #[serde(default, deserialize_with = "lenient")]
    original: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    filename: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    photopage: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    privacy: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient")]
    license: Option<Scalar>,
    #[serde(default, deserialize_with = "lenient_list")]
    people: Vec<RawPerson>,
    #[serde(default, deserialize_with = "lenient_list")]
    groups: Vec<RawGroup>,
    #[serde(default)]
    geo: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    exif: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAlbum {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<IdRef>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    photos: Vec<IdRef>,
    #[serde(default, deserialize_with = "lenient")]
    cover_photo: Option<IdRef>,
    #[serde(default, deserialize_with = "lenient")]
    cover_photo_id: Option<IdRef>,
}

#[derive(Debug, Default, Deserialize)]
struct RawComment {
    #[serde(default, deserialize_with = "lenient")]
    photo_id: Option<IdRef>,
    #[serde(default, deserialize_with = "lenient")]
    user: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    date: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    timestamp: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    comment: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
}

impl RawComment {
    fn to_record(&self, photo_id: &str, path: &Path, faults: &FaultCollector) -> CommentRecord {
        CommentRecord {
            photo_id: photo_id.to_string(),
            author: non_empty(self.user.clone().or_else(|| self.author.clone()))
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            posted_at: resolve_timestamp(
                self.date.as_ref().or(self.timestamp.as_ref()),
                photo_id,
                "comment date",
                path,
                faults,
            ),
            text: self
                .comment
                .clone()
                .or_else(|| self.text.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    #[serde(default, deserialize_with = "lenient")]
    real_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    screen_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    city: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    hometown: Option<String>,
}

impl RawProfile {
    fn into_profile(self) -> Profile {
        Profile {
            real_name: non_empty(self.real_name)
                .or_else(|| non_empty(self.screen_name))
                .unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            city: non_empty(self.city),
            hometown: non_empty(self.hometown),
        }
    }
}
