//! The resolved entity graph.
//!
//! `EntityGraph::build` joins the loader's flat records into one read-only
//! structure. Photos and albums live in arenas (`Vec`s) addressed by
//! `PhotoKey`/`AlbumKey`, with identifier maps on the side. Building happens
//! in two passes: first every record is placed in its arena, then album
//! contents and comments are resolved against the complete maps, so the order
//! in which files were discovered does not matter.
//!
//! Resolution rules:
//! - duplicate photo/album identifiers: the later-read record wins (fault)
//! - album entries naming a missing photo are dropped (fault)
//! - comments naming a missing photo are dropped (fault)
//! - albums with no resolvable photos are kept
//! - the album's photo order is the declared order; repeats keep the first position
//! - comments are sorted chronologically, undated comments last in file order
//! - identifiers that map to the same file or directory name get a numbered
//!   suffix (fault), compared case-insensitively
//!
//! After `build` returns nothing mutates the graph; the materializer workers
//! and the renderer share it by reference.

use log::debug;
use slugify::slugify;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::faults::{Fault, FaultCollector, FaultKind};
use crate::layout::{OutputLayout, path_component};
use crate::loader::Export;
use crate::model::{AlbumRecord, CommentRecord, PhotoDetails, PhotoRecord, Profile};

/// Index of a photo in the graph's photo arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhotoKey(usize);

/// Index of an album in the graph's album arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlbumKey(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub photo_id: String,
    pub author: String,
    pub posted_at: Option<NaiveDateTime>,
    pub text: String,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            photo_id: record.photo_id,
            author: record.author,
            posted_at: record.posted_at,
            text: record.text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Photo {
    pub id: String,
    /// File stem for this photo's derivatives and page, unique in the graph
    pub file_name: String,
    pub source_filename: Option<String>,
    pub title: String,
    pub description: String,
    pub taken_at: Option<NaiveDateTime>,
    pub tags: Vec<String>,
    pub views: u64,
    pub favorites: u64,
    /// Albums that list this photo, in album display order
    pub albums: Vec<AlbumKey>,
    /// Comments in chronological order
    pub comments: Vec<Comment>,
    pub details: PhotoDetails,
}

impl Photo {
    pub fn is_favorite(&self) -> bool {
        self.favorites > 0
    }
}

#[derive(Debug, Clone)]
pub struct Album {
    pub id: String,
    /// Directory for the album's derivatives and name of its page, unique in the graph
    pub dir_name: String,
    pub title: String,
    pub description: String,
    /// Resolved photos in declared order
    pub photos: Vec<PhotoKey>,
    /// Declared cover if it resolves, otherwise the first photo
    pub cover: Option<PhotoKey>,
}

/// Photos sharing a tag, grouped case-insensitively by URL slug
#[derive(Debug, Clone)]
pub struct TagGroup {
    pub slug: String,
    /// Spelling of the tag as first seen
    pub name: String,
    pub photos: Vec<PhotoKey>,
}

#[derive(Debug, Default)]
pub struct EntityGraph {
    photos: Vec<Photo>,
    albums: Vec<Album>,
    photo_index: HashMap<String, PhotoKey>,
    album_index: HashMap<String, AlbumKey>,
    tags: Vec<TagGroup>,
    profile: Option<Profile>,
}

impl EntityGraph {
    /// Builds the graph from loaded records, recording resolution problems in `faults`
    pub fn build(export: Export, faults: &FaultCollector) -> Self {
        let Export {
            photos: photo_records,
            albums: album_records,
            comments: standalone_comments,
            profile,
            ..
        } = export;

        // Pass one: place every record, later duplicates replacing earlier ones
        let photo_records = dedupe(photo_records, |p| &p.id, |p| &p.origin, "photo", faults);
        let album_records = dedupe(album_records, |a| &a.id, |a| &a.origin, "album", faults);

        let mut photo_records: Vec<PhotoRecord> = photo_records.into_values().collect();
        photo_records.sort_by(|a, b| a.id.cmp(&b.id));

        let mut album_records: Vec<AlbumRecord> = album_records.into_values().collect();
        album_records.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut graph = EntityGraph {
            profile,
            ..Default::default()
        };

        let mut declared_albums: Vec<Vec<String>> = Vec::with_capacity(photo_records.len());
        for (i, record) in photo_records.into_iter().enumerate() {
            graph.photo_index.insert(record.id.clone(), PhotoKey(i));
            declared_albums.push(record.album_refs);
            graph.photos.push(Photo {
                file_name: path_component(&record.id),
                id: record.id,
                source_filename: record.source_filename,
                title: record.title,
                description: record.description,
                taken_at: record.taken_at,
                tags: record.tags,
                views: record.views,
                favorites: record.favorites,
                albums: Vec::new(),
                comments: record.comments.into_iter().map(Comment::from).collect(),
                details: record.details,
            });
        }

        let mut declared_content: Vec<(Vec<String>, Option<String>)> =
            Vec::with_capacity(album_records.len());
        for (i, record) in album_records.into_iter().enumerate() {
            graph.album_index.insert(record.id.clone(), AlbumKey(i));
            declared_content.push((record.photo_ids, record.cover_photo_id));
            graph.albums.push(Album {
                dir_name: OutputLayout::album_dir_name(&record.id),
                id: record.id,
                title: record.title,
                description: record.description,
                photos: Vec::new(),
                cover: None,
            });
        }

        disambiguate(
            graph.photos.iter_mut().map(|p| (p.id.as_str(), &mut p.file_name)),
            "photo",
            faults,
        );
        disambiguate(
            graph.albums.iter_mut().map(|a| (a.id.as_str(), &mut a.dir_name)),
            "album",
            faults,
        );

        // Pass two: resolve links against the complete maps
        for (i, (photo_ids, cover_id)) in declared_content.into_iter().enumerate() {
            graph.resolve_album(AlbumKey(i), photo_ids, cover_id, faults);
        }

        for (i, album_refs) in declared_albums.iter().enumerate() {
            let photo = &graph.photos[i];
            for album_id in album_refs {
                match graph.album_index.get(album_id) {
                    None => debug!("Photo {} names unknown album {}", photo.id, album_id),
                    Some(key) if !photo.albums.contains(key) => debug!(
                        "Photo {} claims album {} but the album does not list it",
                        photo.id, album_id
                    ),
                    Some(_) => {}
                }
            }
        }

        for comment in standalone_comments {
            match graph.photo_index.get(&comment.photo_id) {
                Some(&key) => graph.photos[key.0].comments.push(Comment::from(comment)),
                None => faults.record(Fault::new(
                    FaultKind::DanglingReference,
                    comment.photo_id.clone(),
                    format!("comment by {} refers to a photo that does not exist", comment.author),
                )),
            }
        }

        for photo in &mut graph.photos {
            // Stable: undated comments keep their file order after dated ones
            photo
                .comments
                .sort_by_key(|comment| (comment.posted_at.is_none(), comment.posted_at));
        }

        graph.tags = group_tags(&graph.photos);

        graph
    }

    fn resolve_album(
        &mut self,
        key: AlbumKey,
        photo_ids: Vec<String>,
        cover_id: Option<String>,
        faults: &FaultCollector,
    ) {
        let album_id = self.albums[key.0].id.clone();
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(photo_ids.len());

        for photo_id in photo_ids {
            let Some(&photo_key) = self.photo_index.get(&photo_id) else {
                faults.record(Fault::new(
                    FaultKind::DanglingReference,
                    album_id.clone(),
                    format!("album lists photo {photo_id}, which does not exist"),
                ));
                continue;
            };
            if !seen.insert(photo_key) {
                debug!("Album {album_id} lists photo {photo_id} more than once");
                continue;
            }
            resolved.push(photo_key);
            self.photos[photo_key.0].albums.push(key);
        }

        let declared_cover = cover_id
            .as_ref()
            .and_then(|id| self.photo_index.get(id).copied());
        if cover_id.is_some() && declared_cover.is_none() {
            debug!("Album {album_id} cover photo does not exist, using the first photo");
        }

        let album = &mut self.albums[key.0];
        album.cover = declared_cover.or_else(|| resolved.first().copied());
        album.photos = resolved;
    }

    pub fn photo(&self, key: PhotoKey) -> &Photo {
        &self.photos[key.0]
    }

    pub fn album(&self, key: AlbumKey) -> &Album {
        &self.albums[key.0]
    }

    pub fn photo_by_id(&self, id: &str) -> Option<PhotoKey> {
        self.photo_index.get(id).copied()
    }

    pub fn album_by_id(&self, id: &str) -> Option<AlbumKey> {
        self.album_index.get(id).copied()
    }

    /// Photos in identifier order
    pub fn photos(&self) -> impl Iterator<Item = (PhotoKey, &Photo)> {
        self.photos
            .iter()
            .enumerate()
            .map(|(i, photo)| (PhotoKey(i), photo))
    }

    /// Albums in display order (title, then identifier)
    pub fn albums(&self) -> impl Iterator<Item = (AlbumKey, &Album)> {
        self.albums
            .iter()
            .enumerate()
            .map(|(i, album)| (AlbumKey(i), album))
    }

    /// Tags by photo count (descending), then name
    pub fn tags(&self) -> &[TagGroup] {
        &self.tags
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn album_count(&self) -> usize {
        self.albums.len()
    }

    pub fn comment_count(&self) -> usize {
        self.photos.iter().map(|p| p.comments.len()).sum()
    }

    /// Photos that no album lists
    pub fn unsorted_photos(&self) -> Vec<PhotoKey> {
        self.photos()
            .filter(|(_, photo)| photo.albums.is_empty())
            .map(|(key, _)| key)
            .collect()
    }
}

/// Keeps the last record per identifier, recording a fault for each replaced one
fn dedupe<T>(
    records: Vec<T>,
    id_of: impl Fn(&T) -> &String,
    origin_of: impl Fn(&T) -> &String,
    noun: &str,
    faults: &FaultCollector,
) -> HashMap<String, T> {
    let mut by_id: HashMap<String, T> = HashMap::with_capacity(records.len());
    for record in records {
        let id = id_of(&record).clone();
        let origin = origin_of(&record).clone();
        if let Some(previous) = by_id.insert(id.clone(), record) {
            faults.record(
                Fault::new(
                    FaultKind::DuplicateId,
                    id,
                    format!(
                        "{noun} identifier also declared in {}; keeping the later record",
                        origin_of(&previous)
                    ),
                )
                .with_file(origin),
            );
        }
    }
    by_id
}

/// Suffixes path names that clash with an earlier one, recording a fault for each.
///
/// Names are compared lowercased so the output also works on case-insensitive
/// file systems.
fn disambiguate<'a>(
    entries: impl Iterator<Item = (&'a str, &'a mut String)>,
    noun: &str,
    faults: &FaultCollector,
) {
    let mut taken: HashMap<String, String> = HashMap::new();
    for (id, name) in entries {
        let base = name.clone();
        let mut n = 2;
        while taken.contains_key(&name.to_lowercase()) {
            *name = format!("{base}-{n}");
            n += 1;
        }
        if *name != base {
            let owner = taken.get(&base.to_lowercase()).cloned().unwrap_or_default();
            faults.record(Fault::new(
                FaultKind::DuplicateId,
                id,
                format!("{noun} path name {base} is already used by {owner}; writing to {name}"),
            ));
        }
        taken.insert(name.to_lowercase(), id.to_string());
    }
}

/// URL slug a tag is grouped and linked under
pub fn tag_slug(tag: &str) -> String {
    let slug = slugify!(tag);
    if slug.is_empty() {
        path_component(&tag.to_lowercase())
    } else {
        slug
    }
}

fn group_tags(photos: &[Photo]) -> Vec<TagGroup> {
    let mut groups: BTreeMap<String, TagGroup> = BTreeMap::new();

    for (i, photo) in photos.iter().enumerate() {
        for tag in &photo.tags {
            let slug = tag_slug(tag);
            let group = groups.entry(slug.clone()).or_insert_with(|| TagGroup {
                slug,
                name: tag.clone(),
                photos: Vec::new(),
            });
            if group.photos.last() != Some(&PhotoKey(i)) {
                group.photos.push(PhotoKey(i));
            }
        }
    }

    let mut tags: Vec<TagGroup> = groups.into_values().collect();
    tags.sort_by(|a, b| {
        b.photos
            .len()
            .cmp(&a.photos.len())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.slug.cmp(&b.slug))
    });
    tags
}
