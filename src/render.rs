//! Static site generation.
//!
//! `SiteRenderer` walks the entity graph and writes plain HTML under
//! `<out>/site/`. Every link is relative, so the output tree can be moved or
//! opened straight from disk. Images are referenced only when the
//! materializer reports them as written: grids leave such photos out and the
//! photo page shows a placeholder instead.
//!
//! Pages contain nothing that changes between runs, so rendering the same
//! export twice produces identical files.

use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::HashSet;
use std::fs;

use crate::exif::ExifSummary;
use crate::faults::{Fault, FaultCollector, FaultKind};
use crate::graph::{AlbumKey, EntityGraph, Photo, PhotoKey, tag_slug};
use crate::html::{STYLE_CSS, escape_html, multiline, page, tile};
use crate::layout::{DerivativeKind, OutputLayout, TAG_INDEX_PAGE, write_atomic};
use crate::materialize::MaterializeReport;
use crate::model::nice_date;

/// Photos listed on the most-viewed page
pub const POPULAR_LIMIT: usize = 100;

/// Relative path from a page one directory below `site/` back to it
const UP: &str = "../";

/// Profile pages of people marked in a photo live under this prefix
const FLICKR_PEOPLE_URL: &str = "https://www.flickr.com/photos/";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// Pages (and the stylesheet) written
    pub pages: usize,
    /// Pages that could not be written
    pub failed: usize,
}

pub struct SiteRenderer<'a> {
    graph: &'a EntityGraph,
    images: &'a MaterializeReport,
    layout: &'a OutputLayout,
}

impl<'a> SiteRenderer<'a> {
    pub fn new(
        graph: &'a EntityGraph,
        images: &'a MaterializeReport,
        layout: &'a OutputLayout,
    ) -> Self {
        Self {
            graph,
            images,
            layout,
        }
    }

    /// Regenerates the whole site directory
    pub fn render(&self, faults: &FaultCollector) -> Result<RenderReport> {
        let site_dir = self.layout.site_dir();
        if site_dir.exists() {
            fs::remove_dir_all(&site_dir).with_context(|| {
                format!("Failed to clear previous site at {}", site_dir.display())
            })?;
        }
        fs::create_dir_all(&site_dir)
            .with_context(|| format!("Failed to create site directory {}", site_dir.display()))?;

        let mut report = RenderReport::default();
        let mut write = |rel: &str, content: &str| {
            let path = site_dir.join(rel);
            match write_atomic(&path, content.as_bytes()) {
                Ok(()) => {
                    debug!("Wrote {}", path.display());
                    report.pages += 1;
                }
                Err(e) => {
                    faults.record(
                        Fault::new(FaultKind::WriteFailed, rel.to_string(), format!("{e:#}"))
                            .with_file(&path),
                    );
                    report.failed += 1;
                }
            }
        };

        write("style.css", STYLE_CSS);
        write("index.html", &self.index_page());

        for (key, album) in self.graph.albums() {
            write(&OutputLayout::album_page_rel(&album.dir_name), &self.album_page(key));
        }
        for (key, photo) in self.graph.photos() {
            write(&OutputLayout::photo_page_rel(&photo.file_name), &self.photo_page(key));
        }

        write(TAG_INDEX_PAGE, &self.tag_index_page());
        for tag in self.graph.tags() {
            let body = format!(
                "<h1>Tag: {}</h1>\n<p class=\"count\">{}</p>\n{}",
                escape_html(&tag.name),
                photo_count(tag.photos.len()),
                self.photo_grid(tag.photos.iter().copied(), None, UP, |_| None)
            );
            write(
                &OutputLayout::tag_page_rel(&tag.slug),
                &page(&format!("Tag: {}", tag.name), UP, &body),
            );
        }

        write("favorites.html", &self.favorites_page());
        write("popular.html", &self.popular_page());
        write("unsorted.html", &self.unsorted_page());

        info!(
            "Rendered {} pages into {}",
            report.pages,
            site_dir.display()
        );
        Ok(report)
    }

    fn index_page(&self) -> String {
        let profile = self.graph.profile();
        let title = profile
            .map(|p| p.real_name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| format!("Photos by {name}"))
            .unwrap_or_else(|| "Flickr archive".to_string());

        let mut content = format!("<h1>{}</h1>\n", escape_html(&title));
        if let Some(profile) = profile {
            if !profile.description.trim().is_empty() {
                content.push_str(&format!(
                    "<p class=\"profile\">{}</p>\n",
                    multiline(&profile.description)
                ));
            }
            let places: Vec<String> = [("Lives in", &profile.city), ("From", &profile.hometown)]
                .into_iter()
                .filter_map(|(label, place)| place.as_ref().map(|p| format!("{label} {p}")))
                .collect();
            if !places.is_empty() {
                content.push_str(&format!(
                    "<p class=\"meta\">{}</p>\n",
                    escape_html(&places.join(". "))
                ));
            }
        }

        content.push_str(&format!(
            "<p class=\"meta\">{} in {} albums, {} comments</p>\n",
            photo_count(self.graph.photo_count()),
            self.graph.album_count(),
            self.graph.comment_count()
        ));

        content.push_str("<h2>Albums</h2>\n<ul class=\"grid albums\">\n");
        for (_, album) in self.graph.albums() {
            let dir = &album.dir_name;
            // Fall back to the first photo that has an image
            let cover = album
                .cover
                .into_iter()
                .chain(album.photos.iter().copied())
                .find_map(|photo| self.thumbnail_src(photo, Some(dir), ""));
            content.push_str(&tile(
                &OutputLayout::album_page_rel(&album.dir_name),
                cover.as_deref(),
                &album.title,
                Some(&photo_count(album.photos.len())),
            ));
        }
        content.push_str("</ul>\n");

        let unsorted = self.graph.unsorted_photos().len();
        if unsorted > 0 {
            content.push_str(&format!(
                "<p><a href=\"unsorted.html\">Unsorted photos</a> <span class=\"count\">({})</span></p>\n",
                unsorted
            ));
        }

        page(&title, "", &content)
    }

    fn album_page(&self, key: AlbumKey) -> String {
        let album = self.graph.album(key);
        let dir = &album.dir_name;

        let mut content = format!("<h1>{}</h1>\n", escape_html(&album.title));
        if !album.description.trim().is_empty() {
            content.push_str(&format!(
                "<p class=\"description\">{}</p>\n",
                multiline(&album.description)
            ));
        }

        let shown = album
            .photos
            .iter()
            .filter(|&&photo| self.images.get(photo).is_some())
            .count();
        content.push_str(&format!(
            "<p class=\"count\">{}</p>\n",
            photo_count(album.photos.len())
        ));
        if shown < album.photos.len() {
            content.push_str(&format!(
                "<p class=\"note\">{} of these have no image in the archive and are not shown.</p>\n",
                album.photos.len() - shown
            ));
        }
        content.push_str(&self.photo_grid(album.photos.iter().copied(), Some(dir), UP, |_| None));

        page(&album.title, UP, &content)
    }

    fn photo_page(&self, key: PhotoKey) -> String {
        let photo = self.graph.photo(key);
        let derivatives = self.images.get(key);
        let mut content = format!("<h1>{}</h1>\n", escape_html(&photo.title));

        match derivatives {
            Some(derivatives) => {
                let (width, height) = derivatives.display_dims;
                content.push_str(&format!(
                    "<figure class=\"photo\"><img src=\"{}{}{}\" width=\"{}\" height=\"{}\" alt=\"{}\"></figure>\n",
                    UP,
                    UP,
                    escape_html(&derivatives.rel_path(&photo.file_name, None, DerivativeKind::Display)),
                    width,
                    height,
                    escape_html(&photo.title)
                ));
            }
            None => content.push_str(
                "<div class=\"placeholder\"><p>Image not available</p>\
                 <p class=\"note\">The source image for this photo was missing or could not be read.</p></div>\n",
            ),
        }

        let exif = derivatives.map(|d| &d.exif);
        let taken = photo
            .taken_at
            .or_else(|| exif.and_then(|e| e.date_time));
        if let Some(taken) = taken {
            content.push_str(&format!("<p class=\"meta\">Taken {}</p>\n", nice_date(&taken)));
        }

        let mut stats = vec![format!(
            "{} {}",
            photo.views,
            if photo.views == 1 { "view" } else { "views" }
        )];
        if photo.is_favorite() {
            stats.push(format!(
                "<span class=\"favorite\">&#9733; Favorite ({})</span>",
                photo.favorites
            ));
        }
        content.push_str(&format!("<p class=\"meta\">{}</p>\n", stats.join(" &middot; ")));
        if let Some(photopage) = &photo.details.photopage {
            content.push_str(&format!(
                "<p class=\"meta\"><a href=\"{}\">View on Flickr</a></p>\n",
                escape_html(photopage)
            ));
        }

        if !photo.description.trim().is_empty() {
            content.push_str(&format!(
                "<p class=\"description\">{}</p>\n",
                multiline(&photo.description)
            ));
        }

        if !photo.albums.is_empty() {
            content.push_str("<h2>Albums</h2>\n<ul class=\"tags\">\n");
            for &album in &photo.albums {
                let album = self.graph.album(album);
                content.push_str(&format!(
                    "<li><a href=\"{}{}\">{}</a></li>\n",
                    UP,
                    OutputLayout::album_page_rel(&album.dir_name),
                    escape_html(&album.title)
                ));
            }
            content.push_str("</ul>\n");
        }

        let tags = distinct_tags(photo);
        if !tags.is_empty() {
            content.push_str("<h2>Tags</h2>\n<ul class=\"tags\">\n");
            for (slug, name) in tags {
                content.push_str(&format!(
                    "<li><a href=\"{}{}\">{}</a></li>\n",
                    UP,
                    OutputLayout::tag_page_rel(&slug),
                    escape_html(name)
                ));
            }
            content.push_str("</ul>\n");
        }

        if !photo.details.groups.is_empty() {
            content.push_str("<h2>Groups</h2>\n<ul class=\"tags\">\n");
            for group in &photo.details.groups {
                let name = escape_html(&group.name);
                match &group.url {
                    Some(url) => content.push_str(&format!(
                        "<li><a href=\"{}\">{}</a></li>\n",
                        escape_html(url),
                        name
                    )),
                    None => content.push_str(&format!("<li>{name}</li>\n")),
                }
            }
            content.push_str("</ul>\n");
        }

        if !photo.comments.is_empty() {
            content.push_str(&format!(
                "<h2>Comments ({})</h2>\n<ol class=\"comments\">\n",
                photo.comments.len()
            ));
            for comment in &photo.comments {
                let when = comment
                    .posted_at
                    .map(|at| nice_date(&at))
                    .unwrap_or_else(|| "date unknown".to_string());
                content.push_str(&format!(
                    "<li><p class=\"comment-meta\">{} &middot; {}</p><p>{}</p></li>\n",
                    escape_html(&comment.author),
                    when,
                    multiline(&comment.text)
                ));
            }
            content.push_str("</ol>\n");
        }

        let details = Self::detail_lines(photo, exif);
        if !details.is_empty() {
            content.push_str(&format!(
                "<h2>Details</h2>\n<p class=\"meta\">{}</p>\n",
                details.join("<br>\n")
            ));
        }

        if !photo.details.exif.is_empty() {
            content.push_str("<h2>Exif</h2>\n<table class=\"exif\">\n");
            for (key, value) in &photo.details.exif {
                content.push_str(&format!(
                    "<tr><th>{}</th><td>{}</td></tr>\n",
                    escape_html(key),
                    escape_html(value)
                ));
            }
            content.push_str("</table>\n");
        }

        page(&photo.title, UP, &content)
    }

    /// Lines of the photo page's "Details" section, already escaped
    fn detail_lines(photo: &Photo, exif: Option<&ExifSummary>) -> Vec<String> {
        let details = &photo.details;
        let mut lines = Vec::new();
        if let Some(privacy) = &details.privacy {
            lines.push(format!("Privacy: {}", escape_html(privacy)));
        }
        if !details.people.is_empty() {
            let people: Vec<String> = details
                .people
                .iter()
                .map(|person| {
                    format!(
                        "<a href=\"{}{}\">{}</a>",
                        FLICKR_PEOPLE_URL,
                        escape_html(person),
                        escape_html(person)
                    )
                })
                .collect();
            lines.push(format!("People in the photo: {}", people.join(", ")));
        }
        if let Some(location) = &details.location {
            lines.push(format!("Location: {}", escape_html(&location.to_string())));
        }
        if let Some(license) = &details.license {
            lines.push(format!("License: {}", escape_html(license)));
        }
        if let Some(exif) = exif {
            if let Some(camera) = exif.camera() {
                lines.push(format!("Camera: {}", escape_html(&camera)));
            }
            if let Some(exposure) = exif.exposure() {
                lines.push(format!("Exposure: {}", escape_html(&exposure)));
            }
        }
        lines
    }

    fn tag_index_page(&self) -> String {
        let mut content = String::from("<h1>Tags</h1>\n");
        if self.graph.tags().is_empty() {
            content.push_str("<p>No photos are tagged.</p>\n");
        } else {
            content.push_str("<ul class=\"tags\">\n");
            for tag in self.graph.tags() {
                content.push_str(&format!(
                    "<li><a href=\"{}\">{}</a> <span class=\"count\">({})</span></li>\n",
                    escape_html(&OutputLayout::tag_file_name(&tag.slug)),
                    escape_html(&tag.name),
                    tag.photos.len()
                ));
            }
            content.push_str("</ul>\n");
        }
        page("Tags", UP, &content)
    }

    fn favorites_page(&self) -> String {
        let mut favorites: Vec<(PhotoKey, &Photo)> = self
            .graph
            .photos()
            .filter(|(_, photo)| photo.is_favorite())
            .collect();
        favorites.sort_by(|a, b| b.1.favorites.cmp(&a.1.favorites).then_with(|| a.1.id.cmp(&b.1.id)));

        let mut content = format!(
            "<h1>Favorites</h1>\n<p class=\"count\">{}</p>\n",
            photo_count(favorites.len())
        );
        content.push_str(&self.photo_grid(
            favorites.into_iter().map(|(key, _)| key),
            None,
            "",
            |photo| Some(format!("\u{2605} {}", photo.favorites)),
        ));
        page("Favorites", "", &content)
    }

    fn popular_page(&self) -> String {
        let mut popular: Vec<(PhotoKey, &Photo)> = self
            .graph
            .photos()
            .filter(|(_, photo)| photo.views > 0)
            .collect();
        popular.sort_by(|a, b| b.1.views.cmp(&a.1.views).then_with(|| a.1.id.cmp(&b.1.id)));
        popular.truncate(POPULAR_LIMIT);

        let mut content = String::from("<h1>Most viewed</h1>\n");
        content.push_str(&self.photo_grid(
            popular.into_iter().map(|(key, _)| key),
            None,
            "",
            |photo| Some(format!("{} views", photo.views)),
        ));
        page("Most viewed", "", &content)
    }

    fn unsorted_page(&self) -> String {
        let unsorted = self.graph.unsorted_photos();
        let mut content = format!(
            "<h1>Unsorted photos</h1>\n<p class=\"count\">{} in no album</p>\n",
            photo_count(unsorted.len())
        );
        content.push_str(&self.photo_grid(unsorted.into_iter(), None, "", |_| None));
        page("Unsorted photos", "", &content)
    }

    /// Thumbnail grid of the photos that have derivatives, in the given order
    fn photo_grid(
        &self,
        photos: impl Iterator<Item = PhotoKey>,
        dir: Option<&str>,
        to_site: &str,
        note: impl Fn(&Photo) -> Option<String>,
    ) -> String {
        let mut content = String::from("<ul class=\"grid\">\n");
        for key in photos {
            let Some(src) = self.thumbnail_src(key, dir, to_site) else {
                continue;
            };
            let photo = self.graph.photo(key);
            content.push_str(&tile(
                &format!("{}{}", to_site, OutputLayout::photo_page_rel(&photo.file_name)),
                Some(&src),
                &photo.title,
                note(photo).as_deref(),
            ));
        }
        content.push_str("</ul>\n");
        content
    }

    /// Link to a photo's thumbnail from a page `to_site` away from the site root
    fn thumbnail_src(&self, key: PhotoKey, dir: Option<&str>, to_site: &str) -> Option<String> {
        let derivatives = self.images.get(key)?;
        let photo = self.graph.photo(key);
        Some(format!(
            "{}{}{}",
            to_site,
            UP,
            derivatives.rel_path(&photo.file_name, dir, DerivativeKind::Thumbnail)
        ))
    }
}

fn photo_count(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

/// A photo's tags with case variants folded together, in first-seen order
fn distinct_tags(photo: &Photo) -> Vec<(String, &str)> {
    let mut seen = HashSet::new();
    photo
        .tags
        .iter()
        .filter_map(|tag| {
            let slug = tag_slug(tag);
            seen.insert(slug.clone()).then_some((slug, tag.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Export;
    use crate::materialize::{ImageSettings, Materializer};
    use crate::model::{
        AlbumRecord, CommentRecord, Group, Location, PhotoDetails, PhotoRecord, Profile,
        parse_timestamp,
    };
    use crate::sources::SourceIndex;
    use std::sync::atomic::AtomicBool;
    use tempfile::tempdir;

    fn photo(id: &str, title: &str) -> PhotoRecord {
        PhotoRecord {
            id: id.to_string(),
            title: title.to_string(),
            source_filename: Some(format!("{id}.jpg")),
            ..Default::default()
        }
    }

    fn export() -> Export {
        let mut p1 = photo("P1", "Beach <day>");
        p1.tags = vec!["Kids".to_string(), "kids".to_string(), "New York".to_string()];
        p1.views = 12;
        p1.favorites = 2;
        p1.description = "line one\nline two".to_string();
        p1.details = PhotoDetails {
            photopage: Some("https://www.flickr.com/photos/ada/P1/".to_string()),
            privacy: Some("public".to_string()),
            license: Some("CC BY 2.0".to_string()),
            people: vec!["ann".to_string()],
            groups: vec![Group {
                name: "Beaches & Bays".to_string(),
                url: Some("https://www.flickr.com/groups/beaches/".to_string()),
            }],
            location: Some(Location {
                latitude: "1.5".to_string(),
                longitude: "2.5".to_string(),
                accuracy: None,
            }),
            exif: vec![("Make".to_string(), "Canon".to_string())],
        };
        p1.comments = vec![
            CommentRecord {
                photo_id: "P1".to_string(),
                author: "bob".to_string(),
                posted_at: parse_timestamp("2020-05-02 10:00:00"),
                text: "second".to_string(),
            },
            CommentRecord {
                photo_id: "P1".to_string(),
                author: "alice".to_string(),
                posted_at: parse_timestamp("2020-05-01 10:00:00"),
                text: "first".to_string(),
            },
        ];
        let p2 = photo("P2", "No image");
        let p3 = photo("P3", "Loose");

        Export {
            photos: vec![p1, p2, p3],
            albums: vec![AlbumRecord {
                id: "A1".to_string(),
                title: "Trip".to_string(),
                photo_ids: vec!["P2".to_string(), "P1".to_string()],
                ..Default::default()
            }],
            profile: Some(Profile {
                real_name: "Ada Example".to_string(),
                city: Some("Boston".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_site() -> Result<()> {
        let temp_dir = tempdir()?;
        let images = temp_dir.path().join("images");
        fs::create_dir_all(&images)?;
        image::RgbImage::new(40, 30).save(images.join("P1.jpg"))?;
        image::RgbImage::new(40, 30).save(images.join("P3.jpg"))?;

        let faults = FaultCollector::new();
        let graph = EntityGraph::build(export(), &faults);
        let layout = OutputLayout::new(temp_dir.path().join("out"));
        let sources = SourceIndex::scan(&images)?;
        let settings = ImageSettings {
            thumbnail_size: 16,
            display_size: 32,
            jpeg_quality: 80,
        };
        let report = Materializer::new(&graph, &sources, &layout, settings, 1)
            .run(&faults, &AtomicBool::new(false))?;

        let rendered = SiteRenderer::new(&graph, &report, &layout).render(&faults)?;
        assert_eq!(rendered.failed, 0);

        let site = layout.site_dir();
        let index = fs::read_to_string(site.join("index.html"))?;
        assert!(index.contains("Photos by Ada Example"));
        assert!(index.contains("Lives in Boston"));
        assert!(index.contains("href=\"albums/A1.html\""));
        assert!(index.contains("src=\"../A1/thumbs/P1.jpg\""));
        assert!(index.contains("unsorted.html"));

        let album = fs::read_to_string(site.join("albums/A1.html"))?;
        assert!(album.contains("href=\"../photos/P1.html\""));
        assert!(!album.contains("photos/P2.html"));
        assert!(album.contains("1 of these have no image"));

        let p1 = fs::read_to_string(site.join("photos/P1.html"))?;
        assert!(p1.contains("<h1>Beach &lt;day&gt;</h1>"));
        assert!(p1.contains("src=\"../../A1/P1.jpg\""));
        assert!(p1.contains("12 views"));
        assert!(p1.contains("Favorite (2)"));
        assert!(p1.contains("line one<br>\nline two"));
        assert!(p1.find("alice").unwrap() < p1.find("bob").unwrap());
        assert_eq!(p1.matches("tags/kids.html").count(), 1);
        assert!(p1.contains("../tags/new-york.html"));
        assert!(p1.contains("href=\"https://www.flickr.com/photos/ada/P1/\">View on Flickr"));
        assert!(p1.contains("<h2>Groups</h2>"));
        assert!(p1.contains(">Beaches &amp; Bays</a>"));
        assert!(p1.contains("Privacy: public"));
        assert!(p1.contains("href=\"https://www.flickr.com/photos/ann\">ann</a>"));
        assert!(p1.contains("Location: latitude 1.5, longitude 2.5"));
        assert!(p1.contains("License: CC BY 2.0"));
        assert!(p1.contains("<tr><th>Make</th><td>Canon</td></tr>"));

        let p2 = fs::read_to_string(site.join("photos/P2.html"))?;
        assert!(p2.contains("Image not available"));
        assert!(!p2.contains("<img"));

        let p3 = fs::read_to_string(site.join("photos/P3.html"))?;
        assert!(!p3.contains("<h2>Details</h2>"));
        assert!(!p3.contains("<h2>Exif</h2>"));
        assert!(!p3.contains("View on Flickr"));

        let unsorted = fs::read_to_string(site.join("unsorted.html"))?;
        assert!(unsorted.contains("src=\"../unsorted/thumbs/P3.jpg\""));

        let favorites = fs::read_to_string(site.join("favorites.html"))?;
        assert!(favorites.contains("photos/P1.html"));
        assert!(!favorites.contains("photos/P3.html"));

        let tags = fs::read_to_string(site.join("tags/index.html"))?;
        assert!(tags.contains("href=\"kids.html\""));
        let kids = fs::read_to_string(site.join("tags/kids.html"))?;
        assert!(kids.contains("src=\"../../A1/thumbs/P1.jpg\""));

        assert!(site.join("style.css").exists());
        Ok(())
    }

    #[test]
    fn test_stale_pages_are_removed() -> Result<()> {
        let temp_dir = tempdir()?;
        let layout = OutputLayout::new(temp_dir.path());
        fs::create_dir_all(layout.site_dir().join("photos"))?;
        fs::write(layout.site_dir().join("photos/old.html"), "stale")?;

        let graph = EntityGraph::build(export(), &FaultCollector::new());
        let report = MaterializeReport::default();
        SiteRenderer::new(&graph, &report, &layout).render(&FaultCollector::new())?;

        assert!(!layout.site_dir().join("photos/old.html").exists());
        assert!(layout.site_dir().join("photos/P3.html").exists());
        Ok(())
    }

    #[test]
    fn test_index_tag_keeps_tag_list() -> Result<()> {
        let temp_dir = tempdir()?;
        let layout = OutputLayout::new(temp_dir.path());
        let mut p1 = photo("P1", "Shore");
        p1.tags = vec!["Index".to_string(), "beach".to_string()];
        let export = Export {
            photos: vec![p1],
            ..Default::default()
        };

        let faults = FaultCollector::new();
        let graph = EntityGraph::build(export, &faults);
        let report = MaterializeReport::default();
        let rendered = SiteRenderer::new(&graph, &report, &layout).render(&faults)?;
        assert_eq!(rendered.failed, 0);

        let site = layout.site_dir();
        let tag_list = fs::read_to_string(site.join(TAG_INDEX_PAGE))?;
        assert!(tag_list.contains("<h1>Tags</h1>"));
        assert!(tag_list.contains("href=\"beach.html\""));
        assert!(tag_list.contains("href=\"_index.html\""));

        let index_tag = fs::read_to_string(site.join("tags/_index.html"))?;
        assert!(index_tag.contains("<h1>Tag: Index</h1>"));

        let p1 = fs::read_to_string(site.join("photos/P1.html"))?;
        assert!(p1.contains("href=\"../tags/_index.html\""));
        Ok(())
    }

    #[test]
    fn test_distinct_tags() {
        let photo = Photo {
            id: "P1".to_string(),
            file_name: "P1".to_string(),
            source_filename: None,
            title: String::new(),
            description: String::new(),
            taken_at: None,
            tags: vec!["Kids".to_string(), "KIDS".to_string(), "sea".to_string()],
            views: 0,
            favorites: 0,
            albums: Vec::new(),
            comments: Vec::new(),
            details: PhotoDetails::default(),
        };
        let tags = distinct_tags(&photo);
        assert_eq!(
            tags,
            vec![("kids".to_string(), "Kids"), ("sea".to_string(), "sea")]
        );
    }
}
