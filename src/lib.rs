//! # flickr-archive
//!
//! A command-line tool that turns a Flickr data export into a self-contained
//! archive you can browse offline.
//!
//! The export is a flat directory of JSON records next to a directory of
//! original images. This crate reads the records, links photos to albums,
//! tags and comments, writes resized copies of every image into one directory
//! per album, and generates a static HTML site over the result.
//!
//! ## Pipeline
//!
//! - `loader` reads the JSON files into records
//! - `graph` links them into an immutable `EntityGraph`
//! - `materialize` writes display images and thumbnails in parallel
//! - `render` writes the HTML site
//! - `archive` runs the stages in order and decides the exit status
//!
//! Problems with individual records or images never stop a run. They are
//! collected as `faults::Fault`s, logged, and appended to the run log.

pub mod archive;
pub mod config;
pub mod exif;
pub mod faults;
pub mod graph;
pub mod html;
pub mod layout;
pub mod loader;
pub mod materialize;
pub mod model;
pub mod render;
pub mod sources;
