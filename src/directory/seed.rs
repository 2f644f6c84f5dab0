//! Streaming reader for the station seed format.
//!
//! ```text
//! <iradio-cache>
//!   <name>Bundled stations</name>
//!   <station>
//!     <name>Test FM</name>
//!     <url>http://a/stream</url>
//!     <url>http://b/stream</url>
//!     <genre>Jazz</genre>
//!   </station>
//! </iradio-cache>
//! ```
//!
//! A station is kept only when it has a name, a genre and at least one url.
//! Incomplete stations are skipped with a warning and parsing continues.

use crate::error::{DirectoryError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Seed data shipped with the crate, used when no snapshot can be loaded.
pub const BUNDLED_SEED: &str = include_str!("../../data/iradio-initial.xml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedStation {
    pub name: String,
    pub genre: String,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedCache {
    pub name: Option<String>,
    pub stations: Vec<SeedStation>,
    /// Stations dropped for missing fields.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InCache,
    InCacheName,
    InStation,
    InName,
    InUrl,
    InGenre,
    Done,
}

#[derive(Default)]
struct PartialStation {
    name: Option<String>,
    genre: Option<String>,
    locations: Vec<String>,
}

impl PartialStation {
    fn finish(self) -> Result<SeedStation> {
        let name = self.name.filter(|n| !n.is_empty());
        let genre = self.genre.filter(|g| !g.is_empty());
        match (name, genre) {
            (Some(name), Some(genre)) if !self.locations.is_empty() => Ok(SeedStation {
                name,
                genre,
                locations: self.locations,
            }),
            (name, genre) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("name");
                }
                if genre.is_none() {
                    missing.push("genre");
                }
                if self.locations.is_empty() {
                    missing.push("url");
                }
                Err(DirectoryError::IncompleteRecord(format!(
                    "station {:?} missing {}",
                    name.unwrap_or_default(),
                    missing.join(", ")
                )))
            }
        }
    }
}

pub fn read_seed_file(path: &Path) -> Result<SeedCache> {
    let content = fs::read_to_string(path)?;
    parse_seed(&content, path)
}

/// Parses seed text. `origin` is only used in error messages.
pub fn parse_seed(content: &str, origin: &Path) -> Result<SeedCache> {
    let parse_error = |message: String| DirectoryError::Parse {
        path: origin.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut cache = SeedCache::default();
    let mut state = State::Start;
    let mut station = PartialStation::default();
    let mut text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(e.to_string()))?;
        match event {
            Event::Start(e) => {
                let name = e.name();
                let name = name.as_ref();
                state = match (state, name) {
                    (State::Start, b"iradio-cache") => State::InCache,
                    (State::Start, other) => {
                        return Err(parse_error(format!(
                            "invalid start element {}",
                            String::from_utf8_lossy(other)
                        )));
                    }
                    (State::InCache, b"name") => State::InCacheName,
                    (State::InCache, b"station") => {
                        station = PartialStation::default();
                        State::InStation
                    }
                    (State::InStation, b"name") => State::InName,
                    (State::InStation, b"url") => State::InUrl,
                    (State::InStation, b"genre") => State::InGenre,
                    (current, other) => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "ignoring unknown seed element"
                        );
                        current
                    }
                };
                text.clear();
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t)),
            Event::End(e) => {
                let name = e.name();
                state = match (state, name.as_ref()) {
                    (State::InCacheName, b"name") => {
                        cache.name = Some(std::mem::take(&mut text));
                        State::InCache
                    }
                    (State::InName, b"name") => {
                        station.name = Some(std::mem::take(&mut text));
                        State::InStation
                    }
                    (State::InUrl, b"url") => {
                        let url = std::mem::take(&mut text);
                        if !url.is_empty() {
                            station.locations.push(url);
                        }
                        State::InStation
                    }
                    (State::InGenre, b"genre") => {
                        station.genre = Some(std::mem::take(&mut text));
                        State::InStation
                    }
                    (State::InStation, b"station") => {
                        match std::mem::take(&mut station).finish() {
                            Ok(complete) => cache.stations.push(complete),
                            Err(err) => {
                                warn!(error = %err, "incomplete station, skipping");
                                cache.skipped += 1;
                            }
                        }
                        State::InCache
                    }
                    (State::InCache, b"iradio-cache") => State::Done,
                    (current, _) => current,
                };
            }
            // <url/> and friends carry nothing
            Event::Empty(_) => {}
            Event::Eof => break,
            _ => {}
        }
    }

    if state != State::Done {
        return Err(parse_error("unexpected end of seed data".to_string()));
    }
    debug!(
        stations = cache.stations.len(),
        skipped = cache.skipped,
        "parsed seed data"
    );
    Ok(cache)
}
