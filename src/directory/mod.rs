//! Station directory
//!
//! A two-level genre → station hierarchy on top of one `NodeDatabase`. Two
//! roots with fixed ids are always present: `all_genres`, whose children are
//! the genre nodes (plus `all_stations` itself, shown as the "All" genre), and
//! `all_stations`, whose children are every station. A station is a child of
//! both `all_stations` and its genre, and points back at the genre through
//! `Property::RealGenre`.
//!
//! Reference counts: a station's initial reference belongs to the directory
//! and is dropped by `remove_node`. A genre's initial reference belongs to the
//! genre index, and every station filed under it holds one more. When a
//! station is destroyed the directory drops the genre reference it held.
//!
//! The genre index is maintained from node notifications on `all_genres`,
//! drained after every mutation.

pub mod index;
pub mod persist;
pub mod scheduler;
pub mod seed;

pub use index::GenreIndex;
pub use scheduler::{SaveSchedule, SaveScheduler};
pub use seed::{SeedCache, SeedStation};

use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, Result};
use crate::filter::collate::sort_key;
use crate::filter::{NodeFilter, NodeFilterExpression};
use crate::node::{FrozenNode, NodeDatabase, NodeEvent, PropId, Property};
use crate::types::NodeId;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, info, warn};

pub const GENRES_ROOT: NodeId = NodeId(0);
pub const STATIONS_ROOT: NodeId = NodeId(1);

/// Name given to both roots.
pub const ALL_NAME: &str = "All";
/// Name and genre used when a station is added from a bare uri.
pub const UNKNOWN_NAME: &str = "(Unknown)";
pub const NEVER_PLAYED: &str = "Never";

/// Node database name used for the directory.
const DB_NAME: &str = "iradio";

/// Directory-level notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// A bulk load or import finished.
    Changed,
}

/// How `load` ended up populating the directory.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The persisted snapshot was read back.
    Restored { nodes: usize },
    /// The seed data was loaded. `reason` is the failure that caused the
    /// fallback, or a failure reading the configured seed file (the bundled
    /// seed is used instead). `None` when there was simply no snapshot yet.
    Seeded {
        stations: usize,
        reason: Option<DirectoryError>,
    },
}

pub struct DirectoryBackend {
    db: NodeDatabase,
    index: GenreIndex,
    db_file: PathBuf,
    seed_file: Option<PathBuf>,
    genre_events: Receiver<NodeEvent>,
    station_events: Receiver<NodeEvent>,
    destroyed_events: Receiver<NodeEvent>,
    subscribers: Vec<Sender<DirectoryEvent>>,
    loaded: bool,
}

impl DirectoryBackend {
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let mut backend = Self::with_path(&config.db_file)?;
        backend.seed_file = config.seed_file.clone();
        Ok(backend)
    }

    /// Creates an empty directory persisted at `db_file`, using the bundled
    /// seed data as fallback.
    pub fn with_path(db_file: impl Into<PathBuf>) -> Result<Self> {
        let mut db = NodeDatabase::new(DB_NAME);
        db.create_with_id(GENRES_ROOT)?;
        db.create_with_id(STATIONS_ROOT)?;

        let genre_events = db.watch(GENRES_ROOT)?;
        let station_events = db.watch(STATIONS_ROOT)?;
        let destroyed_events = db.watch_destroyed();

        for root in [GENRES_ROOT, STATIONS_ROOT] {
            db.set_property(root, Property::Name(ALL_NAME.to_string()))?;
            db.set_property(root, Property::Genre(ALL_NAME.to_string()))?;
            db.set_property(root, Property::Priority(true))?;
        }
        db.add_child(GENRES_ROOT, STATIONS_ROOT)?;

        let mut backend = Self {
            db,
            index: GenreIndex::new(),
            db_file: db_file.into(),
            seed_file: None,
            genre_events,
            station_events,
            destroyed_events,
            subscribers: Vec::new(),
            loaded: false,
        };
        backend.process_events();
        Ok(backend)
    }

    pub fn db(&self) -> &NodeDatabase {
        &self.db
    }

    pub fn db_file(&self) -> &Path {
        &self.db_file
    }

    /// True once `load` has populated the directory. Scheduled saves wait
    /// for it so an empty tree never replaces a saved one.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Shared handle to the genre index, usable from other threads.
    pub fn genre_index(&self) -> GenreIndex {
        self.index.clone()
    }

    pub fn get_all_genres(&self) -> NodeId {
        GENRES_ROOT
    }

    pub fn get_all_stations(&self) -> NodeId {
        STATIONS_ROOT
    }

    pub fn get_genre_by_name(&self, name: &str) -> Option<NodeId> {
        self.index.get(name)
    }

    /// Number of genres, not counting "All".
    pub fn genre_count(&self) -> usize {
        self.index.len().saturating_sub(1)
    }

    pub fn station_count(&self) -> usize {
        self.db.children_len(STATIONS_ROOT).unwrap_or(0)
    }

    /// Genre names in creation order, not counting "All".
    pub fn get_genre_names(&self) -> Vec<String> {
        let Ok(children) = self.db.freeze(GENRES_ROOT) else {
            return Vec::new();
        };
        children
            .iter()
            .filter(|id| **id != STATIONS_ROOT)
            .filter_map(|id| self.db.get(*id).ok())
            .map(|node| node.name().to_string())
            .collect()
    }

    /// Receives `DirectoryEvent::Changed` after each bulk load or import.
    pub fn subscribe(&mut self) -> Receiver<DirectoryEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: DirectoryEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Restores the persisted snapshot, or falls back to seed data when it is
    /// missing, unreadable or from another format version. A snapshot that
    /// fails to parse is deleted. A configured seed file that cannot be read
    /// is replaced by the bundled seed.
    pub fn load(&mut self) -> Result<LoadOutcome> {
        debug!(path = %self.db_file.display(), "loading station directory");

        let reason = match persist::read_snapshot(&self.db_file) {
            Ok(nodes) => match self.restore(&nodes) {
                Ok(count) => {
                    self.process_events();
                    self.loaded = true;
                    self.notify(DirectoryEvent::Changed);
                    info!(
                        nodes = count,
                        genres = self.genre_count(),
                        stations = self.station_count(),
                        "loaded station directory"
                    );
                    return Ok(LoadOutcome::Restored { nodes: count });
                }
                Err(err) => Some(err),
            },
            Err(DirectoryError::Io(err)) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => Some(err),
        };

        if let Some(err) = &reason {
            warn!(
                path = %self.db_file.display(),
                error = %err,
                "could not load station directory, loading seed data"
            );
            if err.is_recoverable_load_failure() {
                if let Err(remove_err) = std::fs::remove_file(&self.db_file) {
                    warn!(error = %remove_err, "failed to remove unreadable snapshot");
                }
            }
        }

        let (stations, seed_error) = self.load_seed()?;
        self.loaded = true;
        self.notify(DirectoryEvent::Changed);
        Ok(LoadOutcome::Seeded {
            stations,
            reason: reason.or(seed_error),
        })
    }

    /// Loads the configured seed file, or the bundled seed when there is none
    /// or it cannot be read. A configured seed that failed is returned
    /// alongside the count.
    fn load_seed(&mut self) -> Result<(usize, Option<DirectoryError>)> {
        let configured = self.seed_file.as_deref().map(seed::read_seed_file);
        let (cache, seed_error) = match configured {
            Some(Ok(cache)) => (cache, None),
            Some(Err(err)) => {
                warn!(error = %err, "could not read seed file, using bundled stations");
                (Self::bundled_seed()?, Some(err))
            }
            None => (Self::bundled_seed()?, None),
        };
        debug!(
            cache = cache.name.as_deref().unwrap_or(""),
            "loading initial stations"
        );
        let added = self.add_seed_stations(cache, "user")?;
        Ok((added, seed_error))
    }

    fn bundled_seed() -> Result<SeedCache> {
        seed::parse_seed(seed::BUNDLED_SEED, Path::new("bundled seed"))
    }

    fn add_seed_stations(&mut self, cache: SeedCache, source: &str) -> Result<usize> {
        let mut added = 0;
        for station in cache.stations {
            if self
                .add_station(&station.locations, &station.name, &station.genre, source)?
                .is_some()
            {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Checks a parsed snapshot before anything is created, so a bad file
    /// never leaves a half-restored tree.
    fn validate(&self, nodes: &[persist::SnapshotNode]) -> Result<()> {
        let invalid = |message: String| DirectoryError::Parse {
            path: self.db_file.clone(),
            message,
        };
        let mut seen: HashSet<NodeId> = HashSet::new();
        for node in nodes {
            if self.db.contains(node.id) || !seen.insert(node.id) {
                return Err(invalid(format!("duplicate node id {}", node.id)));
            }
            for parent in &node.parents {
                if !self.db.contains(*parent) && !seen.contains(parent) {
                    return Err(invalid(format!(
                        "node {} refers to unknown parent {}",
                        node.id, parent
                    )));
                }
            }
            for property in &node.properties {
                if let Some(genre) = property.as_node() {
                    // "All" resolves to the stations root, which is never saved
                    if !self.db.contains(genre) && !seen.contains(&genre) {
                        return Err(invalid(format!(
                            "node {} refers to unknown genre {}",
                            node.id, genre
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn restore(&mut self, nodes: &[persist::SnapshotNode]) -> Result<usize> {
        self.validate(nodes)?;
        for snapshot in nodes {
            let id = self.db.create_with_id(snapshot.id)?;
            for property in &snapshot.properties {
                self.db.set_property(id, property.clone())?;
            }
            let name = self.db.get(id)?.name().to_string();
            self.db.set_property(id, Property::NameSortKey(sort_key(&name)))?;
            for parent in &snapshot.parents {
                self.db.add_child(*parent, id)?;
            }
            let genre = self
                .db
                .get(id)?
                .property(PropId::RealGenre)
                .and_then(Property::as_node);
            if let Some(genre) = genre {
                self.db.ref_node(genre)?;
            }
            debug!(node = %id, kind = %snapshot.kind, "restored node");
        }
        Ok(nodes.len())
    }

    /// Writes the whole tree to the snapshot file, replacing it atomically.
    pub fn save(&self) -> Result<()> {
        let bytes = self.render_snapshot()?;
        let tmp = persist::write_temp(&self.db_file, &bytes)?;
        persist::commit_temp(&tmp, &self.db_file)?;
        debug!(path = %self.db_file.display(), "saved station directory");
        Ok(())
    }

    /// Serializes genres (without the "All" placeholder) then stations.
    pub fn render_snapshot(&self) -> Result<Vec<u8>> {
        let genres = self.db.freeze(GENRES_ROOT)?;
        let stations = self.db.freeze(STATIONS_ROOT)?;
        let mut nodes: Vec<(NodeId, &str)> = genres
            .iter()
            .filter(|id| **id != STATIONS_ROOT)
            .map(|id| (*id, "genre"))
            .collect();
        nodes.extend(stations.iter().map(|id| (*id, "station")));

        let mut out = Vec::new();
        persist::write_snapshot(&self.db, &nodes, &mut out)?;
        Ok(out)
    }

    /// Adds a station unless one with the same name already exists. The first
    /// location is the primary one, the rest are kept as alternates.
    pub fn add_station(
        &mut self,
        locations: &[String],
        name: &str,
        genre: &str,
        source: &str,
    ) -> Result<Option<NodeId>> {
        let Some((primary, alternates)) = locations.split_first() else {
            return Err(DirectoryError::EmptyLocations);
        };
        if let Some(existing) = self.lookup_by_title(name) {
            debug!(name, node = %existing.id(), "station already exists");
            return Ok(None);
        }
        debug!(name, genre, "adding station");

        let id = self.db.create();
        self.db.set_property(id, Property::Name(name.to_string()))?;
        self.db.set_property(id, Property::NameSortKey(sort_key(name)))?;
        self.db.set_property(id, Property::Source(source.to_string()))?;
        self.db.set_property(id, Property::Location(primary.clone()))?;
        if !alternates.is_empty() {
            self.db
                .set_property(id, Property::AltLocations(alternates.to_vec()))?;
        }
        self.db.set_property(id, Property::PlayCount(0))?;
        self.db.set_property(id, Property::LastPlayed(0))?;
        self.db
            .set_property(id, Property::LastPlayedStr(NEVER_PLAYED.to_string()))?;
        self.db.set_property(id, Property::Genre(genre.to_string()))?;

        self.file_under_genre(id, genre)?;
        self.db.add_child(STATIONS_ROOT, id)?;
        self.process_events();
        Ok(Some(id))
    }

    /// `add_station` with the default source.
    pub fn add_station_full(
        &mut self,
        locations: &[String],
        name: &str,
        genre: &str,
    ) -> Result<Option<NodeId>> {
        self.add_station(locations, name, genre, "user")
    }

    /// Adds an unnamed station for `uri` unless some station already plays it.
    pub fn add_station_from_uri(&mut self, uri: &str) -> Result<Option<NodeId>> {
        if let Some(existing) = self.lookup_by_location(uri) {
            debug!(uri, node = %existing.id(), "location already known");
            return Ok(None);
        }
        self.add_station_full(&[uri.to_string()], UNKNOWN_NAME, UNKNOWN_NAME)
    }

    /// Links `station` under the genre called `genre`, creating the genre
    /// when needed and releasing any previous genre.
    fn file_under_genre(&mut self, station: NodeId, genre: &str) -> Result<()> {
        // the index must reflect genres created earlier in this call chain
        self.process_events();
        let current = self
            .db
            .get(station)?
            .property(PropId::RealGenre)
            .and_then(Property::as_node);
        let target = self.index.get(genre);

        if let Some(old) = current {
            if Some(old) == target {
                return Ok(());
            }
            self.db.remove_child(old, station)?;
            self.db.unref(old)?;
        }

        let target = match target {
            Some(id) => id,
            None => {
                let id = self.db.create();
                self.db.set_property(id, Property::Name(genre.to_string()))?;
                self.db.set_property(id, Property::Genre(genre.to_string()))?;
                self.db.set_property(id, Property::NameSortKey(sort_key(genre)))?;
                self.db.add_child(GENRES_ROOT, id)?;
                debug!(genre, node = %id, "created genre");
                id
            }
        };

        self.db.add_child(target, station)?;
        self.db.ref_node(target)?;
        self.db.set_property(station, Property::RealGenre(target))?;
        self.process_events();
        Ok(())
    }

    /// Moves a station to another genre.
    pub fn set_station_genre(&mut self, station: NodeId, genre: &str) -> Result<()> {
        self.db.set_property(station, Property::Genre(genre.to_string()))?;
        self.process_events();
        Ok(())
    }

    pub fn update_play_statistics(&mut self, station: NodeId) -> Result<()> {
        self.db
            .update_play_statistics(station, chrono::Local::now())?;
        self.process_events();
        Ok(())
    }

    /// Drops the directory's reference to `node`. Destroying a station also
    /// releases its genre. The roots are never removed.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == GENRES_ROOT || node == STATIONS_ROOT {
            warn!(node = %node, "refusing to remove a directory root");
            return Ok(());
        }
        self.db.unref(node)?;
        self.process_events();
        Ok(())
    }

    /// First station whose name is exactly `title`, pinned.
    pub fn lookup_by_title(&self, title: &str) -> Option<FrozenNode> {
        let stations = self.db.freeze(STATIONS_ROOT).ok()?;
        let found = stations.iter().copied().find(|id| {
            self.db
                .get(*id)
                .map(|node| node.name() == title)
                .unwrap_or(false)
        })?;
        self.db.freeze_node(found).ok()
    }

    /// First station playing `uri`, as its primary or an alternate location.
    pub fn lookup_by_location(&self, uri: &str) -> Option<FrozenNode> {
        let stations = self.db.freeze(STATIONS_ROOT).ok()?;
        let found = stations.iter().copied().find(|id| {
            let Ok(node) = self.db.get(*id) else {
                return false;
            };
            node.string(PropId::Location).map(|l| l == uri).unwrap_or(false)
                || node
                    .list(PropId::AltLocations)
                    .map(|alts| alts.iter().any(|l| l == uri))
                    .unwrap_or(false)
        })?;
        self.db.freeze_node(found).ok()
    }

    /// Adds every complete station from a seed-format file. Returns how many
    /// stations were new.
    pub fn import_seed(&mut self, path: &Path) -> Result<usize> {
        let cache = seed::read_seed_file(path)?;
        let skipped = cache.skipped;
        let added = self.add_seed_stations(cache, "import")?;
        info!(path = %path.display(), added, skipped, "imported stations");
        self.notify(DirectoryEvent::Changed);
        Ok(added)
    }

    /// Genre browser filter: everything under `parent`, or every station
    /// when `parent` is `all_stations`.
    pub fn station_filter(&self, parent: NodeId) -> NodeFilter {
        let mut filter = NodeFilter::new();
        filter.add_expression(NodeFilterExpression::NodeEquals(STATIONS_ROOT, parent), 0);
        filter.add_expression(NodeFilterExpression::HasParent(parent), 0);
        filter
    }

    /// Station name search.
    pub fn search_filter(&self, text: &str) -> NodeFilter {
        let mut filter = NodeFilter::new();
        filter.add_expression(NodeFilterExpression::string_contains(PropId::Name, text), 0);
        filter
    }

    /// Drains node notifications until none are pending. Handling one event
    /// may cause more (a destroyed station releases its genre).
    fn process_events(&mut self) {
        loop {
            let mut handled = false;
            while let Ok(event) = self.genre_events.try_recv() {
                handled = true;
                self.on_genre_event(event);
            }
            while let Ok(event) = self.station_events.try_recv() {
                handled = true;
                self.on_station_event(event);
            }
            while let Ok(event) = self.destroyed_events.try_recv() {
                handled = true;
                self.on_destroyed(event);
            }
            if !handled {
                break;
            }
        }
    }

    fn on_genre_event(&mut self, event: NodeEvent) {
        match event {
            NodeEvent::ChildAdded { child, .. } => {
                if let Ok(node) = self.db.get(child) {
                    self.index.insert(node.name().to_string(), child);
                }
            }
            NodeEvent::ChildRemoved { child, .. } => {
                self.index.remove(child);
            }
            NodeEvent::ChildChanged {
                child,
                prop: PropId::Name,
                ..
            } => {
                if let Ok(node) = self.db.get(child) {
                    self.index.insert(node.name().to_string(), child);
                }
            }
            _ => {}
        }
    }

    fn on_station_event(&mut self, event: NodeEvent) {
        if let NodeEvent::ChildChanged {
            child,
            prop: PropId::Genre,
            ..
        } = event
        {
            let genre = match self.db.get(child).and_then(|n| n.string(PropId::Genre)) {
                Ok(genre) => genre.to_string(),
                Err(_) => return,
            };
            if let Err(err) = self.file_under_genre(child, &genre) {
                warn!(station = %child, error = %err, "failed to move station to new genre");
            }
        }
    }

    fn on_destroyed(&mut self, event: NodeEvent) {
        let NodeEvent::Destroyed { node, properties } = event else {
            return;
        };
        self.index.remove(node);
        let genre = properties.iter().find_map(Property::as_node);
        if let Some(genre) = genre {
            if let Err(err) = self.db.unref(genre) {
                debug!(station = %node, genre = %genre, error = %err, "genre already gone");
            }
        }
    }
}
