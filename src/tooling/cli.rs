//! CLI Tooling
//!
//! Administrative commands over a station directory. Each command returns its
//! rendered output as a string; mutating commands save the directory before
//! returning.

use crate::config::DirectoryConfig;
use crate::directory::{DirectoryBackend, LoadOutcome};
use crate::error::Result;
use crate::node::PropId;
use crate::types::NodeId;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

/// stationdb - internet radio station directory
#[derive(Parser)]
#[command(name = "stationdb")]
#[command(about = "Browse and maintain an internet radio station directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Snapshot file (overrides configuration)
    #[arg(long)]
    pub db_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List stations, optionally only one genre
    List {
        #[arg(long)]
        genre: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Add a station
    Add {
        /// Station name
        #[arg(long)]
        name: String,
        #[arg(long)]
        genre: String,
        /// Stream locations, primary first
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
    },
    /// Add a station known only by its location
    AddUri { uri: String },
    /// List genres with their station counts
    Genres {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Search station names
    Search {
        text: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Import stations from a seed-format file
    Import { path: PathBuf },
    /// Move a station to another genre
    SetGenre { name: String, genre: String },
    /// Record a play of a station
    Played { name: String },
    /// Remove a station
    Remove { name: String },
}

/// One station row in command output.
#[derive(Debug, Clone, Serialize)]
pub struct StationRow {
    pub id: u64,
    pub name: String,
    pub genre: String,
    pub location: String,
    pub alternates: Vec<String>,
    pub play_count: i64,
    pub last_played: String,
}

pub struct CliContext {
    backend: DirectoryBackend,
}

impl CliContext {
    /// Opens the directory described by `config` and loads it.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let mut backend = DirectoryBackend::new(config)?;
        match backend.load()? {
            LoadOutcome::Restored { nodes } => info!(nodes, "opened station directory"),
            LoadOutcome::Seeded { stations, reason } => {
                if let Some(reason) = reason {
                    warn!(diagnostic = %reason.user_message(), "station list was reset");
                }
                info!(stations, "started from seed data");
            }
        }
        Ok(Self { backend })
    }

    pub fn backend(&self) -> &DirectoryBackend {
        &self.backend
    }

    pub fn execute(&mut self, command: &Commands) -> Result<String> {
        match command {
            Commands::List { genre, format } => {
                let parent = match genre {
                    Some(name) => match self.backend.get_genre_by_name(name) {
                        Some(id) => id,
                        None => return Ok(format!("No genre named {}", name)),
                    },
                    None => self.backend.get_all_stations(),
                };
                let filter = self.backend.station_filter(parent);
                let ids = filter.apply(self.backend.db(), self.backend.get_all_stations())?;
                Ok(self.render_stations(&ids, format))
            }
            Commands::Search { text, format } => {
                let filter = self.backend.search_filter(text);
                let ids = filter.apply(self.backend.db(), self.backend.get_all_stations())?;
                Ok(self.render_stations(&ids, format))
            }
            Commands::Genres { format } => Ok(self.render_genres(format)),
            Commands::Add { name, genre, urls } => {
                let added = self.backend.add_station_full(urls, name, genre)?;
                self.backend.save()?;
                Ok(match added {
                    Some(id) => format!("Added station {} ({})", name, id),
                    None => format!("Station {} already exists", name),
                })
            }
            Commands::AddUri { uri } => {
                let added = self.backend.add_station_from_uri(uri)?;
                self.backend.save()?;
                Ok(match added {
                    Some(id) => format!("Added station for {} ({})", uri, id),
                    None => format!("A station already plays {}", uri),
                })
            }
            Commands::Import { path } => {
                let added = self.backend.import_seed(path)?;
                self.backend.save()?;
                Ok(format!("Imported {} stations", added))
            }
            Commands::SetGenre { name, genre } => {
                let Some(id) = self.station_id(name) else {
                    return Ok(format!("No station named {}", name));
                };
                self.backend.set_station_genre(id, genre)?;
                self.backend.save()?;
                Ok(format!("Moved {} to {}", name, genre))
            }
            Commands::Played { name } => {
                let Some(id) = self.station_id(name) else {
                    return Ok(format!("No station named {}", name));
                };
                self.backend.update_play_statistics(id)?;
                self.backend.save()?;
                Ok(format!("Recorded play of {}", name))
            }
            Commands::Remove { name } => {
                let Some(id) = self.station_id(name) else {
                    return Ok(format!("No station named {}", name));
                };
                self.backend.remove_node(id)?;
                self.backend.save()?;
                Ok(format!("Removed {}", name))
            }
        }
    }

    fn station_id(&self, name: &str) -> Option<NodeId> {
        self.backend.lookup_by_title(name).map(|frozen| frozen.thaw())
    }

    pub fn station_rows(&self, ids: &[NodeId]) -> Vec<StationRow> {
        let db = self.backend.db();
        ids.iter()
            .filter_map(|id| db.get(*id).ok())
            .map(|node| StationRow {
                id: node.id().value(),
                name: node.name().to_string(),
                genre: node.string(PropId::Genre).unwrap_or("").to_string(),
                location: node.string(PropId::Location).unwrap_or("").to_string(),
                alternates: node
                    .list(PropId::AltLocations)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default(),
                play_count: node.integer(PropId::PlayCount).unwrap_or(0),
                last_played: node.string(PropId::LastPlayedStr).unwrap_or("").to_string(),
            })
            .collect()
    }

    fn render_stations(&self, ids: &[NodeId], format: &str) -> String {
        let rows = self.station_rows(ids);
        if format == "json" {
            return json!({ "count": rows.len(), "stations": rows }).to_string();
        }
        if rows.is_empty() {
            return "No stations".to_string();
        }
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Name", "Genre", "Location", "Plays", "Last Played"]);
        for row in &rows {
            table.add_row(vec![
                row.name.clone(),
                row.genre.clone(),
                row.location.clone(),
                row.play_count.to_string(),
                row.last_played.clone(),
            ]);
        }
        table.to_string()
    }

    fn render_genres(&self, format: &str) -> String {
        let db = self.backend.db();
        let genres: Vec<(String, usize)> = self
            .backend
            .get_genre_names()
            .into_iter()
            .map(|name| {
                let count = self
                    .backend
                    .get_genre_by_name(&name)
                    .and_then(|id| db.children_len(id).ok())
                    .unwrap_or(0);
                (name, count)
            })
            .collect();

        if format == "json" {
            let entries: Vec<_> = genres
                .iter()
                .map(|(name, count)| json!({ "name": name, "stations": count }))
                .collect();
            return json!({ "count": self.backend.genre_count(), "genres": entries }).to_string();
        }
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec!["Genre", "Stations"]);
        for (name, count) in &genres {
            table.add_row(vec![name.clone(), count.to_string()]);
        }
        table.to_string()
    }
}
