use crate::integration::support::write_seed;
use stationdb::config::DirectoryConfig;
use stationdb::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

fn context(dir: &TempDir) -> CliContext {
    let seed = write_seed(
        dir,
        "seed.xml",
        "<station><name>Jazz One</name><url>http://j1</url><genre>Jazz</genre></station>\
         <station><name>Rock One</name><url>http://r1</url><genre>Rock</genre></station>",
    );
    let config = DirectoryConfig {
        db_file: dir.path().join("stations.xml"),
        seed_file: Some(seed),
        ..DirectoryConfig::default()
    };
    CliContext::new(&config).unwrap()
}

fn json(output: &str) -> serde_json::Value {
    serde_json::from_str(output).unwrap()
}

#[test]
fn list_json_contract_has_required_fields() {
    let dir = TempDir::new().unwrap();
    let mut cli = context(&dir);
    let output = cli
        .execute(&Commands::List {
            genre: None,
            format: "json".to_string(),
        })
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed["count"].as_u64(), Some(2));
    let first = &parsed["stations"][0];
    assert_eq!(first["name"].as_str(), Some("Jazz One"));
    assert_eq!(first["genre"].as_str(), Some("Jazz"));
    assert_eq!(first["location"].as_str(), Some("http://j1"));
    assert_eq!(first["play_count"].as_i64(), Some(0));
    assert_eq!(first["last_played"].as_str(), Some("Never"));
}

#[test]
fn add_then_list_by_genre_and_search() {
    let dir = TempDir::new().unwrap();
    let mut cli = context(&dir);
    cli.execute(&Commands::Add {
        name: "Jazz Two".to_string(),
        genre: "Jazz".to_string(),
        urls: vec!["http://j2".to_string(), "http://j2b".to_string()],
    })
    .unwrap();
    assert!(dir.path().join("stations.xml").exists());

    let by_genre = json(
        &cli.execute(&Commands::List {
            genre: Some("Jazz".to_string()),
            format: "json".to_string(),
        })
        .unwrap(),
    );
    assert_eq!(by_genre["count"].as_u64(), Some(2));
    assert_eq!(by_genre["stations"][1]["alternates"][0].as_str(), Some("http://j2b"));

    let found = json(
        &cli.execute(&Commands::Search {
            text: "rock".to_string(),
            format: "json".to_string(),
        })
        .unwrap(),
    );
    assert_eq!(found["count"].as_u64(), Some(1));
    assert_eq!(found["stations"][0]["name"].as_str(), Some("Rock One"));
}

#[test]
fn genres_json_counts_stations() {
    let dir = TempDir::new().unwrap();
    let mut cli = context(&dir);
    cli.execute(&Commands::SetGenre {
        name: "Rock One".to_string(),
        genre: "Jazz".to_string(),
    })
    .unwrap();
    let parsed = json(
        &cli.execute(&Commands::Genres {
            format: "json".to_string(),
        })
        .unwrap(),
    );
    assert_eq!(parsed["count"].as_u64(), Some(2));
    assert_eq!(parsed["genres"][0]["name"].as_str(), Some("Jazz"));
    assert_eq!(parsed["genres"][0]["stations"].as_u64(), Some(2));
    assert_eq!(parsed["genres"][1]["stations"].as_u64(), Some(0));
}

#[test]
fn text_output_renders_table() {
    let dir = TempDir::new().unwrap();
    let mut cli = context(&dir);
    cli.execute(&Commands::Played {
        name: "Jazz One".to_string(),
    })
    .unwrap();
    let output = cli
        .execute(&Commands::List {
            genre: None,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("Jazz One"));
    assert!(output.contains("Last Played"));

    let removed = cli
        .execute(&Commands::Remove {
            name: "Rock One".to_string(),
        })
        .unwrap();
    assert_eq!(removed, "Removed Rock One");
    assert_eq!(cli.backend().station_count(), 1);
}
