//! Tests for config.rs, registry.rs and manager.rs.

use curio_fetch::{
    FetchContext, FetchError, FetchKey, FetchManager, FetcherConfig, FetcherRegistry,
    FetcherType, FetchersConfig,
};
use curio_model::{CollectionType, ImportFormat, MemoryImageStore};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const CONFIG: &str = r#"
[[fetcher]]
name = "Local Books"
type = "exec"
path = "/usr/local/bin/isbn-lookup"
collection_type = "book"
update_args = "--isbn %{isbn}"
delete_on_remove = true

[fetcher.args]
title = "-t %1"
isbn = "--isbn %1"

[[fetcher]]
name = "MovieMeter"
type = "moviemeter"
api_key = "secret"
optional_fields = ["moviemeter", "alttitle"]

[[fetcher]]
name = "Open Library"
type = "openlibrary"
"#;

fn context() -> FetchContext {
    let (tx, _rx) = mpsc::unbounded_channel();
    FetchContext::new(tx, Arc::new(MemoryImageStore::new()))
}

// ── parsing ─────────────────────────────────────────────────────

#[test]
fn parses_every_fetcher_table() {
    let config = FetchersConfig::from_toml_str(CONFIG).unwrap();
    assert_eq!(config.fetchers.len(), 3);

    let exec = &config.fetchers[0];
    assert_eq!(exec.name, "Local Books");
    assert_eq!(exec.fetcher_type, FetcherType::Exec);
    assert_eq!(exec.path, Some(PathBuf::from("/usr/local/bin/isbn-lookup")));
    assert_eq!(exec.collection_type, Some(CollectionType::Book));
    assert_eq!(exec.args.get(&FetchKey::Title).map(String::as_str), Some("-t %1"));
    assert_eq!(exec.args.get(&FetchKey::Isbn).map(String::as_str), Some("--isbn %1"));
    assert_eq!(exec.update_args.as_deref(), Some("--isbn %{isbn}"));
    assert_eq!(exec.format, ImportFormat::Tellico);
    assert!(exec.delete_on_remove);

    let movies = &config.fetchers[1];
    assert_eq!(movies.fetcher_type, FetcherType::MovieMeter);
    assert_eq!(movies.api_key.as_deref(), Some("secret"));
    assert!(movies.wants_optional("alttitle"));
    assert!(!movies.wants_optional("cover"));

    let books = &config.fetchers[2];
    assert_eq!(books.fetcher_type, FetcherType::OpenLibrary);
    assert!(books.args.is_empty());
    assert!(books.base_url.is_none());
}

#[test]
fn empty_file_has_no_fetchers() {
    let config = FetchersConfig::from_toml_str("").unwrap();
    assert!(config.fetchers.is_empty());
}

#[test]
fn unknown_type_is_rejected() {
    let err = FetchersConfig::from_toml_str(
        r#"
        [[fetcher]]
        name = "Mystery"
        type = "gopher"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, FetchError::Config(_)));
}

#[test]
fn format_names_parse() {
    let config = FetchersConfig::from_toml_str(
        r#"
        [[fetcher]]
        name = "Bib"
        type = "exec"
        format = "bibtexml"
        "#,
    )
    .unwrap();
    assert_eq!(config.fetchers[0].format, ImportFormat::Bibtexml);
}

#[test]
fn loads_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fetchers.toml");
    std::fs::write(&path, CONFIG).unwrap();
    let config = FetchersConfig::load(&path).unwrap();
    assert_eq!(config.fetchers.len(), 3);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = FetchersConfig::load("/nonexistent/fetchers.toml").unwrap_err();
    assert!(matches!(err, FetchError::Io(_)));
}

#[test]
fn fetcher_type_names() {
    for fetcher_type in FetcherType::ALL {
        assert_eq!(fetcher_type.name().parse::<FetcherType>(), Ok(fetcher_type));
    }
    assert_eq!("MovieMeter".parse::<FetcherType>(), Ok(FetcherType::MovieMeter));
    assert!("gopher".parse::<FetcherType>().is_err());
}

// ── registry ────────────────────────────────────────────────────

#[test]
fn default_registry_builds_every_type() {
    let config = FetchersConfig::from_toml_str(CONFIG).unwrap();
    let registry = FetcherRegistry::default();
    let ctx = context();
    for fetcher_config in &config.fetchers {
        let fetcher = registry.build(fetcher_config, &ctx).unwrap();
        assert_eq!(fetcher.fetcher_type(), fetcher_config.fetcher_type);
        assert_eq!(fetcher.source(), fetcher_config.name);
    }
}

#[test]
fn empty_registry_knows_no_types() {
    let registry = FetcherRegistry::empty();
    assert!(!registry.supports(FetcherType::Exec));
    let config = FetcherConfig::new("Books", FetcherType::OpenLibrary);
    let err = registry.build(&config, &context()).err().unwrap();
    assert!(matches!(err, FetchError::UnknownFetcherType(name) if name == "openlibrary"));
}

#[test]
fn missing_settings_are_reported() {
    let registry = FetcherRegistry::default();
    let config = FetcherConfig::new("MovieMeter", FetcherType::MovieMeter);
    let err = registry.build(&config, &context()).err().unwrap();
    assert!(matches!(
        err,
        FetchError::MissingSetting { setting: "api_key", .. }
    ));
}

#[test]
fn bad_base_url_is_reported() {
    let mut config = FetcherConfig::new("Books", FetcherType::OpenLibrary);
    config.base_url = Some("not a url".into());
    let err = FetcherRegistry::default()
        .build(&config, &context())
        .err()
        .unwrap();
    assert!(matches!(err, FetchError::Url(_)));
}

// ── manager ─────────────────────────────────────────────────────

fn manager() -> FetchManager {
    let mut config = FetchersConfig::from_toml_str(CONFIG).unwrap();
    // no api key: skipped
    config
        .fetchers
        .push(FetcherConfig::new("Broken Films", FetcherType::MovieMeter));
    FetchManager::from_config(
        &config,
        &FetcherRegistry::default(),
        Arc::new(MemoryImageStore::new()),
    )
}

#[test]
fn manager_skips_fetchers_that_fail_to_build() {
    let manager = manager();
    let names: Vec<&str> = manager.fetchers().iter().map(|f| f.source()).collect();
    assert_eq!(names, vec!["Local Books", "MovieMeter", "Open Library"]);
}

#[test]
fn sources_for_matches_key_and_collection_type() {
    let manager = manager();
    let names = |key, kind| -> Vec<String> {
        manager
            .sources_for(key, kind)
            .iter()
            .map(|f| f.source().to_string())
            .collect()
    };
    assert_eq!(
        names(FetchKey::Isbn, CollectionType::Book),
        vec!["Local Books", "Open Library"]
    );
    assert_eq!(names(FetchKey::Person, CollectionType::Video), vec!["MovieMeter"]);
    assert_eq!(names(FetchKey::Person, CollectionType::Book), vec!["Open Library"]);
    assert!(names(FetchKey::Upc, CollectionType::Album).is_empty());
}

#[test]
fn fetchers_are_found_by_source_name() {
    let manager = manager();
    assert!(manager.fetcher_by_source("MovieMeter").is_some());
    assert!(manager.fetcher_by_source("Broken Films").is_none());
}
