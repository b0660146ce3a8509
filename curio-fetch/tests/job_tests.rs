//! Tests for job.rs: running a search to completion through the manager.

use async_trait::async_trait;
use curio_fetch::{
    FetchKey, FetchManager, FetchRequest, Fetcher, FetcherCore, FetcherId, FetcherType,
    MessageLevel,
};
use curio_model::{CollectionSchema, CollectionType, Entry, MemoryImageStore};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers every search with a fixed list of titles.
struct ListFetcher {
    core: FetcherCore,
    titles: Vec<&'static str>,
    warning: Option<&'static str>,
    entries: Arc<Mutex<HashMap<u32, String>>>,
}

impl ListFetcher {
    fn new(manager: &FetchManager, name: &str, titles: Vec<&'static str>) -> Self {
        Self {
            core: FetcherCore::new(name, manager.context().events.clone()),
            titles,
            warning: None,
            entries: Arc::default(),
        }
    }
}

#[async_trait]
impl Fetcher for ListFetcher {
    fn id(&self) -> FetcherId {
        self.core.id()
    }

    fn source(&self) -> &str {
        self.core.source()
    }

    fn fetcher_type(&self) -> FetcherType {
        FetcherType::Exec
    }

    fn can_fetch(&self, kind: CollectionType) -> bool {
        kind == CollectionType::Book
    }

    fn can_search(&self, key: FetchKey) -> bool {
        key == FetchKey::Title
    }

    fn is_searching(&self) -> bool {
        self.core.is_searching()
    }

    fn search(&self, _request: FetchRequest) {
        let titles = self.titles.clone();
        let warning = self.warning;
        let entries = Arc::clone(&self.entries);
        self.core.start(move |session| async move {
            if let Some(warning) = warning {
                session.message(MessageLevel::Warning, warning);
            }
            for title in titles {
                let result = session.make_result(title, "", "");
                entries.lock().unwrap().insert(result.uid, title.to_string());
                session.result(result);
                tokio::task::yield_now().await;
            }
        });
    }

    fn stop(&self) {
        self.core.stop();
    }

    async fn fetch_entry(&self, uid: u32) -> Option<Entry> {
        let title = self.entries.lock().unwrap().get(&uid).cloned()?;
        let mut entry = Entry::new(CollectionSchema::for_kind(CollectionType::Book).into_shared());
        entry.set_field("title", &title);
        Some(entry)
    }

    fn update_request(&self, entry: &Entry) -> Option<FetchRequest> {
        Some(FetchRequest::new(
            CollectionType::Book,
            FetchKey::Title,
            entry.field("title"),
        ))
    }
}

fn request() -> FetchRequest {
    FetchRequest::new(CollectionType::Book, FetchKey::Title, "dune")
}

fn manager() -> FetchManager {
    FetchManager::new(Arc::new(MemoryImageStore::new()))
}

// ── collect ─────────────────────────────────────────────────────

#[tokio::test]
async fn collects_results_and_messages_until_done() {
    let mut manager = manager();
    let mut fetcher = ListFetcher::new(&manager, "Shelf", vec!["Dune", "Dune Messiah"]);
    fetcher.warning = Some("slow source");
    let fetcher: Arc<dyn Fetcher> = Arc::new(fetcher);
    manager.add_fetcher(Arc::clone(&fetcher));

    let outcome = manager.job(Arc::clone(&fetcher)).collect(request()).await;
    let titles: Vec<&str> = outcome.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Dune Messiah"]);
    assert_eq!(
        outcome.messages,
        vec![(MessageLevel::Warning, "slow source".to_string())]
    );
    assert!(outcome.error().is_none());
    assert!(outcome.entries.is_empty());
    assert!(!fetcher.is_searching());
}

#[tokio::test]
async fn stops_at_the_result_limit() {
    let mut manager = manager();
    let fetcher: Arc<dyn Fetcher> = Arc::new(ListFetcher::new(
        &manager,
        "Shelf",
        vec!["Dune", "Dune Messiah", "Children of Dune", "God Emperor of Dune"],
    ));

    let outcome = manager
        .job(Arc::clone(&fetcher))
        .with_max_results(2)
        .run(request())
        .await;
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.entries.len(), 2);
    assert!(!fetcher.is_searching());
}

#[tokio::test]
async fn ignores_events_from_other_fetchers() {
    let mut manager = manager();
    let other = ListFetcher::new(&manager, "Other", vec!["Neuromancer"]);
    let fetcher: Arc<dyn Fetcher> = Arc::new(ListFetcher::new(&manager, "Shelf", vec!["Dune"]));

    other.search(request());
    let outcome = manager.job(fetcher).run(request()).await;
    let titles: Vec<&str> = outcome.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune"]);
}

// ── run ─────────────────────────────────────────────────────────

#[tokio::test]
async fn run_resolves_every_result() {
    let mut manager = manager();
    let fetcher: Arc<dyn Fetcher> =
        Arc::new(ListFetcher::new(&manager, "Shelf", vec!["Dune", "Dune Messiah"]));

    let outcome = manager.job(fetcher).run(request()).await;
    let entries: Vec<(u32, String)> = outcome
        .entries
        .iter()
        .map(|(uid, entry)| (*uid, entry.title()))
        .collect();
    let expected: Vec<(u32, String)> = outcome
        .results
        .iter()
        .map(|r| (r.uid, r.title.clone()))
        .collect();
    assert_eq!(entries, expected);
}

#[tokio::test]
async fn empty_search_yields_an_empty_outcome() {
    let mut manager = manager();
    let fetcher: Arc<dyn Fetcher> = Arc::new(ListFetcher::new(&manager, "Shelf", Vec::new()));

    let outcome = manager.job(fetcher).run(request()).await;
    assert!(outcome.results.is_empty());
    assert!(outcome.messages.is_empty());
    assert!(outcome.entries.is_empty());
}
