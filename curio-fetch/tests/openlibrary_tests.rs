//! Tests for openlibrary.rs against a mock search server.

use curio_fetch::{
    FetchContext, FetchEvent, FetchKey, FetchRequest, FetchResult, Fetcher, FetcherConfig,
    FetcherType, MessageLevel, OpenLibraryFetcher,
};
use curio_model::{CollectionSchema, CollectionType, Entry, ImageStore, MemoryImageStore, image_id};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    fetcher: OpenLibraryFetcher,
    events: UnboundedReceiver<FetchEvent>,
    images: Arc<MemoryImageStore>,
}

fn harness(server: &MockServer) -> Harness {
    let mut config = FetcherConfig::new("Open Library", FetcherType::OpenLibrary);
    config.base_url = Some(server.uri());
    config.cover_base_url = Some(server.uri());
    let (tx, events) = mpsc::unbounded_channel();
    let images = Arc::new(MemoryImageStore::new());
    let ctx = FetchContext::new(tx, Arc::clone(&images) as Arc<dyn ImageStore>);
    Harness {
        fetcher: OpenLibraryFetcher::from_config(&config, &ctx).unwrap(),
        events,
        images,
    }
}

async fn session_events(rx: &mut UnboundedReceiver<FetchEvent>) -> Vec<FetchEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for the session")
            .expect("channel closed");
        let done = matches!(event, FetchEvent::Done { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

fn results(events: &[FetchEvent]) -> Vec<&FetchResult> {
    events
        .iter()
        .filter_map(|e| match e {
            FetchEvent::ResultFound(r) => Some(r),
            _ => None,
        })
        .collect()
}

fn dune() -> serde_json::Value {
    json!({
        "title": "Dune",
        "author_name": ["Frank Herbert"],
        "publisher": ["Chilton Books", "Ace"],
        "first_publish_year": 1965,
        "isbn": ["0801950775", "9780441172719"],
        "lccn": ["65022482"],
        "number_of_pages_median": 412,
        "cover_i": 11481354,
        "language": ["eng"],
        "subject": ["Science fiction", "Deserts"],
    })
}

// ── search ──────────────────────────────────────────────────────

#[tokio::test]
async fn title_search_builds_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("title", "dune"))
        .and(query_param("limit", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "numFound": 2,
            "docs": [dune(), {"title": "Dune Messiah", "subtitle": "Book two"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Title, "dune"));
    let events = session_events(&mut h.events).await;

    let found: Vec<(&str, &str, &str)> = results(&events)
        .iter()
        .map(|r| (r.title.as_str(), r.description.as_str(), r.isbn.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Dune", "Frank Herbert/Chilton Books/1965", "0801950775"),
            ("Dune Messiah", "//", ""),
        ]
    );
    assert!(!h.fetcher.is_searching());
}

#[tokio::test]
async fn isbn_search_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("isbn", "080442957X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher.search(FetchRequest::new(
        CollectionType::Book,
        FetchKey::Isbn,
        "0-8044-2957-x",
    ));
    let events = session_events(&mut h.events).await;
    assert!(results(&events).is_empty());
}

#[tokio::test]
async fn person_and_keyword_use_their_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("author", "herbert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": [dune()]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("q", "arrakis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": [dune()]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Person, "herbert"));
    assert_eq!(results(&session_events(&mut h.events).await).len(), 1);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Keyword, "arrakis"));
    assert_eq!(results(&session_events(&mut h.events).await).len(), 1);
}

#[tokio::test]
async fn server_error_becomes_an_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Title, "dune"));
    let events = session_events(&mut h.events).await;
    let errors: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            FetchEvent::Message {
                level: MessageLevel::Error,
                text,
                ..
            } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Open Library: "));
}

// ── fetch_entry ─────────────────────────────────────────────────

#[tokio::test]
async fn fetch_entry_downloads_the_cover_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": [dune()]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/id/11481354-M.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Title, "dune"));
    let events = session_events(&mut h.events).await;
    let uid = results(&events)[0].uid;

    let entry = h.fetcher.fetch_entry(uid).await.unwrap();
    assert_eq!(entry.field("title"), "Dune");
    assert_eq!(entry.field("author"), "Frank Herbert");
    assert_eq!(entry.field("publisher"), "Chilton Books");
    assert_eq!(entry.field("pub_year"), "1965");
    assert_eq!(entry.field("isbn"), "0801950775");
    assert_eq!(entry.field("lccn"), "65022482");
    assert_eq!(entry.field("pages"), "412");
    assert_eq!(entry.field("keyword"), "Science fiction; Deserts");

    let cover = image_id(b"jpeg bytes", "JPG");
    assert_eq!(entry.field("cover"), cover);
    assert!(h.images.has_image(&cover));

    let again = h.fetcher.fetch_entry(uid).await.unwrap();
    assert_eq!(again.field("cover"), cover);
}

#[tokio::test]
async fn missing_cover_still_gives_the_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": [dune()]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/id/11481354-M.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.fetcher
        .search(FetchRequest::new(CollectionType::Book, FetchKey::Title, "dune"));
    let events = session_events(&mut h.events).await;
    let entry = h.fetcher.fetch_entry(results(&events)[0].uid).await.unwrap();
    assert_eq!(entry.field("title"), "Dune");
    assert!(entry.field("cover").is_empty());
    assert!(h.images.is_empty());
}

#[tokio::test]
async fn unknown_uid_gives_no_entry() {
    let server = MockServer::start().await;
    let h = harness(&server);
    assert!(h.fetcher.fetch_entry(7).await.is_none());
}

// ── update_request ──────────────────────────────────────────────

#[tokio::test]
async fn update_request_prefers_identifiers() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let mut entry = Entry::new(CollectionSchema::for_kind(CollectionType::Book).into_shared());
    assert!(h.fetcher.update_request(&entry).is_none());

    entry.set_field("title", "Dune");
    assert_eq!(h.fetcher.update_request(&entry).unwrap().key, FetchKey::Title);

    entry.set_field("lccn", "65022482");
    assert_eq!(h.fetcher.update_request(&entry).unwrap().key, FetchKey::Lccn);

    entry.set_field("isbn", "0801950775");
    let request = h.fetcher.update_request(&entry).unwrap();
    assert_eq!(request.key, FetchKey::Isbn);
    assert_eq!(request.value, "0801950775");
}

#[tokio::test]
async fn capabilities() {
    let server = MockServer::start().await;
    let h = harness(&server);
    assert!(h.fetcher.can_fetch(CollectionType::Book));
    assert!(h.fetcher.can_fetch(CollectionType::Bibtex));
    assert!(!h.fetcher.can_fetch(CollectionType::Video));
    assert!(h.fetcher.can_search(FetchKey::Lccn));
    assert!(!h.fetcher.can_search(FetchKey::Upc));
}
