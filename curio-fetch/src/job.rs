//! Running one search to completion.

use crate::fetcher::Fetcher;
use crate::request::{FetchEvent, FetchRequest, FetchResult, MessageLevel};
use curio_model::Entry;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// What one search produced.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Results in the order the source reported them.
    pub results: Vec<FetchResult>,
    pub messages: Vec<(MessageLevel, String)>,
    /// Results resolved into entries, by uid. Results that could not be
    /// resolved are missing.
    pub entries: Vec<(u32, Entry)>,
}

impl FetchOutcome {
    /// The first error message, if the source reported any.
    pub fn error(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|(level, _)| *level == MessageLevel::Error)
            .map(|(_, text)| text.as_str())
    }
}

/// Drives one fetcher through a search session.
///
/// The job reads the fetcher's event channel directly. Events from other
/// fetchers on the same channel are discarded while it runs.
pub struct FetchJob<'a> {
    fetcher: Arc<dyn Fetcher>,
    events: &'a mut UnboundedReceiver<FetchEvent>,
    max_results: Option<usize>,
}

impl<'a> FetchJob<'a> {
    pub fn new(fetcher: Arc<dyn Fetcher>, events: &'a mut UnboundedReceiver<FetchEvent>) -> Self {
        Self {
            fetcher,
            events,
            max_results: None,
        }
    }

    /// Stops the search once this many results have arrived.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Searches and collects results and messages until the session ends.
    pub async fn collect(&mut self, request: FetchRequest) -> FetchOutcome {
        // a session still running would end with a Done of its own
        self.fetcher.stop();
        self.drain();

        let id = self.fetcher.id();
        let mut outcome = FetchOutcome::default();
        self.fetcher.search(request);
        while let Some(event) = self.events.recv().await {
            if event.fetcher() != id {
                continue;
            }
            match event {
                FetchEvent::ResultFound(result) => {
                    if self.is_full(&outcome) {
                        continue;
                    }
                    outcome.results.push(result);
                    if self.is_full(&outcome) {
                        debug!(source = %self.fetcher.source(), "result limit reached");
                        self.fetcher.stop();
                    }
                }
                FetchEvent::Message { level, text, .. } => outcome.messages.push((level, text)),
                FetchEvent::Done { .. } => break,
            }
        }
        outcome
    }

    /// Searches, then resolves every result into an entry.
    pub async fn run(mut self, request: FetchRequest) -> FetchOutcome {
        let mut outcome = self.collect(request).await;
        for result in &outcome.results {
            match self.fetcher.fetch_entry(result.uid).await {
                Some(entry) => outcome.entries.push((result.uid, entry)),
                None => debug!(source = %self.fetcher.source(), uid = result.uid, "result not resolved"),
            }
        }
        outcome
    }

    fn is_full(&self, outcome: &FetchOutcome) -> bool {
        self.max_results
            .is_some_and(|max| outcome.results.len() >= max)
    }

    fn drain(&mut self) {
        while self.events.try_recv().is_ok() {}
    }
}
