//! The set of configured sources.

use crate::config::FetchersConfig;
use crate::fetcher::Fetcher;
use crate::job::FetchJob;
use crate::registry::{FetchContext, FetcherRegistry};
use crate::request::{FetchEvent, FetchKey};
use curio_model::{CollectionType, ImageStore};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

/// Owns the configured fetchers and the channel their events arrive on.
pub struct FetchManager {
    fetchers: Vec<Arc<dyn Fetcher>>,
    ctx: FetchContext,
    events: UnboundedReceiver<FetchEvent>,
}

impl FetchManager {
    /// A manager with no sources.
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetchers: Vec::new(),
            ctx: FetchContext::new(tx, images),
            events: rx,
        }
    }

    /// Builds every configured source. A source whose configuration cannot
    /// be built is skipped with a warning.
    pub fn from_config(
        config: &FetchersConfig,
        registry: &FetcherRegistry,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let mut manager = Self::new(images);
        for fetcher_config in &config.fetchers {
            match registry.build(fetcher_config, &manager.ctx) {
                Ok(fetcher) => manager.add_fetcher(fetcher),
                Err(e) => warn!(
                    source = %fetcher_config.name,
                    error = %e,
                    "skipping fetcher"
                ),
            }
        }
        info!(fetchers = manager.fetchers.len(), "fetchers loaded");
        manager
    }

    /// The context new fetchers for this manager should be built with.
    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    pub fn add_fetcher(&mut self, fetcher: Arc<dyn Fetcher>) {
        self.fetchers.push(fetcher);
    }

    pub fn fetchers(&self) -> &[Arc<dyn Fetcher>] {
        &self.fetchers
    }

    /// Sources that can search by `key` for a collection of `kind`.
    pub fn sources_for(&self, key: FetchKey, kind: CollectionType) -> Vec<Arc<dyn Fetcher>> {
        self.fetchers
            .iter()
            .filter(|f| f.can_search(key) && f.can_fetch(kind))
            .cloned()
            .collect()
    }

    pub fn fetcher_by_source(&self, source: &str) -> Option<Arc<dyn Fetcher>> {
        self.fetchers
            .iter()
            .find(|f| f.source() == source)
            .cloned()
    }

    /// A job running `fetcher` against this manager's event channel.
    pub fn job(&mut self, fetcher: Arc<dyn Fetcher>) -> FetchJob<'_> {
        FetchJob::new(fetcher, &mut self.events)
    }

    /// Stops every running search.
    pub fn stop_all(&self) {
        for fetcher in self.fetchers.iter().filter(|f| f.is_searching()) {
            fetcher.stop();
        }
    }
}
