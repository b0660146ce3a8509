//! Builds fetchers from configuration, keyed by [`FetcherType`].

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::exec::ExecFetcher;
use crate::fetcher::{Fetcher, FetcherType};
use crate::openlibrary::OpenLibraryFetcher;
use crate::request::FetchEvent;
use crate::rpc::MovieMeterFetcher;
use curio_model::ImageStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// What a fetcher is connected to when it is built.
#[derive(Clone)]
pub struct FetchContext {
    /// Where the fetcher's events go.
    pub events: UnboundedSender<FetchEvent>,
    /// Where fetched images are stored.
    pub images: Arc<dyn ImageStore>,
}

impl FetchContext {
    pub fn new(events: UnboundedSender<FetchEvent>, images: Arc<dyn ImageStore>) -> Self {
        Self { events, images }
    }
}

type Builder =
    Box<dyn Fn(&FetcherConfig, &FetchContext) -> Result<Arc<dyn Fetcher>, FetchError> + Send + Sync>;

/// Fetcher builders by type.
pub struct FetcherRegistry {
    builders: HashMap<FetcherType, Builder>,
}

impl FetcherRegistry {
    /// A registry with no builders.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registers (or replaces) the builder for `fetcher_type`.
    pub fn register<F>(&mut self, fetcher_type: FetcherType, builder: F)
    where
        F: Fn(&FetcherConfig, &FetchContext) -> Result<Arc<dyn Fetcher>, FetchError>
            + Send
            + Sync
            + 'static,
    {
        self.builders.insert(fetcher_type, Box::new(builder));
    }

    pub fn supports(&self, fetcher_type: FetcherType) -> bool {
        self.builders.contains_key(&fetcher_type)
    }

    /// Builds the fetcher `config` describes.
    pub fn build(
        &self,
        config: &FetcherConfig,
        ctx: &FetchContext,
    ) -> Result<Arc<dyn Fetcher>, FetchError> {
        let builder = self
            .builders
            .get(&config.fetcher_type)
            .ok_or_else(|| FetchError::UnknownFetcherType(config.fetcher_type.to_string()))?;
        builder(config, ctx)
    }
}

impl Default for FetcherRegistry {
    /// A registry that knows every built-in fetcher type.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FetcherType::Exec, |config, ctx| {
            Ok(Arc::new(ExecFetcher::from_config(config, ctx)?))
        });
        registry.register(FetcherType::MovieMeter, |config, ctx| {
            Ok(Arc::new(MovieMeterFetcher::from_config(config, ctx)?))
        });
        registry.register(FetcherType::OpenLibrary, |config, ctx| {
            Ok(Arc::new(OpenLibraryFetcher::from_config(config, ctx)?))
        });
        registry
    }
}
