//! Call-site guard for search-as-you-type input.
//!
//! Library API for interactive front ends that search on every keystroke.
//! The bundled CLI takes whole queries and calls the resolver directly.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::{model::Location, resolver::LocationResolver};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounces one input stream and keeps only the newest query's results.
///
/// Each [`submit`](Self::submit) waits out the window. If another query arrives
/// before the window ends, or while the search is in flight, the older call
/// resolves to `None`.
#[derive(Debug, Clone)]
pub struct DebouncedSearch {
    resolver: LocationResolver,
    window: Duration,
    latest: Arc<AtomicU64>,
}

impl DebouncedSearch {
    pub fn new(resolver: LocationResolver) -> Self {
        Self::with_window(resolver, DEFAULT_DEBOUNCE)
    }

    pub fn with_window(resolver: LocationResolver, window: Duration) -> Self {
        Self { resolver, window, latest: Arc::new(AtomicU64::new(0)) }
    }

    pub async fn submit(&self, query: &str) -> Option<Vec<Location>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.window).await;
        if !self.is_latest(ticket) {
            return None;
        }

        let results = self.resolver.search(query).await;
        self.is_latest(ticket).then_some(results)
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
