//! Debounced city autocomplete.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use skycast_weather::{CityLookup, CitySuggestion, MIN_QUERY_CHARS};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Runs only the most recently scheduled job, `delay` after it was scheduled.
///
/// Scheduling a new job cancels the pending one, including one whose delay
/// has already elapsed and is still running.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn schedule<F>(&self, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = async {
                    tokio::time::sleep(delay).await;
                    job.await;
                } => {}
            }
        })
    }

    /// Drop the pending job, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Search box state: feed it keystrokes, read suggestions from `subscribe`.
pub struct CitySearch {
    lookup: Arc<dyn CityLookup>,
    debouncer: Debouncer,
    suggestions: Arc<watch::Sender<Vec<CitySuggestion>>>,
}

impl CitySearch {
    pub fn new(lookup: Arc<dyn CityLookup>, delay: Duration) -> Self {
        let (suggestions, _) = watch::channel(Vec::new());
        Self {
            lookup,
            debouncer: Debouncer::new(delay),
            suggestions: Arc::new(suggestions),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CitySuggestion>> {
        self.suggestions.subscribe()
    }

    pub fn suggestions(&self) -> Vec<CitySuggestion> {
        self.suggestions.borrow().clone()
    }

    /// Handle the current contents of the search box.
    pub fn on_input(&self, query: &str) {
        let query = query.trim().to_string();

        if query.chars().count() < MIN_QUERY_CHARS {
            self.debouncer.cancel();
            self.suggestions.send_if_modified(|current| {
                let changed = !current.is_empty();
                current.clear();
                changed
            });
            return;
        }

        let lookup = Arc::clone(&self.lookup);
        let suggestions = Arc::clone(&self.suggestions);
        self.debouncer.schedule(async move {
            let results = lookup.search(&query).await;
            tracing::debug!("{} suggestions for {:?}", results.len(), query);
            suggestions.send_replace(results);
        });
    }

    /// Clear suggestions, e.g. after one was picked.
    pub fn clear(&self) {
        self.on_input("");
    }
}
