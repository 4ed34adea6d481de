use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kheyma_api::{ApiError, PageQuery};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::page::PageState;
use crate::source::PageSource;

/// What happened to a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the state
    Applied,
    /// The page index was out of range; nothing was requested
    Rejected,
    /// A newer request was issued before this one completed; its response was dropped
    Superseded,
}

/// Paginated view over a [`PageSource`]
///
/// Every request takes a ticket. When a response arrives, it is applied only if
/// its ticket is still the newest one, so the shown page always matches the
/// last page requested even when responses arrive out of order.
pub struct ListingController<T> {
    source: Arc<dyn PageSource<T>>,
    state: watch::Sender<PageState<T>>,
    latest: AtomicU64,
}

impl<T> ListingController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller showing nothing yet
    pub fn new(source: Arc<dyn PageSource<T>>, page_size: u32) -> Self {
        let (state, _) = watch::channel(PageState::new(page_size));
        Self {
            source,
            state,
            latest: AtomicU64::new(0),
        }
    }

    /// Copy of the current page state
    pub fn state(&self) -> PageState<T> {
        self.state.borrow().clone()
    }

    /// Observe page state changes
    pub fn subscribe(&self) -> watch::Receiver<PageState<T>> {
        self.state.subscribe()
    }

    /// Request `page_index`
    ///
    /// Out-of-range indices are rejected without a request. A failed request
    /// leaves the shown items in place and records the error message.
    pub async fn load(&self, page_index: u32) -> Result<LoadOutcome, ApiError> {
        let (allowed, page_size) = {
            let state = self.state.borrow();
            (state.can_load(page_index), state.page_size)
        };
        if !allowed {
            debug!("Ignoring request for out-of-range page {}", page_index);
            return Ok(LoadOutcome::Rejected);
        }

        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.requested_page = page_index;
            state.loading = true;
        });

        let result = self.source.fetch(PageQuery::new(page_index, page_size)).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!("Discarding stale response for page {}", page_index);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(response) => {
                debug!(
                    "Loaded page {} ({} items, {} pages)",
                    page_index,
                    response.content.len(),
                    response.total_pages
                );
                self.state.send_modify(|state| state.apply(page_index, response));
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                warn!("Failed to load page {}: {}", page_index, e);
                let message = e.user_message("Failed to load page");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message);
                });
                Err(e)
            }
        }
    }

    /// Load the page after the most recently requested one
    pub async fn next(&self) -> Result<LoadOutcome, ApiError> {
        let target = {
            let state = self.state.borrow();
            state.has_next().then(|| state.requested_page + 1)
        };
        match target {
            Some(page_index) => self.load(page_index).await,
            None => Ok(LoadOutcome::Rejected),
        }
    }

    /// Load the page before the most recently requested one
    pub async fn previous(&self) -> Result<LoadOutcome, ApiError> {
        let target = {
            let state = self.state.borrow();
            state.has_previous().then(|| state.requested_page - 1)
        };
        match target {
            Some(page_index) => self.load(page_index).await,
            None => Ok(LoadOutcome::Rejected),
        }
    }

    /// Reload the most recently requested page
    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let page_index = self.state.borrow().requested_page;
        self.load(page_index).await
    }
}
