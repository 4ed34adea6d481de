use std::sync::Arc;

use kheyma_api::{ApiClient, ApiError, Transaction};
use listing::{DEFAULT_PAGE_SIZE, ListingController, LoadOutcome, UserBookings};
use tracing::{info, warn};

/// Bookings of the signed-in user
pub struct BookingService {
    api: Arc<ApiClient>,
    history: ListingController<Transaction>,
}

impl BookingService {
    /// Create the service with the default page size
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_page_size(api, DEFAULT_PAGE_SIZE)
    }

    /// Create the service with `page_size` bookings per history page
    pub fn with_page_size(api: Arc<ApiClient>, page_size: u32) -> Self {
        let source = Arc::new(UserBookings::new(api.clone()));
        Self {
            api,
            history: ListingController::new(source, page_size),
        }
    }

    /// Paginated booking history
    pub fn history(&self) -> &ListingController<Transaction> {
        &self.history
    }

    /// Load one page of the booking history
    pub async fn load_history(&self, page_index: u32) -> Result<LoadOutcome, ApiError> {
        self.history.load(page_index).await
    }

    /// Fetch one booking
    pub async fn get(&self, id: &str) -> Result<Transaction, ApiError> {
        self.api.get_transaction(id).await
    }

    /// Cancel a booking and reload the shown history page
    pub async fn cancel(&self, id: &str) -> Result<Transaction, ApiError> {
        let cancelled = self.api.cancel_transaction(id).await?;
        info!("Booking {} cancelled", cancelled.id);

        if self.history.state().total_pages.is_some() {
            if let Err(e) = self.history.refresh().await {
                warn!("Failed to reload booking history after cancelling: {}", e);
            }
        }

        Ok(cancelled)
    }
}
