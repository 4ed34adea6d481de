use std::sync::Arc;

use async_trait::async_trait;
use kheyma_api::{
    ApiClient, ApiError, Location, LocationFilters, LocationSort, PageQuery, PageResponse, Review,
    Transaction, UserRecord,
};

/// Something that can fetch one page of `T`
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetch the page described by `page`
    async fn fetch(&self, page: PageQuery) -> Result<PageResponse<T>, ApiError>;
}

/// Users for the admin dashboard
pub struct AdminUsers {
    api: Arc<ApiClient>,
}

impl AdminUsers {
    /// Create the source
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<UserRecord> for AdminUsers {
    async fn fetch(&self, page: PageQuery) -> Result<PageResponse<UserRecord>, ApiError> {
        self.api.admin_users(page).await
    }
}

/// Public campsites, optionally filtered
///
/// Without filters the public listing endpoint is used; with any filter the
/// search endpoint is used instead.
pub struct PublicLocations {
    api: Arc<ApiClient>,
    filters: LocationFilters,
    sort: LocationSort,
}

impl PublicLocations {
    /// Create the source
    pub fn new(api: Arc<ApiClient>, filters: LocationFilters) -> Self {
        Self {
            api,
            filters,
            sort: LocationSort::default(),
        }
    }

    /// Override the sort order of the unfiltered listing
    pub fn sorted(mut self, sort: LocationSort) -> Self {
        self.sort = sort;
        self
    }
}

#[async_trait]
impl PageSource<Location> for PublicLocations {
    async fn fetch(&self, page: PageQuery) -> Result<PageResponse<Location>, ApiError> {
        if self.filters.is_empty() {
            self.api.list_locations(page, &self.sort).await
        } else {
            self.api.search_locations(&self.filters, page).await
        }
    }
}

/// Reviews of one campsite
pub struct LocationReviews {
    api: Arc<ApiClient>,
    location_id: String,
}

impl LocationReviews {
    /// Create the source
    pub fn new(api: Arc<ApiClient>, location_id: impl Into<String>) -> Self {
        Self {
            api,
            location_id: location_id.into(),
        }
    }
}

#[async_trait]
impl PageSource<Review> for LocationReviews {
    async fn fetch(&self, page: PageQuery) -> Result<PageResponse<Review>, ApiError> {
        self.api.location_reviews(&self.location_id, page).await
    }
}

/// Bookings of the signed-in user
pub struct UserBookings {
    api: Arc<ApiClient>,
}

impl UserBookings {
    /// Create the source
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Transaction> for UserBookings {
    async fn fetch(&self, page: PageQuery) -> Result<PageResponse<Transaction>, ApiError> {
        self.api.user_transactions(page).await
    }
}
