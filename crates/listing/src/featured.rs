use kheyma_api::{ApiClient, Location, LocationSort, PageQuery};
use tracing::{debug, warn};

/// Newest public campsites for a landing view
///
/// Read-only and best effort: any failure, including an unreachable backend,
/// yields an empty list.
pub async fn featured_locations(api: &ApiClient, count: u32) -> Vec<Location> {
    if count == 0 {
        return Vec::new();
    }

    match api
        .list_locations(PageQuery::new(0, count), &LocationSort::default())
        .await
    {
        Ok(page) => {
            let mut locations = page.content;
            locations.truncate(count as usize);
            debug!("Fetched {} featured campsites", locations.len());
            locations
        }
        Err(e) if e.is_unreachable() => {
            warn!("Backend unreachable, showing no featured campsites");
            Vec::new()
        }
        Err(e) => {
            warn!("Failed to fetch featured campsites: {}", e);
            Vec::new()
        }
    }
}
