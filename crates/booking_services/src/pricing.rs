use serde::Serialize;

use crate::draft::ReservationDraft;
use crate::error::CheckoutError;
use crate::fees::FeeSchedule;

/// Breakdown shown next to the checkout form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSummary {
    /// Package price, or the campsite price when no package is chosen
    pub nightly: f64,
    /// Nights priced; the fee schedule's default when the draft has no dates
    pub nights: u32,
    /// `nightly * nights`
    pub subtotal: f64,
    /// Flat service fee
    pub service_fee: f64,
    /// Flat cleaning fee
    pub cleaning_fee: f64,
    /// `subtotal + service_fee + cleaning_fee`
    pub total: f64,
}

/// Price a draft
///
/// Pure: the same draft and schedule always give the same summary.
pub fn price_summary(
    draft: &ReservationDraft,
    fees: &FeeSchedule,
) -> Result<PriceSummary, CheckoutError> {
    draft.validate()?;
    let campsite = draft.campsite.as_ref().ok_or(CheckoutError::MissingCampsite)?;

    let nightly = draft
        .package
        .as_ref()
        .and_then(|p| p.price)
        .or(campsite.price_per_night)
        .filter(|price| price.is_finite() && *price >= 0.0)
        .ok_or(CheckoutError::MissingPrice)?;

    let nights = draft.stay_nights()?.unwrap_or(fees.default_nights).max(1);
    let subtotal = nightly * f64::from(nights);

    Ok(PriceSummary {
        nightly,
        nights,
        subtotal,
        service_fee: fees.service_fee,
        cleaning_fee: fees.cleaning_fee,
        total: subtotal + fees.service_fee + fees.cleaning_fee,
    })
}
