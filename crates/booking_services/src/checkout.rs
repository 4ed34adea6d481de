use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kheyma_api::{ApiClient, PaymentMethod, Transaction};
use session_services::{Identity, Route, SessionHandle};
use tracing::{info, warn};
use validator::Validate;

use crate::draft::{GuestInfo, ReservationDraft};
use crate::error::CheckoutError;
use crate::fees::FeeSchedule;
use crate::pricing::{PriceSummary, price_summary};

/// Drives a draft from the checkout form to a confirmed booking
pub struct CheckoutWorkflow {
    api: Arc<ApiClient>,
    session: Arc<SessionHandle>,
    fees: FeeSchedule,
    in_flight: AtomicBool,
}

impl CheckoutWorkflow {
    /// Create a workflow pricing with `fees`
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionHandle>, fees: FeeSchedule) -> Self {
        Self {
            api,
            session,
            fees,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fee schedule used for pricing
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Guard for the checkout view
    ///
    /// Waits for session bootstrap. Without a session the user is sent to the
    /// login view.
    pub async fn enter(&self) -> Result<Identity, CheckoutError> {
        let state = self.session.wait_ready().await;
        match state.identity() {
            Some(identity) => Ok(identity.clone()),
            None => {
                info!("Checkout requires a signed-in user, redirecting to login");
                self.session.navigator().navigate(Route::Login);
                Err(CheckoutError::LoginRequired)
            }
        }
    }

    /// Price a draft with this workflow's fee schedule
    pub fn quote(&self, draft: &ReservationDraft) -> Result<PriceSummary, CheckoutError> {
        price_summary(draft, &self.fees)
    }

    /// Whether a submission is outstanding; a UI disables its submit control
    /// while this is true
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit the draft as one booking charging the priced total
    ///
    /// Sends exactly one create-transaction request. A second call while one
    /// is outstanding fails with [`CheckoutError::SubmissionInProgress`]
    /// without touching the network. On success the user is sent to the
    /// booking confirmation.
    pub async fn submit(
        &self,
        draft: &ReservationDraft,
        payment_method: PaymentMethod,
        guest: &GuestInfo,
    ) -> Result<Transaction, CheckoutError> {
        let _submission =
            SubmissionGuard::acquire(&self.in_flight).ok_or(CheckoutError::SubmissionInProgress)?;

        self.enter().await?;

        guest
            .trimmed()
            .validate()
            .map_err(|e| CheckoutError::InvalidGuestInfo(guest_message(&e)))?;

        let summary = self.quote(draft)?;
        let request = draft.to_request(summary.total, payment_method)?;

        info!(
            "Submitting booking for campsite {} ({} nights, {} {:.2})",
            request.location_id,
            summary.nights,
            payment_method.as_str(),
            summary.total
        );

        match self.api.create_transaction(&request).await {
            Ok(transaction) => {
                info!("✅ Booking {} created", transaction.id);
                self.session
                    .navigator()
                    .navigate(Route::BookingConfirmation {
                        transaction_id: transaction.id.clone(),
                    });
                Ok(transaction)
            }
            Err(e) => {
                warn!("Booking for campsite {} failed: {}", request.location_id, e);
                Err(CheckoutError::from_submission(&e))
            }
        }
    }
}

/// Marks a submission as outstanding until dropped
struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn guest_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_values()
        .flat_map(|errors| errors.iter())
        .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .collect();
    messages.sort();
    messages.join(", ")
}
