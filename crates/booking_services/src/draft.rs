use chrono::NaiveDate;
use kheyma_api::{CreateTransactionRequest, Location, Package, PaymentMethod};
use serde::Serialize;
use session_services::Identity;
use validator::Validate;

use crate::error::CheckoutError;

/// Package type sent when no package was chosen
pub const DEFAULT_PACKAGE_TYPE: &str = "BASIC";

/// Unsaved reservation selection
///
/// Lives only on the client until it is submitted. Submitting never
/// modifies it, so a failed submission can be retried with the same draft.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDraft {
    /// Campsite being booked
    pub campsite: Option<Location>,
    /// Chosen package; must be one of the campsite's packages
    pub package: Option<Package>,
    /// Check-in date
    pub check_in: Option<NaiveDate>,
    /// Check-out date
    pub check_out: Option<NaiveDate>,
    /// Number of guests
    pub guest_count: u32,
}

impl ReservationDraft {
    /// Start a draft for one guest at `campsite`
    pub fn for_campsite(campsite: Location) -> Self {
        Self {
            campsite: Some(campsite),
            package: None,
            check_in: None,
            check_out: None,
            guest_count: 1,
        }
    }

    /// Choose the campsite package with id `package_id`
    pub fn select_package(&mut self, package_id: &str) -> Result<&Package, CheckoutError> {
        let campsite = self.campsite.as_ref().ok_or(CheckoutError::MissingCampsite)?;
        let package = campsite
            .packages
            .iter()
            .find(|p| p.id == package_id)
            .cloned()
            .ok_or_else(|| CheckoutError::UnknownPackage(package_id.to_string()))?;
        Ok(self.package.insert(package))
    }

    /// Set the stay dates
    pub fn with_dates(mut self, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        self.check_in = Some(check_in);
        self.check_out = Some(check_out);
        self
    }

    /// Set the number of guests
    pub fn with_guests(mut self, guest_count: u32) -> Self {
        self.guest_count = guest_count;
        self
    }

    /// Identifier of the selected campsite
    pub fn campsite_id(&self) -> Option<&str> {
        self.campsite.as_ref().map(|c| c.id.as_str())
    }

    /// Nights between the dates, `None` when no dates are set
    pub fn stay_nights(&self) -> Result<Option<u32>, CheckoutError> {
        match (self.check_in, self.check_out) {
            (None, None) => Ok(None),
            (Some(check_in), Some(check_out)) if check_in < check_out => {
                let nights = (check_out - check_in).num_days();
                u32::try_from(nights)
                    .map(Some)
                    .map_err(|_| CheckoutError::InvalidDateRange)
            }
            _ => Err(CheckoutError::InvalidDateRange),
        }
    }

    /// Check the draft's own invariants
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let campsite = self.campsite.as_ref().ok_or(CheckoutError::MissingCampsite)?;

        if let Some(package) = &self.package {
            if !campsite.packages.iter().any(|p| p.id == package.id) {
                return Err(CheckoutError::UnknownPackage(package.id.clone()));
            }
        }

        if self.guest_count == 0 {
            return Err(CheckoutError::InvalidGuestCount);
        }

        self.stay_nights()?;
        Ok(())
    }

    /// Build the create-transaction request charging `amount`
    pub(crate) fn to_request(
        &self,
        amount: f64,
        payment_method: PaymentMethod,
    ) -> Result<CreateTransactionRequest, CheckoutError> {
        let location_id = self.campsite_id().ok_or(CheckoutError::MissingCampsite)?;
        let package_type = self
            .package
            .as_ref()
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PACKAGE_TYPE);

        Ok(CreateTransactionRequest {
            location_id: location_id.to_string(),
            package_type: package_type.to_string(),
            amount,
            start_date: self.check_in,
            end_date: self.check_out,
            payment_method,
        })
    }
}

/// Contact details of the guest making the booking
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct GuestInfo {
    /// Full name of the guest
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    /// Contact email
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Contact phone number
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

impl GuestInfo {
    /// Prefill from the signed-in identity
    pub fn from_identity(identity: &Identity) -> Self {
        let phone = ["phone", "phoneNumber"]
            .iter()
            .find_map(|key| identity.extra.get(*key).and_then(|v| v.as_str()))
            .unwrap_or_default();

        Self {
            full_name: identity.name.clone().unwrap_or_default(),
            email: identity.email.clone(),
            phone: phone.to_string(),
        }
    }

    /// Copy with surrounding whitespace removed
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}
