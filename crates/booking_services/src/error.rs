use kheyma_api::ApiError;

/// Errors that can occur while preparing or submitting a booking
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    /// No signed-in session
    #[error("Please sign in to complete your reservation")]
    LoginRequired,

    /// A submission is already outstanding
    #[error("A booking is already being submitted")]
    SubmissionInProgress,

    /// The draft does not reference a campsite
    #[error("No campsite selected")]
    MissingCampsite,

    /// Neither the package nor the campsite carries a usable price
    #[error("No price available for this campsite")]
    MissingPrice,

    /// Only one date given, or check-out not after check-in
    #[error("Invalid date range: check-out date must be after check-in date")]
    InvalidDateRange,

    /// The selected package is not offered by the campsite
    #[error("Package '{0}' is not offered by this campsite")]
    UnknownPackage(String),

    /// Guest count below one
    #[error("At least one guest is required")]
    InvalidGuestCount,

    /// Missing guest details
    #[error("{0}")]
    InvalidGuestInfo(String),

    /// Invalid fee configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend did not accept the booking
    #[error("{message}")]
    Submission {
        /// Message to show the user
        message: String,
        /// Whether submitting the same draft again may succeed
        retryable: bool,
    },
}

impl CheckoutError {
    /// Whether the same draft may be submitted again
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Submission { retryable, .. } => *retryable,
            CheckoutError::SubmissionInProgress => true,
            _ => false,
        }
    }

    /// Map a failed create-transaction call
    ///
    /// A rejected token has already cleared the session, so only that case
    /// is not retryable as-is.
    pub(crate) fn from_submission(error: &ApiError) -> Self {
        match error {
            ApiError::AuthRejected(_) => CheckoutError::Submission {
                message: "Your session has expired. Please sign in again".to_string(),
                retryable: false,
            },
            other => CheckoutError::Submission {
                message: other.user_message("Booking failed. Please try again"),
                retryable: true,
            },
        }
    }
}
