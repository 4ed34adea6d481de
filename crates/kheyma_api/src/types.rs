use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Request structure for user login
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    /// Email address of the user
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request structure for user registration
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    /// Email address of the user
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Display name of the user
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Response to login, register and refresh
///
/// `user` is left as raw JSON: the backend has shipped more than one user
/// shape and the session layer normalizes it. Older deployments omit `user`
/// and send `email` and `userType` at the top level instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent calls
    pub token: String,

    /// Token lifetime as reported by the backend
    #[serde(default)]
    pub expiration: Option<i64>,

    /// User record in whichever shape the backend sent
    #[serde(default)]
    pub user: Option<Value>,

    /// Top-level email of legacy responses
    #[serde(default)]
    pub email: Option<String>,

    /// Top-level user type of legacy responses
    #[serde(default)]
    pub user_type: Option<String>,
}

/// Partial update of the current user's profile
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// New age
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// New phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// User record as listed by the admin endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique identifier for the user
    pub id: String,
    /// Email address of the user
    pub email: String,
    /// Name of the user
    #[serde(default)]
    pub name: Option<String>,
    /// Age of the user
    #[serde(default)]
    pub age: Option<u32>,
    /// Phone number of the user
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Granted roles such as `ROLE_ADMIN`
    #[serde(default)]
    pub roles: Vec<String>,
    /// Whether the account is active
    #[serde(default)]
    pub active: bool,
}

/// Bookable package offered by a campsite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package identifier
    pub id: String,
    /// Display name, also sent as the transaction's package type
    pub name: String,
    /// Nightly price; falls back to the campsite price when absent
    #[serde(default)]
    pub price: Option<f64>,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
}

/// Campsite ("location") as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Location identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Description text
    #[serde(default)]
    pub description: Option<String>,
    /// Latitude of the campsite
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude of the campsite
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Default nightly price
    #[serde(default)]
    pub price_per_night: Option<f64>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Kind of terrain (DESERT, OASIS, BEACH, ...)
    #[serde(default)]
    pub location_type: Option<String>,
    /// Average review rating
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Number of reviews
    #[serde(default)]
    pub review_count: Option<u32>,
    /// Packages on offer
    #[serde(default)]
    pub packages: Vec<Package>,
}

/// Review of a campsite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review identifier
    pub id: String,
    /// Reviewed location
    pub location_id: String,
    /// Author id
    #[serde(default)]
    pub user_id: Option<String>,
    /// Author display name
    #[serde(default)]
    pub user_name: Option<String>,
    /// Rating from 1 to 5
    #[serde(default)]
    pub rating: Option<u8>,
    /// Review text
    #[serde(default)]
    pub comment: Option<String>,
    /// When the review was written
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Payment methods a booking can be submitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Credit or debit card
    Card,
    /// PayPal
    Paypal,
    /// InstaPay bank transfer
    Instapay,
}

impl PaymentMethod {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "CARD",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::Instapay => "INSTAPAY",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARD" => Ok(PaymentMethod::Card),
            "PAYPAL" => Ok(PaymentMethod::Paypal),
            "INSTAPAY" => Ok(PaymentMethod::Instapay),
            other => Err(format!("Unsupported payment method: {}", other)),
        }
    }
}

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Created, awaiting payment confirmation
    Pending,
    /// Paid and confirmed
    Confirmed,
    /// Cancelled by the user or an admin
    Cancelled,
    /// Stay completed
    Completed,
    /// Payment returned
    Refunded,
}

/// Request structure for creating a booking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Booked location
    pub location_id: String,
    /// Package name
    pub package_type: String,
    /// Total amount charged
    pub amount: f64,
    /// Check-in date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Check-out date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Chosen payment method
    pub payment_method: PaymentMethod,
}

/// Booking record as confirmed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server-assigned identifier
    pub id: String,
    /// Booked location
    pub location_id: String,
    /// Owner of the booking
    #[serde(default)]
    pub user_id: Option<String>,
    /// Package name
    #[serde(default)]
    pub package_type: Option<String>,
    /// Total amount charged
    pub amount: f64,
    /// Check-in date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Check-out date
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Payment method as recorded by the backend, which also knows
    /// `STRIPE` and `CASH`
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Current status
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    /// When the booking was created
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Server-side page envelope
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items of the requested page
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Number of pages available
    #[serde(default)]
    pub total_pages: u32,
    /// Number of items across all pages
    #[serde(default)]
    pub total_elements: u64,
    /// Whether this is the first page
    #[serde(default)]
    pub first: bool,
    /// Whether this is the last page
    #[serde(default)]
    pub last: bool,
}

/// Page index (zero based) and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Zero-based page index
    pub page: u32,
    /// Items per page
    pub size: u32,
}

impl PageQuery {
    /// Create a page query
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("size", self.size.to_string())]
    }
}

/// Sort order for the public campsite listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSort {
    /// Field to sort by (default: `createdAt`)
    pub sort_by: String,
    /// `asc` or `desc` (default: `desc`)
    pub sort_dir: String,
}

impl Default for LocationSort {
    fn default() -> Self {
        Self {
            sort_by: "createdAt".to_string(),
            sort_dir: "desc".to_string(),
        }
    }
}

/// Filters for campsite search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationFilters {
    /// Free-text query
    pub query: Option<String>,
    /// Required tags
    pub tags: Vec<String>,
    /// Minimum nightly price
    pub min_price: Option<f64>,
    /// Maximum nightly price
    pub max_price: Option<f64>,
    /// Minimum rating
    pub rating: Option<u8>,
}

impl LocationFilters {
    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.query.is_none()
            && self.tags.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.rating.is_none()
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(ref query) = self.query {
            params.push(("q", query.clone()));
        }

        for tag in &self.tags {
            params.push(("tags", tag.clone()));
        }

        if let Some(min_price) = self.min_price {
            params.push(("minPrice", min_price.to_string()));
        }

        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }

        if let Some(rating) = self.rating {
            params.push(("rating", rating.to_string()));
        }

        params
    }
}
