use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use kheyma_api::PaymentMethod;

#[derive(Parser, Debug)]
#[command(name = "kheyma")]
#[command(about = "Kheyma - book desert and beach campsites from the command line")]
#[command(version)]
pub struct Cli {
    /// Directory holding the persisted session (default: KHEYMA_STATE_DIR or .kheyma)
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<String>,

    /// Backend base URL (default: KHEYMA_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(short, long)]
        email: String,
        /// Password (default: KHEYMA_PASSWORD)
        #[arg(short, long, env = "KHEYMA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "KHEYMA_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name (defaults to the part of the email before '@')
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Sign out and forget the persisted session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Exchange the session token for a fresh one
    Refresh,

    /// Update the signed-in user's profile
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Browse or search public campsites
    #[command(alias = "ls")]
    Campsites {
        #[arg(long, default_value = "0")]
        page: u32,
        #[arg(long, default_value = "10")]
        size: u32,
        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,
        /// Required tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Minimum rating (1-5)
        #[arg(long)]
        rating: Option<u8>,
    },

    /// Newest campsites
    Featured {
        #[arg(default_value = "6")]
        count: u32,
    },

    /// Show one campsite with its packages and latest reviews
    Campsite { id: String },

    /// Price a stay, and book it unless --quote is given
    Book {
        /// Campsite id
        campsite: String,
        /// Package id
        #[arg(long)]
        package: Option<String>,
        #[arg(long)]
        check_in: Option<NaiveDate>,
        #[arg(long)]
        check_out: Option<NaiveDate>,
        #[arg(long, default_value = "1")]
        guests: u32,
        #[arg(long, value_enum, default_value = "card")]
        payment: PaymentArg,
        /// Guest name (defaults to the profile name)
        #[arg(long)]
        name: Option<String>,
        /// Guest phone (defaults to the profile phone)
        #[arg(long)]
        phone: Option<String>,
        /// Only show the price summary
        #[arg(long)]
        quote: bool,
    },

    /// List your bookings
    Bookings {
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Show one booking
    Booking { id: String },

    /// Cancel a booking
    Cancel { id: String },

    /// Admin: list users
    AdminUsers {
        #[arg(long, default_value = "0")]
        page: u32,
    },

    /// Admin: show one user
    AdminUser { id: String },

    /// Admin: change a user's role
    SetRole {
        id: String,
        /// New role, e.g. ROLE_ADMIN
        role: String,
    },

    /// Admin: delete a user
    DeleteUser { id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PaymentArg {
    Card,
    Paypal,
    Instapay,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(value: PaymentArg) -> Self {
        match value {
            PaymentArg::Card => PaymentMethod::Card,
            PaymentArg::Paypal => PaymentMethod::Paypal,
            PaymentArg::Instapay => PaymentMethod::Instapay,
        }
    }
}
