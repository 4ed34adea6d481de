use std::sync::Arc;

use anyhow::{Context as _, bail};
use booking_services::{
    BookingService, CheckoutWorkflow, FeeSchedule, GuestInfo, PriceSummary, ReservationDraft,
};
use kheyma_api::{
    ApiConfig, Location, LocationFilters, ProfileUpdate, Review, Transaction, UserRecord,
};
use listing::{
    AdminUsers, DEFAULT_PAGE_SIZE, ListingController, LoadOutcome, LocationReviews, PageState,
    PublicLocations, featured_locations,
};
use session_services::{FileStore, Navigator, Role, Route, SessionManager};

use crate::cli::{Cli, Commands};

/// Directory used for the session when neither flag nor env var is set
const DEFAULT_STATE_DIR: &str = ".kheyma";

/// Reports where the web front end would send the user
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::Login => log::warn!("🔒 Please sign in: kheyma login --email <EMAIL>"),
            other => log::info!("➡️  {}", other.path()),
        }
    }
}

/// Everything a command needs: the session manager and the fee schedule
pub struct Context {
    manager: SessionManager,
    fees: FeeSchedule,
}

impl Context {
    /// Build the gateway and session from flags and environment, then restore
    /// the persisted session
    pub async fn open(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = ApiConfig::from_env()?;
        if let Some(url) = &cli.api_url {
            config = config.with_base_url(url);
        }

        let state_dir = cli
            .state_dir
            .clone()
            .or_else(|| std::env::var("KHEYMA_STATE_DIR").ok())
            .unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());
        log::debug!("Using session directory {}", state_dir);

        let manager = SessionManager::connect(
            config,
            Arc::new(FileStore::new(state_dir)),
            Arc::new(TerminalNavigator),
        )?;
        manager.bootstrap().await;

        Ok(Self {
            manager,
            fees: FeeSchedule::from_env()?,
        })
    }

    fn require_admin(&self) -> anyhow::Result<()> {
        match self.manager.state().role() {
            Role::Admin => Ok(()),
            Role::User => bail!("Admin access required"),
            Role::Guest => bail!("Not signed in"),
        }
    }
}

/// Run one command
pub async fn dispatch(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    let api = ctx.manager.api().clone();

    match command {
        Commands::Login { email, password } => {
            let role = ctx.manager.login(&email, &password).await?;
            println!("Signed in as {} ({})", email.trim(), role);
            println!("Continue at {}", Route::after_login(role).path());
        }

        Commands::Register {
            email,
            password,
            name,
        } => {
            let role = ctx
                .manager
                .register(&email, &password, name.as_deref())
                .await?;
            println!("Account created for {} ({})", email.trim(), role);
        }

        Commands::Logout => {
            ctx.manager.logout();
            println!("Signed out");
        }

        Commands::Whoami => match ctx.manager.state().identity() {
            Some(identity) => {
                println!("{}", identity.email);
                if let Some(name) = &identity.name {
                    println!("  name: {}", name);
                }
                println!("  role: {}", identity.role);
            }
            None => println!("Not signed in"),
        },

        Commands::Refresh => {
            let role = ctx.manager.refresh().await?;
            println!("Session refreshed ({})", role);
        }

        Commands::UpdateProfile { name, age, phone } => {
            let update = ProfileUpdate {
                name,
                age,
                phone_number: phone,
            };
            let identity = ctx.manager.update_identity(&update).await?;
            println!(
                "Profile updated: {} ({})",
                identity.name.as_deref().unwrap_or(&identity.email),
                identity.role
            );
        }

        Commands::Campsites {
            page,
            size,
            query,
            tags,
            min_price,
            max_price,
            rating,
        } => {
            let filters = LocationFilters {
                query,
                tags,
                min_price,
                max_price,
                rating,
            };
            let source = Arc::new(PublicLocations::new(api, filters));
            let controller = ListingController::<Location>::new(source, size);
            load_page(&controller, page).await?;

            let state = controller.state();
            for location in &state.items {
                println!(
                    "{:<24} {:<32} {}",
                    location.id,
                    location.title,
                    price_label(location.price_per_night)
                );
            }
            print_page_footer(&state);
        }

        Commands::Featured { count } => {
            let featured = featured_locations(&api, count).await;
            if featured.is_empty() {
                println!("No featured campsites right now");
            }
            for location in featured {
                println!("{:<24} {}", location.id, location.title);
            }
        }

        Commands::Campsite { id } => {
            let location = api
                .get_location(&id)
                .await
                .with_context(|| format!("Failed to load campsite {}", id))?;
            println!("{} ({})", location.title, location.id);
            if let Some(description) = &location.description {
                println!("{}", description);
            }
            println!("Price: {}", price_label(location.price_per_night));
            for package in &location.packages {
                println!(
                    "  package {:<16} {:<24} {}",
                    package.id,
                    package.name,
                    price_label(package.price)
                );
            }

            let source = Arc::new(LocationReviews::new(api, id));
            let reviews = ListingController::<Review>::new(source, DEFAULT_PAGE_SIZE);
            load_page(&reviews, 0).await?;
            for review in reviews.state().items {
                println!(
                    "  {}★ {}: {}",
                    review.rating.unwrap_or_default(),
                    review.user_name.as_deref().unwrap_or("guest"),
                    review.comment.as_deref().unwrap_or_default()
                );
            }
        }

        Commands::Book {
            campsite,
            package,
            check_in,
            check_out,
            guests,
            payment,
            name,
            phone,
            quote,
        } => {
            let location = api
                .get_location(&campsite)
                .await
                .with_context(|| format!("Failed to load campsite {}", campsite))?;

            let mut draft = ReservationDraft::for_campsite(location).with_guests(guests);
            if let Some(package) = package {
                draft.select_package(&package)?;
            }
            draft.check_in = check_in;
            draft.check_out = check_out;

            let workflow = CheckoutWorkflow::new(api, ctx.manager.session().clone(), ctx.fees);
            print_summary(&workflow.quote(&draft)?);
            if quote {
                return Ok(());
            }

            let identity = workflow.enter().await?;
            let mut guest = GuestInfo::from_identity(&identity);
            if let Some(name) = name {
                guest.full_name = name;
            }
            if let Some(phone) = phone {
                guest.phone = phone;
            }

            let transaction = workflow.submit(&draft, payment.into(), &guest).await?;
            println!("Booked! Confirmation {}", transaction.id);
        }

        Commands::Bookings { page } => {
            let bookings = BookingService::new(api);
            load_page(bookings.history(), page).await?;

            let state = bookings.history().state();
            for transaction in &state.items {
                print_transaction(transaction);
            }
            print_page_footer(&state);
        }

        Commands::Booking { id } => {
            let transaction = BookingService::new(api).get(&id).await?;
            print_transaction(&transaction);
        }

        Commands::Cancel { id } => {
            let transaction = BookingService::new(api).cancel(&id).await?;
            println!("Cancelled booking {}", transaction.id);
        }

        Commands::AdminUsers { page } => {
            ctx.require_admin()?;
            let source = Arc::new(AdminUsers::new(api));
            let users = ListingController::<UserRecord>::new(source, DEFAULT_PAGE_SIZE);
            load_page(&users, page).await?;

            let state = users.state();
            for user in &state.items {
                println!(
                    "{:<24} {:<32} {:<20} {}",
                    user.id,
                    user.email,
                    user.roles.join(","),
                    if user.active { "active" } else { "inactive" }
                );
            }
            print_page_footer(&state);
        }

        Commands::AdminUser { id } => {
            ctx.require_admin()?;
            let user = api.admin_user(&id).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }

        Commands::SetRole { id, role } => {
            ctx.require_admin()?;
            let user = api.update_user_role(&id, &role).await?;
            println!("{} now has roles {}", user.email, user.roles.join(","));
        }

        Commands::DeleteUser { id } => {
            ctx.require_admin()?;
            api.delete_user(&id).await?;
            println!("Deleted user {}", id);
        }
    }

    Ok(())
}

async fn load_page<T>(controller: &ListingController<T>, page: u32) -> anyhow::Result<()>
where
    T: Clone + Send + Sync + 'static,
{
    match controller.load(page).await? {
        LoadOutcome::Applied => Ok(()),
        LoadOutcome::Rejected => bail!("Page {} does not exist", page),
        LoadOutcome::Superseded => Ok(()),
    }
}

fn print_page_footer<T>(state: &PageState<T>) {
    if state.items.is_empty() {
        println!("Nothing to show");
    }
    println!(
        "Page {} of {} ({} total)",
        u64::from(state.page_index) + 1,
        state.total_pages.unwrap_or(0).max(1),
        state.total_elements
    );
}

fn print_summary(summary: &PriceSummary) {
    println!(
        "EGP {:.2} x {} nights  {:>10.2}",
        summary.nightly, summary.nights, summary.subtotal
    );
    println!("Service fee              {:>10.2}", summary.service_fee);
    println!("Cleaning fee             {:>10.2}", summary.cleaning_fee);
    println!("Total                    {:>10.2}", summary.total);
}

fn print_transaction(transaction: &Transaction) {
    let dates = match (transaction.start_date, transaction.end_date) {
        (Some(start), Some(end)) => format!("{} → {}", start, end),
        _ => "dates not set".to_string(),
    };
    let status = transaction
        .status
        .map(|s| format!("{:?}", s).to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string());
    println!(
        "{:<24} {:<20} {:<26} EGP {:>10.2} {}",
        transaction.id, transaction.location_id, dates, transaction.amount, status
    );
}

fn price_label(price: Option<f64>) -> String {
    price
        .map(|p| format!("EGP {:.2}/night", p))
        .unwrap_or_else(|| "price on request".to_string())
}
