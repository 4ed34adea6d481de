use std::sync::{Mutex, PoisonError};

use crate::identity::Role;

/// Navigation targets the session and checkout flows can send the user to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Login entry point
    Login,
    /// Landing page
    Home,
    /// Admin user management
    AdminDashboard,
    /// Confirmation of a submitted booking
    BookingConfirmation {
        /// Server-assigned transaction id
        transaction_id: String,
    },
}

impl Route {
    /// Where a freshly signed-in user lands
    pub fn after_login(role: Role) -> Route {
        if role.is_admin() {
            Route::AdminDashboard
        } else {
            Route::Home
        }
    }

    /// Path of the route in the web front end
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Home => "/".to_string(),
            Route::AdminDashboard => "/admin".to_string(),
            Route::BookingConfirmation { transaction_id } => {
                format!("/profile?booking={}", transaction_id)
            }
        }
    }
}

/// Receiver of navigation requests
pub trait Navigator: Send + Sync {
    /// Move the user to `route`
    fn navigate(&self, route: Route);
}

/// Navigator that keeps the visited routes in order
#[derive(Debug, Default)]
pub struct RouteHistory {
    entries: Mutex<Vec<Route>>,
}

impl RouteHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent route
    pub fn current(&self) -> Option<Route> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.last().cloned()
    }

    /// All routes in visit order
    pub fn entries(&self) -> Vec<Route> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RouteHistory {
    fn navigate(&self, route: Route) {
        tracing::debug!("Navigating to {}", route.path());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
