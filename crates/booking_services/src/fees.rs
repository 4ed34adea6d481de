use std::str::FromStr;

use crate::error::CheckoutError;

/// Fees added to every booking and the stay length assumed without dates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    /// Flat service fee in EGP (default: 450)
    pub service_fee: f64,
    /// Flat cleaning fee in EGP (default: 200)
    pub cleaning_fee: f64,
    /// Nights priced when the draft has no dates (default: 3)
    pub default_nights: u32,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            service_fee: 450.0,
            cleaning_fee: 200.0,
            default_nights: 3,
        }
    }
}

impl FeeSchedule {
    /// Load the schedule from `KHEYMA_SERVICE_FEE`, `KHEYMA_CLEANING_FEE` and
    /// `KHEYMA_DEFAULT_NIGHTS`, keeping the defaults for unset variables
    pub fn from_env() -> Result<Self, CheckoutError> {
        let defaults = Self::default();
        let schedule = Self {
            service_fee: env_or("KHEYMA_SERVICE_FEE", defaults.service_fee)?,
            cleaning_fee: env_or("KHEYMA_CLEANING_FEE", defaults.cleaning_fee)?,
            default_nights: env_or("KHEYMA_DEFAULT_NIGHTS", defaults.default_nights)?,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Reject negative fees and a zero-night default stay
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if !(self.service_fee.is_finite() && self.service_fee >= 0.0) {
            return Err(CheckoutError::Config(
                "Service fee must be a non-negative amount".to_string(),
            ));
        }
        if !(self.cleaning_fee.is_finite() && self.cleaning_fee >= 0.0) {
            return Err(CheckoutError::Config(
                "Cleaning fee must be a non-negative amount".to_string(),
            ));
        }
        if self.default_nights == 0 {
            return Err(CheckoutError::Config(
                "Default stay must be at least one night".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T, CheckoutError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| CheckoutError::Config(format!("Invalid {} '{}': {}", name, raw, e))),
        Err(_) => Ok(default),
    }
}
