use chrono::{DateTime, Duration, Utc};

use crate::api::ApiError;
use crate::domain::{normalize_vin_input, Vin};

use super::debounce::Debouncer;

/// Availability of the VIN under entry, keyed to the current input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VinAvailability {
    #[default]
    Unknown,
    Available,
    Taken,
}

/// Debounced uniqueness check for the VIN field. A check only fires once the
/// debounced value reaches exactly 17 characters; anything shorter or longer
/// resets availability to `Unknown`. A resolution is dropped unless it still
/// matches the VIN currently held, so a fast re-edit can never pin a stale
/// verdict to a newer VIN.
pub struct VinChecker {
    input: Debouncer<String>,
    availability: VinAvailability,
    current: Option<String>,
    in_flight: Option<String>,
}

impl VinChecker {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            input: Debouncer::new(quiet_period),
            availability: VinAvailability::Unknown,
            current: None,
            in_flight: None,
        }
    }

    /// Feeds raw VIN entry through the debouncer. Any change of the input
    /// immediately clears the verdict shown for the previous VIN.
    pub fn note_input(&mut self, raw: &str, now: DateTime<Utc>) {
        let normalized = normalize_vin_input(raw);
        if self.current.as_deref() != Some(normalized.as_str()) {
            self.availability = VinAvailability::Unknown;
        }
        self.input.set(normalized, now);
    }

    /// Advances the debouncer; returns a VIN the driver should check, if one
    /// is due. Exactly one check is issued per distinct debounced value.
    pub fn pump(&mut self, now: DateTime<Utc>) -> Option<String> {
        let vin = self.input.poll(now)?;
        if vin.chars().count() != Vin::LENGTH {
            self.current = None;
            self.availability = VinAvailability::Unknown;
            return None;
        }
        if self.current.as_deref() == Some(vin.as_str())
            && self.availability != VinAvailability::Unknown
        {
            return None;
        }
        self.current = Some(vin.clone());
        self.availability = VinAvailability::Unknown;
        if self.in_flight.as_deref() == Some(vin.as_str()) {
            return None;
        }
        self.in_flight = Some(vin.clone());
        tracing::debug!(vin = %vin, "vin availability check due");
        Some(vin)
    }

    /// Applies a check result. "Found" maps to `Taken`, "not found" to
    /// `Available`; a failed check leaves the verdict `Unknown` since the
    /// check is advisory until the backend enforces uniqueness at create.
    pub fn resolve(&mut self, vin: &str, outcome: Result<bool, ApiError>) {
        if self.in_flight.as_deref() == Some(vin) {
            self.in_flight = None;
        }
        if self.current.as_deref() != Some(vin) {
            return;
        }
        self.availability = match outcome {
            Ok(true) => VinAvailability::Taken,
            Ok(false) => VinAvailability::Available,
            Err(_) => VinAvailability::Unknown,
        };
    }

    pub fn availability(&self) -> VinAvailability {
        self.availability
    }

    pub fn is_checking(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending_input(&self) -> bool {
        self.input.is_pending()
    }

    pub fn cancel(&mut self) {
        self.input.cancel();
        self.in_flight = None;
    }
}
