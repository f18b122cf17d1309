use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::api::{ApiError, EstimateResult};
use crate::domain::Terminal;

use super::debounce::Debouncer;

/// Input tuple the estimate lookup is keyed by. Terminal is optional and
/// refines matching without being required.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EstimateKey {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub terminal: Option<Terminal>,
}

/// Lookup lifecycle as rendered next to the cost step. `NoData` is a distinct
/// outcome from `Failed`: the service answered, but had no matching history.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateState {
    Idle,
    Loading,
    Ready(EstimateResult),
    NoData,
    Failed(String),
}

/// Debounced, cached estimate lookup. Each watched field settles through its
/// own quiet period; a complete settled tuple becomes the current key. Only
/// the response matching the current key may update the visible state;
/// responses for superseded keys are dropped on arrival (last-input-wins).
pub struct EstimateLookup {
    make: Debouncer<String>,
    model: Debouncer<String>,
    year: Debouncer<Option<i32>>,
    terminal: Debouncer<Option<Terminal>>,
    cache: HashMap<EstimateKey, Option<EstimateResult>>,
    in_flight: Option<EstimateKey>,
    current: Option<EstimateKey>,
    state: EstimateState,
}

impl EstimateLookup {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            make: Debouncer::new(quiet_period),
            model: Debouncer::new(quiet_period),
            year: Debouncer::new(quiet_period),
            terminal: Debouncer::new(quiet_period),
            cache: HashMap::new(),
            in_flight: None,
            current: None,
            state: EstimateState::Idle,
        }
    }

    pub fn note_make(&mut self, value: &str, now: DateTime<Utc>) {
        self.make.set(value.trim().to_string(), now);
    }

    pub fn note_model(&mut self, value: &str, now: DateTime<Utc>) {
        self.model.set(value.trim().to_string(), now);
    }

    pub fn note_year(&mut self, value: Option<i32>, now: DateTime<Utc>) {
        self.year.set(value, now);
    }

    pub fn note_terminal(&mut self, value: Option<Terminal>, now: DateTime<Utc>) {
        self.terminal.set(value, now);
    }

    /// Advances the debouncers and reconciles the current key. Returns a key
    /// the driver should fetch, if a request is due. Requests for a key that
    /// is already cached or in flight are coalesced, never re-issued.
    pub fn pump(&mut self, now: DateTime<Utc>) -> Option<EstimateKey> {
        let mut settled_changed = false;
        settled_changed |= self.make.poll(now).is_some();
        settled_changed |= self.model.poll(now).is_some();
        settled_changed |= self.year.poll(now).is_some();
        settled_changed |= self.terminal.poll(now).is_some();
        if !settled_changed {
            return None;
        }

        let Some(key) = self.settled_key() else {
            // Preconditions unmet: reset to idle, let in-flight answers die.
            self.current = None;
            self.state = EstimateState::Idle;
            return None;
        };

        if self.current.as_ref() == Some(&key) {
            return None;
        }
        self.current = Some(key.clone());

        if let Some(cached) = self.cache.get(&key) {
            self.state = Self::state_for(cached.clone());
            return None;
        }

        self.state = EstimateState::Loading;
        if self.in_flight.as_ref() == Some(&key) {
            return None;
        }
        self.in_flight = Some(key.clone());
        tracing::debug!(make = %key.make, model = %key.model, year = key.year, "estimate lookup due");
        Some(key)
    }

    /// Applies a response. Successful results are cached by key; the visible
    /// state only changes when the response matches the current key.
    pub fn resolve(
        &mut self,
        key: &EstimateKey,
        outcome: Result<Option<EstimateResult>, ApiError>,
    ) {
        if self.in_flight.as_ref() == Some(key) {
            self.in_flight = None;
        }
        match outcome {
            Ok(result) => {
                self.cache.insert(key.clone(), result.clone());
                if self.current.as_ref() == Some(key) {
                    self.state = Self::state_for(result);
                }
            }
            Err(err) => {
                if self.current.as_ref() == Some(key) {
                    self.state = EstimateState::Failed(err.to_string());
                }
            }
        }
    }

    pub fn state(&self) -> &EstimateState {
        &self.state
    }

    /// Average cost currently on display, if the lookup is `Ready`.
    pub fn average_cost(&self) -> Option<f64> {
        match &self.state {
            EstimateState::Ready(result) => result.average_clearing_cost,
            _ => None,
        }
    }

    pub fn has_pending_input(&self) -> bool {
        self.make.is_pending()
            || self.model.is_pending()
            || self.year.is_pending()
            || self.terminal.is_pending()
    }

    /// Abandons debounced input and the in-flight key, for teardown.
    pub fn cancel(&mut self) {
        self.make.cancel();
        self.model.cancel();
        self.year.cancel();
        self.terminal.cancel();
        self.in_flight = None;
    }

    fn settled_key(&self) -> Option<EstimateKey> {
        let make = self.make.settled()?.clone();
        let model = self.model.settled()?.clone();
        let year = (*self.year.settled()?)?;
        if make.is_empty() || model.is_empty() || year == 0 {
            return None;
        }
        let terminal = self.terminal.settled().copied().flatten();
        Some(EstimateKey {
            make,
            model,
            year,
            terminal,
        })
    }

    fn state_for(result: Option<EstimateResult>) -> EstimateState {
        match result {
            Some(estimate) if estimate.average_clearing_cost.is_some() => {
                EstimateState::Ready(estimate)
            }
            _ => EstimateState::NoData,
        }
    }
}
