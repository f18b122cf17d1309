#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use clearing_core::api::{ApiError, EstimateApi, EstimateResult, MatchType, VehicleApi};
use clearing_core::domain::{Terminal, VehiclePayload, VehicleRecord};
use clearing_core::time::Clock;

/// Deterministic clock the tests advance by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_epoch() -> Self {
        Self::starting_at(Utc.timestamp_millis_opt(0).single().expect("valid instant"))
    }

    pub fn on_date(date: NaiveDate) -> Self {
        Self::starting_at(
            date.and_hms_opt(9, 0, 0)
                .expect("valid time")
                .and_utc(),
        )
    }

    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock().expect("clock lock");
        *now += Duration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub fn instant(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().expect("valid instant")
}

pub fn sample_estimate(average: f64, sample_size: u32, match_type: MatchType) -> EstimateResult {
    EstimateResult {
        average_clearing_cost: Some(average),
        sample_size,
        is_normalized: true,
        match_type: Some(match_type),
    }
}

/// Estimate collaborator double that records every lookup it serves.
pub struct StubEstimateApi {
    pub response: Mutex<Result<Option<EstimateResult>, ApiError>>,
    pub calls: Mutex<Vec<(String, String, i32, Option<Terminal>)>>,
}

impl StubEstimateApi {
    pub fn returning(response: Result<Option<EstimateResult>, ApiError>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl EstimateApi for StubEstimateApi {
    fn global_search(
        &self,
        make: &str,
        model: &str,
        year: i32,
        terminal: Option<Terminal>,
    ) -> Result<Option<EstimateResult>, ApiError> {
        self.calls.lock().expect("calls lock").push((
            make.to_string(),
            model.to_string(),
            year,
            terminal,
        ));
        self.response.lock().expect("response lock").clone()
    }
}

/// Vehicle collaborator double: VIN verdicts come from a per-VIN map, creates
/// are recorded and answered with sequential ids.
pub struct StubVehicleApi {
    pub registered_vins: Mutex<HashMap<String, bool>>,
    pub vin_calls: Mutex<Vec<String>>,
    pub create_calls: Mutex<Vec<VehiclePayload>>,
    pub create_error: Mutex<Option<ApiError>>,
    pub next_id: Mutex<i64>,
}

impl StubVehicleApi {
    pub fn new() -> Self {
        Self {
            registered_vins: Mutex::new(HashMap::new()),
            vin_calls: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
            create_error: Mutex::new(None),
            next_id: Mutex::new(41),
        }
    }

    pub fn with_registered_vin(self, vin: &str) -> Self {
        self.registered_vins
            .lock()
            .expect("vins lock")
            .insert(vin.to_string(), true);
        self
    }

    pub fn failing_create(self, error: ApiError) -> Self {
        *self.create_error.lock().expect("error lock") = Some(error);
        self
    }

    pub fn clear_create_error(&self) {
        *self.create_error.lock().expect("error lock") = None;
    }

    pub fn created(&self) -> Vec<VehiclePayload> {
        self.create_calls.lock().expect("create lock").clone()
    }
}

impl Default for StubVehicleApi {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleApi for StubVehicleApi {
    fn vin_exists(&self, vin: &str) -> Result<bool, ApiError> {
        self.vin_calls
            .lock()
            .expect("vin calls lock")
            .push(vin.to_string());
        Ok(self
            .registered_vins
            .lock()
            .expect("vins lock")
            .get(vin)
            .copied()
            .unwrap_or(false))
    }

    fn create(&self, payload: &VehiclePayload) -> Result<VehicleRecord, ApiError> {
        if let Some(error) = self.create_error.lock().expect("error lock").clone() {
            return Err(error);
        }
        self.create_calls
            .lock()
            .expect("create lock")
            .push(payload.clone());
        let mut next_id = self.next_id.lock().expect("id lock");
        *next_id += 1;
        Ok(VehicleRecord {
            id: *next_id,
            vehicle: payload.clone(),
        })
    }

    fn fetch(&self, id: i64) -> Result<VehicleRecord, ApiError> {
        let created = self.create_calls.lock().expect("create lock");
        created
            .last()
            .map(|payload| VehicleRecord {
                id,
                vehicle: payload.clone(),
            })
            .ok_or_else(|| ApiError::Remote("Vehicle not found".into()))
    }
}
