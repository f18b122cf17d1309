//! Final submission: status derivation, payload assembly, and the single
//! create call against the vehicle persistence collaborator.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::api::{ApiError, VehicleApi};
use crate::domain::{VehicleDraft, VehiclePayload, VehicleRecord, VehicleStatus};
use crate::time::Clock;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("A submission is already in flight")]
    AlreadyInFlight,
    #[error("Draft is incomplete: {0}")]
    Incomplete(String),
    #[error("{0}")]
    Rejected(String),
}

/// Computes the stored status from the arrival date. Date-only comparison: a
/// strictly future arrival means the vehicle is still in transit, today or
/// earlier means it is clearing. Without an arrival date the prior status is
/// left untouched.
pub fn derive_status(
    current: VehicleStatus,
    arrival_date: Option<NaiveDate>,
    today: NaiveDate,
) -> VehicleStatus {
    match arrival_date {
        Some(date) if date > today => VehicleStatus::InTransit,
        Some(_) => VehicleStatus::Clearing,
        None => current,
    }
}

/// Serializes the draft for the create endpoint. Dates become ISO-8601
/// date/time strings; optional fields and zero-valued cost lines are omitted;
/// cost lines hidden by the clearance type or year never reach the wire.
pub fn build_payload(draft: &VehicleDraft, today: NaiveDate) -> Result<VehiclePayload, SubmitError> {
    let year = draft
        .year
        .ok_or_else(|| SubmitError::Incomplete("year is missing".into()))?;
    if draft.vin.trim().is_empty() {
        return Err(SubmitError::Incomplete("VIN is missing".into()));
    }
    if draft.make.trim().is_empty() || draft.model.trim().is_empty() {
        return Err(SubmitError::Incomplete("make and model are required".into()));
    }

    let mut payload = VehiclePayload {
        vin: draft.vin.trim().to_string(),
        make: draft.make.trim().to_string(),
        model: draft.model.trim().to_string(),
        year,
        clearance_type: draft.clearance_type,
        color: non_empty(&draft.color),
        ship_name: non_empty(&draft.ship_name),
        terminal: draft.terminal,
        arrival_date: draft.arrival_date.map(iso_datetime),
        status: derive_status(draft.status, draft.arrival_date, today),
        cpc: None,
        valuation: None,
        customs_duty: None,
        comet_shipping: None,
        terminal_charges: None,
        agencies: None,
        examination: None,
        release: None,
        disc: None,
        gate: None,
        ciu: None,
        monitoring: None,
        estimated_total_cost: draft.estimated_total_cost,
    };

    for field in draft.visible_cost_fields() {
        let value = draft.costs.get(&field).copied().filter(|value| *value != 0.0);
        payload.set_cost(field, value);
    }

    Ok(payload)
}

/// Issues the create call, refusing re-entry while one is outstanding. The
/// guard mirrors the disabled submit control: a second trigger during an
/// in-flight request must not produce a second create.
#[derive(Debug, Default)]
pub struct SubmissionHandler {
    in_flight: bool,
}

impl SubmissionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Marks a submission as outstanding; `false` when one already is.
    pub fn begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Runs the whole submission: derive status, serialize, create. On
    /// failure the caller keeps the draft and may retry after correcting it.
    pub fn submit(
        &mut self,
        draft: &VehicleDraft,
        api: &dyn VehicleApi,
        clock: &dyn Clock,
    ) -> Result<VehicleRecord, SubmitError> {
        if !self.begin() {
            return Err(SubmitError::AlreadyInFlight);
        }
        let outcome = self.run(draft, api, clock);
        self.finish();
        outcome
    }

    fn run(
        &self,
        draft: &VehicleDraft,
        api: &dyn VehicleApi,
        clock: &dyn Clock,
    ) -> Result<VehicleRecord, SubmitError> {
        let payload = build_payload(draft, clock.today())?;
        tracing::info!(vin = %payload.vin, status = payload.status.label(), "submitting vehicle");
        api.create(&payload).map_err(|err| match err {
            ApiError::Remote(message) => SubmitError::Rejected(message),
            other => SubmitError::Rejected(other.to_string()),
        })
    }
}

/// ISO-8601 date/time with the time-of-day zeroed, as the wire expects.
pub fn iso_datetime(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date")
    }

    #[test]
    fn future_arrival_means_in_transit() {
        let status = derive_status(
            VehicleStatus::Clearing,
            Some(today() + Duration::days(1)),
            today(),
        );
        assert_eq!(status, VehicleStatus::InTransit);
    }

    #[test]
    fn past_or_today_arrival_means_clearing() {
        let status = derive_status(
            VehicleStatus::InTransit,
            Some(today() - Duration::days(1)),
            today(),
        );
        assert_eq!(status, VehicleStatus::Clearing);
        let status = derive_status(VehicleStatus::InTransit, Some(today()), today());
        assert_eq!(status, VehicleStatus::Clearing);
    }

    #[test]
    fn missing_arrival_keeps_the_prior_status() {
        let status = derive_status(VehicleStatus::Cleared, None, today());
        assert_eq!(status, VehicleStatus::Cleared);
    }
}
