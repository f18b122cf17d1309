//! The intake wizard session: owns the draft for the lifetime of one intake,
//! sequences steps, gates advancement on per-step validation, and feeds the
//! debounced estimate and VIN side-channels.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::api::{ApiError, EstimateResult, VehicleApi};
use crate::domain::{ClearanceType, CostField, ModelCatalog, Terminal, VehicleDraft, VehicleRecord};
use crate::time::Clock;

use super::estimate::{EstimateKey, EstimateLookup, EstimateState};
use super::submit::{SubmissionHandler, SubmitError};
use super::validate::{validate_draft, validate_step, FieldErrors};
use super::vin_check::{VinAvailability, VinChecker};
use super::{FieldId, Step};

/// Outcome of a step-advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(Step),
    Blocked,
}

/// Requests the driver should issue after a pump pass. Both side-channels are
/// advisory with respect to editing: the user keeps typing while they run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingWork {
    pub estimate: Option<EstimateKey>,
    pub vin: Option<String>,
}

impl PendingWork {
    pub fn is_empty(&self) -> bool {
        self.estimate.is_none() && self.vin.is_none()
    }
}

/// One wizard session. The draft is created empty on construction, mutated
/// through the steps, and discarded wholesale on submit or navigation away;
/// it is never partially persisted.
pub struct IntakeWizard {
    session_id: Uuid,
    step: Step,
    draft: VehicleDraft,
    catalog: ModelCatalog,
    errors: FieldErrors,
    vin_checker: VinChecker,
    estimate: EstimateLookup,
    handler: SubmissionHandler,
    submitted: Option<i64>,
}

impl IntakeWizard {
    pub fn new(catalog: ModelCatalog, quiet_period: Duration) -> Self {
        let session_id = Uuid::new_v4();
        tracing::debug!(%session_id, "intake wizard session started");
        Self {
            session_id,
            step: Step::ClearanceType,
            draft: VehicleDraft::new(),
            catalog,
            errors: FieldErrors::new(),
            vin_checker: VinChecker::new(quiet_period),
            estimate: EstimateLookup::new(quiet_period),
            handler: SubmissionHandler::new(),
            submitted: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &VehicleDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn submitted_id(&self) -> Option<i64> {
        self.submitted
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    // --- field mutation -------------------------------------------------

    pub fn set_clearance_type(&mut self, clearance: ClearanceType) {
        self.draft.clearance_type = Some(clearance);
    }

    pub fn set_vin(&mut self, raw: &str, now: DateTime<Utc>) {
        self.draft.vin = crate::domain::vehicle::normalize_vin_input(raw);
        self.vin_checker.note_input(raw, now);
    }

    /// Changing make resets the model: choices narrow per make, so a model
    /// picked for the previous make never survives the switch.
    pub fn set_make(&mut self, value: &str, now: DateTime<Utc>) {
        let trimmed = value.trim();
        if trimmed != self.draft.make {
            self.draft.model.clear();
            self.estimate.note_model("", now);
        }
        self.draft.make = trimmed.to_string();
        self.estimate.note_make(trimmed, now);
    }

    pub fn set_model(&mut self, value: &str, now: DateTime<Utc>) {
        self.draft.model = value.trim().to_string();
        self.estimate.note_model(value, now);
    }

    pub fn set_year(&mut self, year: Option<i32>, now: DateTime<Utc>) {
        self.draft.year = year;
        self.estimate.note_year(year, now);
    }

    pub fn set_color(&mut self, value: Option<String>) {
        self.draft.color = value;
    }

    pub fn set_ship_name(&mut self, value: Option<String>) {
        self.draft.ship_name = value;
    }

    pub fn set_terminal(&mut self, terminal: Option<Terminal>, now: DateTime<Utc>) {
        self.draft.terminal = terminal;
        self.estimate.note_terminal(terminal, now);
    }

    pub fn set_arrival_date(&mut self, date: Option<NaiveDate>) {
        self.draft.arrival_date = date;
    }

    pub fn set_cost(&mut self, field: CostField, value: Option<f64>) {
        match value {
            Some(amount) => {
                self.draft.costs.insert(field, amount);
            }
            None => {
                self.draft.costs.remove(&field);
            }
        }
    }

    /// Model options for the current make, exactly the catalog's set.
    pub fn model_options(&self) -> &[String] {
        self.catalog.models_for(&self.draft.make)
    }

    /// Cost lines visible given the chosen clearance type and year.
    pub fn visible_cost_fields(&self) -> Vec<CostField> {
        self.draft.visible_cost_fields()
    }

    // --- side-channels --------------------------------------------------

    /// Advances both debounced side-channels and reports any requests due.
    pub fn pump(&mut self, now: DateTime<Utc>) -> PendingWork {
        let work = PendingWork {
            estimate: self.estimate.pump(now),
            vin: self.vin_checker.pump(now),
        };
        self.sync_estimate_slot();
        work
    }

    /// Applies an estimate response; stale keys are discarded inside the
    /// lookup. The draft's estimate slot tracks the visible result.
    pub fn resolve_estimate(
        &mut self,
        key: &EstimateKey,
        outcome: Result<Option<EstimateResult>, ApiError>,
    ) {
        self.estimate.resolve(key, outcome);
        self.sync_estimate_slot();
    }

    pub fn resolve_vin(&mut self, vin: &str, outcome: Result<bool, ApiError>) {
        self.vin_checker.resolve(vin, outcome);
    }

    pub fn estimate_state(&self) -> &EstimateState {
        self.estimate.state()
    }

    pub fn vin_availability(&self) -> VinAvailability {
        self.vin_checker.availability()
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.estimate.has_pending_input() || self.vin_checker.has_pending_input()
    }

    /// Tears down the side-channels so no pending emission or in-flight
    /// response can touch the session afterwards.
    pub fn cancel_side_channels(&mut self) {
        self.estimate.cancel();
        self.vin_checker.cancel();
    }

    fn sync_estimate_slot(&mut self) {
        self.draft.estimated_total_cost = self.estimate.average_cost();
    }

    // --- transitions ----------------------------------------------------

    /// Validates only the current step's fields and advances on success.
    pub fn next(&mut self, today: NaiveDate) -> Advance {
        self.errors = validate_step(&self.draft, self.step, &self.catalog, today);
        self.apply_vin_gate();
        if !self.errors.is_empty() {
            return Advance::Blocked;
        }
        match self.step.next() {
            Some(step) => {
                self.step = step;
                Advance::Moved(step)
            }
            None => Advance::Blocked,
        }
    }

    /// Moves back one step. Never validates, never discards entered values.
    pub fn back(&mut self) -> Advance {
        self.errors.clear();
        match self.step.previous() {
            Some(step) => {
                self.step = step;
                Advance::Moved(step)
            }
            None => Advance::Blocked,
        }
    }

    /// Final submit, honored only on the review step. Re-validates the whole
    /// draft; on success the session transitions to its terminal state and
    /// the created record is returned for navigation to the detail view.
    pub fn submit(
        &mut self,
        api: &dyn VehicleApi,
        clock: &dyn Clock,
    ) -> Result<VehicleRecord, SubmitError> {
        if self.step != Step::Review {
            return Err(SubmitError::Incomplete(
                "submit is only available from the review step".into(),
            ));
        }
        self.errors = validate_draft(&self.draft, &self.catalog, clock.today());
        self.apply_vin_gate();
        if !self.errors.is_empty() {
            return Err(SubmitError::Incomplete(
                "correct the highlighted fields".into(),
            ));
        }
        let record = self.handler.submit(&self.draft, api, clock)?;
        self.submitted = Some(record.id);
        self.cancel_side_channels();
        tracing::info!(session_id = %self.session_id, id = record.id, "vehicle created");
        Ok(record)
    }

    pub fn submission_in_flight(&self) -> bool {
        self.handler.in_flight()
    }

    /// A resolved VIN conflict blocks progression like a field error, the
    /// only gate that runs outside the declarative rules.
    fn apply_vin_gate(&mut self) {
        let gated = self.step == Step::VehicleInformation || self.step == Step::Review;
        if gated && self.vin_checker.availability() == VinAvailability::Taken {
            self.errors
                .insert(FieldId::Vin, "This VIN is already registered".into());
        }
    }

    /// Label/value pairs for the review step, restricted to visible fields.
    pub fn review_entries(&self) -> Vec<(String, String)> {
        let draft = &self.draft;
        let mut entries = Vec::new();
        if let Some(clearance) = draft.clearance_type {
            entries.push(("Clearance type".into(), clearance.label().into()));
        }
        entries.push(("VIN".into(), draft.vin.clone()));
        entries.push(("Make".into(), draft.make.clone()));
        entries.push(("Model".into(), draft.model.clone()));
        if let Some(year) = draft.year {
            entries.push(("Year".into(), year.to_string()));
        }
        if let Some(color) = &draft.color {
            entries.push(("Color".into(), color.clone()));
        }
        if let Some(ship_name) = &draft.ship_name {
            entries.push(("Ship name".into(), ship_name.clone()));
        }
        if let Some(terminal) = draft.terminal {
            entries.push(("Terminal".into(), terminal.label().into()));
        }
        if let Some(date) = draft.arrival_date {
            entries.push(("Arrival date".into(), date.to_string()));
        }
        for field in draft.visible_cost_fields() {
            if let Some(value) = draft.costs.get(&field) {
                entries.push((field.label().into(), format!("{value:.2}")));
            }
        }
        let entered_total = draft.entered_cost_total();
        if entered_total > 0.0 {
            entries.push(("Entered cost total".into(), format!("{entered_total:.2}")));
        }
        if let Some(estimate) = draft.estimated_total_cost {
            entries.push(("Estimated total cost".into(), format!("{estimate:.2}")));
        }
        entries
    }
}
