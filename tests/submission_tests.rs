mod common;

use chrono::{Duration, NaiveDate};

use clearing_core::domain::{
    ClearanceType, CostField, Terminal, VehicleDraft, VehicleRecord, VehicleStatus,
};
use clearing_core::wizard::submit::iso_datetime;
use clearing_core::wizard::{build_payload, derive_status, SubmissionHandler, SubmitError};
use common::{ManualClock, StubVehicleApi};

const VIN: &str = "JHMCM56557C404453";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date")
}

fn populated_draft() -> VehicleDraft {
    let mut draft = VehicleDraft::new();
    draft.clearance_type = Some(ClearanceType::Full);
    draft.vin = VIN.into();
    draft.make = "TOYOTA".into();
    draft.model = "Camry".into();
    draft.year = Some(2019);
    draft.color = Some("Silver".into());
    draft.ship_name = Some("Grande Lagos".into());
    draft.terminal = Some(Terminal::Ptml);
    draft.arrival_date = Some(today() + Duration::days(14));
    draft.costs.insert(CostField::Cpc, 50_000.0);
    draft.costs.insert(CostField::Gate, 12_500.0);
    draft.costs.insert(CostField::Examination, 0.0);
    draft.estimated_total_cost = Some(1_250_000.0);
    draft
}

#[test]
fn status_derivation_scenarios() {
    let tomorrow = today() + Duration::days(1);
    let yesterday = today() - Duration::days(1);
    assert_eq!(
        derive_status(VehicleStatus::Clearing, Some(tomorrow), today()),
        VehicleStatus::InTransit
    );
    assert_eq!(
        derive_status(VehicleStatus::InTransit, Some(yesterday), today()),
        VehicleStatus::Clearing
    );
    assert_eq!(
        derive_status(VehicleStatus::Cleared, None, today()),
        VehicleStatus::Cleared
    );
}

#[test]
fn payload_serializes_dates_iso_and_omits_zero_cost_lines() {
    let payload = build_payload(&populated_draft(), today()).expect("payload builds");
    assert_eq!(payload.status, VehicleStatus::InTransit);
    assert_eq!(payload.arrival_date.as_deref(), Some("2026-08-20T00:00:00"));
    assert_eq!(payload.cpc, Some(50_000.0));
    assert_eq!(payload.gate, Some(12_500.0));
    // Zero-valued lines are treated as empty and left off the wire.
    assert_eq!(payload.examination, None);

    let json = serde_json::to_value(&payload).expect("serializable");
    assert_eq!(json["terminal"], "PTML");
    assert_eq!(json["status"], "In Transit");
    assert!(json.get("examination").is_none());
}

#[test]
fn cost_lines_hidden_by_clearance_or_year_never_reach_the_wire() {
    let mut draft = populated_draft();
    draft.clearance_type = Some(ClearanceType::ReleaseGate);
    let payload = build_payload(&draft, today()).expect("payload builds");
    // CPC belongs to full clearance only; the entry survives in the draft but
    // is filtered out of the payload.
    assert_eq!(payload.cpc, None);
    assert_eq!(payload.gate, Some(12_500.0));

    draft.year = Some(2010);
    draft.costs.insert(CostField::Ciu, 8_000.0);
    let payload = build_payload(&draft, today()).expect("payload builds");
    assert_eq!(payload.ciu, None);
}

#[test]
fn submitted_draft_reads_back_identically_from_the_detail_view() {
    let draft = populated_draft();
    let handler_payload = build_payload(&draft, today()).expect("payload builds");
    let wire = serde_json::to_string(&VehicleRecord {
        id: 42,
        vehicle: handler_payload.clone(),
    })
    .expect("serializable");
    let read_back: VehicleRecord = serde_json::from_str(&wire).expect("deserializable");

    assert_eq!(read_back.id, 42);
    assert_eq!(read_back.vehicle.vin, draft.vin);
    assert_eq!(read_back.vehicle.make, draft.make);
    assert_eq!(read_back.vehicle.model, draft.model);
    assert_eq!(Some(read_back.vehicle.year), draft.year);
    assert_eq!(read_back.vehicle.terminal, draft.terminal);
    assert_eq!(
        read_back.vehicle.arrival_date,
        draft.arrival_date.map(iso_datetime)
    );
}

#[test]
fn a_second_trigger_while_in_flight_issues_no_second_create() {
    let mut handler = SubmissionHandler::new();
    assert!(handler.begin());
    assert!(handler.in_flight());
    // The control stays disabled for the duration of the request.
    assert!(!handler.begin());

    let api = StubVehicleApi::new();
    let clock = ManualClock::on_date(today());
    let result = handler.submit(&populated_draft(), &api, &clock);
    assert_eq!(result, Err(SubmitError::AlreadyInFlight));
    assert!(api.created().is_empty());

    handler.finish();
    let record = handler.submit(&populated_draft(), &api, &clock).expect("submit succeeds");
    assert_eq!(api.created().len(), 1);
    assert_eq!(record.vehicle.vin, VIN);
}

#[test]
fn incomplete_drafts_are_refused_before_any_network_call() {
    let mut handler = SubmissionHandler::new();
    let api = StubVehicleApi::new();
    let clock = ManualClock::on_date(today());
    let mut draft = populated_draft();
    draft.year = None;
    let result = handler.submit(&draft, &api, &clock);
    assert!(matches!(result, Err(SubmitError::Incomplete(_))));
    assert!(api.created().is_empty());
    // The failed attempt releases the guard.
    assert!(!handler.in_flight());
}
