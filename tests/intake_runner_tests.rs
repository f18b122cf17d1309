mod common;

use chrono::{Duration, NaiveDate};

use clearing_core::api::{ApiError, MatchType};
use clearing_core::cli::{IntakeRunner, ScriptedIo};
use clearing_core::domain::{ModelCatalog, VehicleStatus};
use clearing_core::wizard::Step;
use common::{sample_estimate, ManualClock, StubEstimateApi, StubVehicleApi};

const VIN: &str = "JHMCM56557C404453";
const OTHER_VIN: &str = "WDBRF40J43F412345";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date")
}

fn runner<'a>(
    estimate_api: &'a StubEstimateApi,
    vehicle_api: &'a StubVehicleApi,
    clock: &'a ManualClock,
    io: &'a mut ScriptedIo,
) -> IntakeRunner<'a> {
    IntakeRunner::new(
        ModelCatalog::builtin(),
        Duration::zero(),
        estimate_api,
        vehicle_api,
        clock,
        io,
    )
    .with_poll_sleep(std::time::Duration::ZERO)
}

#[test]
fn scripted_full_intake_creates_the_vehicle_and_shows_the_estimate() {
    let estimate_api = StubEstimateApi::returning(Ok(Some(sample_estimate(
        1_250_000.0,
        14,
        MatchType::Exact,
    ))));
    let vehicle_api = StubVehicleApi::new();
    let clock = ManualClock::on_date(today());
    let mut io = ScriptedIo::new(vec![
        "Full clearance",
        VIN,
        "TOYOTA",
        "Camry",
        "2019",
        "Silver",
        "Grande Lagos",
        "PTML",
        "2026-08-20",
        // Twelve cost lines for full clearance of a 2019 vehicle.
        "50000",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "Create vehicle",
    ]);

    let record = {
        let mut runner = runner(&estimate_api, &vehicle_api, &clock, &mut io);
        runner.run().expect("run completes").expect("vehicle created")
    };

    assert_eq!(record.vehicle.vin, VIN);
    assert_eq!(record.vehicle.status, VehicleStatus::InTransit);
    assert_eq!(record.vehicle.cpc, Some(50_000.0));

    let created = vehicle_api.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].estimated_total_cost, Some(1_250_000.0));

    // One lookup per distinct tuple: without terminal, then refined by it.
    assert_eq!(estimate_api.call_count(), 2);

    let transcript = io.transcript().join("\n");
    assert!(transcript.contains("Smart estimate: ₦1,250,000 across 14 historical records"));
    assert!(transcript.contains("Step 5 of 5 – Review"));
}

#[test]
fn cancelling_early_creates_nothing() {
    let estimate_api = StubEstimateApi::returning(Ok(None));
    let vehicle_api = StubVehicleApi::new();
    let clock = ManualClock::on_date(today());
    let mut io = ScriptedIo::new(vec![":cancel", "y"]);

    let outcome = {
        let mut runner = runner(&estimate_api, &vehicle_api, &clock, &mut io);
        runner.run().expect("run completes")
    };

    assert!(outcome.is_none());
    assert!(vehicle_api.created().is_empty());
    assert_eq!(estimate_api.call_count(), 0);
}

#[test]
fn a_taken_vin_blocks_the_step_until_a_fresh_vin_clears() {
    let estimate_api = StubEstimateApi::returning(Ok(None));
    let vehicle_api = StubVehicleApi::new().with_registered_vin(VIN);
    let clock = ManualClock::on_date(today());
    let mut io = ScriptedIo::new(vec![
        "Full clearance",
        // First pass: the VIN is already registered, the step stays put.
        VIN,
        "TOYOTA",
        "Camry",
        "2019",
        "",
        // Second pass with a fresh VIN.
        OTHER_VIN,
        "TOYOTA",
        "Camry",
        "2019",
        "",
        // Abandon at the shipping step.
        ":cancel",
        "y",
    ]);

    let (outcome, final_step) = {
        let mut runner = runner(&estimate_api, &vehicle_api, &clock, &mut io);
        let outcome = runner.run().expect("run completes");
        (outcome, runner.wizard().step())
    };

    assert!(outcome.is_none());
    assert_eq!(final_step, Step::ShippingDetails);
    assert!(vehicle_api.created().is_empty());
    assert_eq!(
        *vehicle_api.vin_calls.lock().expect("vin calls lock"),
        vec![VIN.to_string(), OTHER_VIN.to_string()]
    );

    let transcript = io.transcript().join("\n");
    assert!(transcript.contains("This VIN is already registered"));
}

#[test]
fn a_rejected_submission_keeps_the_draft_on_the_review_step() {
    let estimate_api = StubEstimateApi::returning(Ok(None));
    let vehicle_api = StubVehicleApi::new()
        .failing_create(ApiError::Remote("VIN already registered".into()));
    let clock = ManualClock::on_date(today());
    let mut io = ScriptedIo::new(vec![
        "Release & gate only",
        VIN,
        "TOYOTA",
        "Camry",
        "2019",
        "",
        "",
        "None",
        "",
        // Seven cost lines for release/gate of a 2019 vehicle.
        "",
        "",
        "",
        "",
        "",
        "",
        "",
        "Create vehicle",
        // The failure leaves us on review; give up from there.
        "Cancel intake",
        "y",
    ]);

    let (outcome, final_step) = {
        let mut runner = runner(&estimate_api, &vehicle_api, &clock, &mut io);
        let outcome = runner.run().expect("run completes");
        (outcome, runner.wizard().step())
    };

    assert!(outcome.is_none());
    assert_eq!(final_step, Step::Review);

    let transcript = io.transcript().join("\n");
    assert!(transcript.contains("Submission failed: VIN already registered"));
    // The draft survives for the retry that never came.
    assert!(transcript.contains(&format!("  VIN: {VIN}")));
}
