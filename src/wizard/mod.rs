//! Multi-step vehicle-intake wizard: step sequencing, per-step validation
//! gating, conditional cost-field visibility, and the debounced estimate and
//! VIN availability side-channels.

pub mod debounce;
pub mod estimate;
pub mod session;
pub mod submit;
pub mod validate;
pub mod vin_check;

use std::fmt;

use crate::domain::CostField;

pub use debounce::Debouncer;
pub use estimate::{EstimateKey, EstimateLookup, EstimateState};
pub use session::{Advance, IntakeWizard, PendingWork};
pub use submit::{build_payload, derive_status, SubmissionHandler, SubmitError};
pub use vin_check::{VinAvailability, VinChecker};

/// Ordered intake steps. `Submitted` is reached only through a successful
/// create call and is modeled on the session, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    ClearanceType,
    VehicleInformation,
    ShippingDetails,
    CostDetermination,
    Review,
}

impl Step {
    pub const ORDER: [Step; 5] = [
        Step::ClearanceType,
        Step::VehicleInformation,
        Step::ShippingDetails,
        Step::CostDetermination,
        Step::Review,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Step::ClearanceType => "Clearance Type",
            Step::VehicleInformation => "Vehicle Information",
            Step::ShippingDetails => "Shipping Details",
            Step::CostDetermination => "Cost Determination",
            Step::Review => "Review",
        }
    }

    pub fn index(&self) -> usize {
        Step::ORDER
            .iter()
            .position(|step| step == self)
            .expect("step is in ORDER")
    }

    pub fn next(&self) -> Option<Step> {
        Step::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Step> {
        self.index().checked_sub(1).map(|idx| Step::ORDER[idx])
    }

    /// Fields that must validate before this step can be advanced past. The
    /// required set is fixed per step and independent of the optional fields.
    pub fn required_fields(&self) -> &'static [FieldId] {
        match self {
            Step::ClearanceType => &[FieldId::ClearanceType],
            Step::VehicleInformation => {
                &[FieldId::Vin, FieldId::Make, FieldId::Model, FieldId::Year]
            }
            // Shipping metadata and all cost lines are optional.
            Step::ShippingDetails | Step::CostDetermination | Step::Review => &[],
        }
    }
}

/// Statically-typed field identifiers, mapped to steps explicitly rather than
/// by string name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldId {
    ClearanceType,
    Vin,
    Make,
    Model,
    Year,
    Color,
    ShipName,
    Terminal,
    ArrivalDate,
    Cost(CostField),
}

impl FieldId {
    pub fn label(&self) -> &'static str {
        match self {
            FieldId::ClearanceType => "Clearance type",
            FieldId::Vin => "VIN",
            FieldId::Make => "Make",
            FieldId::Model => "Model",
            FieldId::Year => "Year",
            FieldId::Color => "Color",
            FieldId::ShipName => "Ship name",
            FieldId::Terminal => "Terminal",
            FieldId::ArrivalDate => "Arrival date",
            FieldId::Cost(field) => field.label(),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_ordered_and_linked() {
        assert_eq!(Step::ClearanceType.index(), 0);
        assert_eq!(Step::ClearanceType.next(), Some(Step::VehicleInformation));
        assert_eq!(Step::Review.next(), None);
        assert_eq!(Step::ClearanceType.previous(), None);
        assert_eq!(Step::Review.previous(), Some(Step::CostDetermination));
    }

    #[test]
    fn cost_determination_has_no_required_fields() {
        assert!(Step::CostDetermination.required_fields().is_empty());
    }
}
