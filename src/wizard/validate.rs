//! Declarative field validation for the intake draft. Each rule reports a
//! message keyed by [`FieldId`]; step advancement only consults the rules for
//! the fields the current step declares required.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{ModelCatalog, VehicleDraft, Vin};

use super::{FieldId, Step};

pub const MIN_YEAR: i32 = 1900;

/// Field errors accumulated by one validation pass.
pub type FieldErrors = BTreeMap<FieldId, String>;

/// Validates one field of the draft. `Ok(())` for fields with no rule.
pub fn validate_field(
    draft: &VehicleDraft,
    field: FieldId,
    catalog: &ModelCatalog,
    today: NaiveDate,
) -> Result<(), String> {
    match field {
        FieldId::ClearanceType => {
            if draft.clearance_type.is_none() {
                return Err("Select a clearance type".into());
            }
        }
        FieldId::Vin => {
            Vin::parse(&draft.vin).map_err(|err| err.to_string())?;
        }
        FieldId::Make => {
            if draft.make.trim().is_empty() {
                return Err("Make is required".into());
            }
        }
        FieldId::Model => {
            if draft.model.trim().is_empty() {
                return Err("Model is required".into());
            }
            if !catalog.permits(&draft.make, &draft.model) {
                return Err(format!(
                    "`{}` is not an offered model for {}",
                    draft.model.trim(),
                    draft.make.trim()
                ));
            }
        }
        FieldId::Year => {
            let max_year = today.year() + 1;
            match draft.year {
                None => return Err("Year is required".into()),
                Some(year) if year < MIN_YEAR || year > max_year => {
                    return Err(format!("Year must be between {MIN_YEAR} and {max_year}"));
                }
                Some(_) => {}
            }
        }
        FieldId::Cost(cost) => {
            if let Some(value) = draft.costs.get(&cost) {
                if *value < 0.0 {
                    return Err("Amount must be zero or positive".into());
                }
            }
        }
        // Free-text and already-typed optional fields carry no rule.
        FieldId::Color | FieldId::ShipName | FieldId::Terminal | FieldId::ArrivalDate => {}
    }
    Ok(())
}

/// Validates only the fields declared relevant to one step.
pub fn validate_step(
    draft: &VehicleDraft,
    step: Step,
    catalog: &ModelCatalog,
    today: NaiveDate,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in step.required_fields() {
        if let Err(message) = validate_field(draft, *field, catalog, today) {
            errors.insert(*field, message);
        }
    }
    // Cost entries are optional but still range-checked while on their step.
    if step == Step::CostDetermination || step == Step::Review {
        for cost in draft.visible_cost_fields() {
            if let Err(message) = validate_field(draft, FieldId::Cost(cost), catalog, today) {
                errors.insert(FieldId::Cost(cost), message);
            }
        }
    }
    errors
}

/// Re-validates the entire draft, as the final submit does.
pub fn validate_draft(draft: &VehicleDraft, catalog: &ModelCatalog, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for step in Step::ORDER {
        errors.extend(validate_step(draft, step, catalog, today));
    }
    errors
}
