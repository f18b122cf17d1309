use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which clearing service the intake covers. Selects the relevant cost lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceType {
    Full,
    ReleaseGate,
}

impl ClearanceType {
    pub const ALL: [ClearanceType; 2] = [ClearanceType::Full, ClearanceType::ReleaseGate];

    pub fn label(&self) -> &'static str {
        match self {
            ClearanceType::Full => "Full clearance",
            ClearanceType::ReleaseGate => "Release & gate only",
        }
    }
}

/// Closed set of port terminals vehicles arrive through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminal {
    #[serde(rename = "PTML")]
    Ptml,
    #[serde(rename = "Tin Can Island")]
    TinCanIsland,
    #[serde(rename = "Apapa")]
    Apapa,
    #[serde(rename = "Five Star Logistics")]
    FiveStarLogistics,
}

impl Terminal {
    pub const ALL: [Terminal; 4] = [
        Terminal::Ptml,
        Terminal::TinCanIsland,
        Terminal::Apapa,
        Terminal::FiveStarLogistics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Terminal::Ptml => "PTML",
            Terminal::TinCanIsland => "Tin Can Island",
            Terminal::Apapa => "Apapa",
            Terminal::FiveStarLogistics => "Five Star Logistics",
        }
    }

    /// Resolves user input against the closed terminal set, case-insensitively.
    pub fn parse(input: &str) -> Option<Terminal> {
        let normalized = input.trim().to_ascii_lowercase();
        Terminal::ALL
            .into_iter()
            .find(|terminal| terminal.label().to_ascii_lowercase() == normalized)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Workflow status stored on the vehicle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "Clearing")]
    Clearing,
    #[serde(rename = "Cleared")]
    Cleared,
}

impl VehicleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::InTransit => "In Transit",
            VehicleStatus::Clearing => "Clearing",
            VehicleStatus::Cleared => "Cleared",
        }
    }
}

impl Default for VehicleStatus {
    fn default() -> Self {
        VehicleStatus::InTransit
    }
}

/// Reasons a candidate VIN fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VinParseError {
    #[error("VIN must be exactly {expected} characters (got {got})", expected = Vin::LENGTH)]
    Length { got: usize },
    #[error("VIN may not contain `{0}` (letters I, O, Q are excluded)")]
    Charset(char),
}

/// 17-character vehicle identification number, stored uppercase. The alphabet
/// excludes I, O, and Q per ISO 3779.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub const LENGTH: usize = 17;

    pub fn parse(raw: &str) -> Result<Vin, VinParseError> {
        let normalized = normalize_vin_input(raw);
        if normalized.chars().count() != Vin::LENGTH {
            return Err(VinParseError::Length {
                got: normalized.chars().count(),
            });
        }
        if let Some(bad) = normalized.chars().find(|ch| !is_vin_char(*ch)) {
            return Err(VinParseError::Charset(bad));
        }
        Ok(Vin(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Case-normalizes raw VIN entry the way the form field does.
pub fn normalize_vin_input(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// A–Z minus {I, O, Q}, plus digits.
pub fn is_vin_char(ch: char) -> bool {
    ch.is_ascii_digit() || (ch.is_ascii_uppercase() && !matches!(ch, 'I' | 'O' | 'Q'))
}

/// One optional cost line on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostField {
    Cpc,
    Valuation,
    CustomsDuty,
    CometShipping,
    TerminalCharges,
    Agencies,
    Examination,
    Release,
    Disc,
    Gate,
    Ciu,
    Monitoring,
}

impl CostField {
    /// Year from which the CIU and monitoring levies apply.
    pub const LEVY_CUTOFF_YEAR: i32 = 2017;

    /// Lines shared by every clearance type, in entry order.
    const SHARED: [CostField; 5] = [
        CostField::Agencies,
        CostField::Examination,
        CostField::Release,
        CostField::Disc,
        CostField::Gate,
    ];

    /// Lines that only full clearance carries, in entry order.
    const FULL_ONLY: [CostField; 5] = [
        CostField::Cpc,
        CostField::Valuation,
        CostField::CustomsDuty,
        CostField::CometShipping,
        CostField::TerminalCharges,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CostField::Cpc => "cpc",
            CostField::Valuation => "valuation",
            CostField::CustomsDuty => "customs_duty",
            CostField::CometShipping => "comet_shipping",
            CostField::TerminalCharges => "terminal_charges",
            CostField::Agencies => "agencies",
            CostField::Examination => "examination",
            CostField::Release => "release",
            CostField::Disc => "disc",
            CostField::Gate => "gate",
            CostField::Ciu => "ciu",
            CostField::Monitoring => "monitoring",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CostField::Cpc => "CPC",
            CostField::Valuation => "Valuation",
            CostField::CustomsDuty => "Customs Duty",
            CostField::CometShipping => "Comet/Shipping",
            CostField::TerminalCharges => "Terminal Charges",
            CostField::Agencies => "Agencies",
            CostField::Examination => "Examination",
            CostField::Release => "Release",
            CostField::Disc => "Disc",
            CostField::Gate => "Gate",
            CostField::Ciu => "CIU",
            CostField::Monitoring => "Monitoring",
        }
    }

    /// Cost lines relevant for a clearance type and model year, in entry order.
    /// The CIU/monitoring levies only apply to vehicles from
    /// [`CostField::LEVY_CUTOFF_YEAR`] onward.
    pub fn visible_for(clearance: ClearanceType, year: Option<i32>) -> Vec<CostField> {
        let mut fields = Vec::new();
        if clearance == ClearanceType::Full {
            fields.extend(CostField::FULL_ONLY);
        }
        fields.extend(CostField::SHARED);
        if year.is_some_and(|y| y >= CostField::LEVY_CUTOFF_YEAR) {
            fields.push(CostField::Ciu);
            fields.push(CostField::Monitoring);
        }
        fields
    }
}

/// Mutable in-progress intake record, owned by a single wizard session. It is
/// never persisted server-side before the final submit.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDraft {
    pub clearance_type: Option<ClearanceType>,
    /// Raw VIN entry, case-normalized as typed; validated on step advance.
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub ship_name: Option<String>,
    pub terminal: Option<Terminal>,
    pub arrival_date: Option<NaiveDate>,
    /// Defaulted here, overwritten from the arrival date at submit time.
    pub status: VehicleStatus,
    pub costs: BTreeMap<CostField, f64>,
    /// Populated as a side effect of the estimate lookup, never user-edited.
    pub estimated_total_cost: Option<f64>,
}

impl VehicleDraft {
    pub fn new() -> Self {
        Self {
            clearance_type: None,
            vin: String::new(),
            make: String::new(),
            model: String::new(),
            year: None,
            color: None,
            ship_name: None,
            terminal: None,
            arrival_date: None,
            status: VehicleStatus::default(),
            costs: BTreeMap::new(),
            estimated_total_cost: None,
        }
    }

    /// Cost lines currently relevant given the chosen clearance type and year.
    /// Entries hidden by a clearance/year change are retained in `costs` but
    /// excluded here, from the review summary, and from the payload.
    pub fn visible_cost_fields(&self) -> Vec<CostField> {
        match self.clearance_type {
            Some(clearance) => CostField::visible_for(clearance, self.year),
            None => Vec::new(),
        }
    }

    /// Sum of the visible, filled-in cost lines.
    pub fn entered_cost_total(&self) -> f64 {
        self.visible_cost_fields()
            .iter()
            .filter_map(|field| self.costs.get(field))
            .sum()
    }
}

impl Default for VehicleDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized create request. Dates become ISO-8601 strings; optional fields
/// and zero-valued cost lines are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePayload {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance_type: Option<ClearanceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<Terminal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<String>,
    pub status: VehicleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customs_duty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comet_shipping: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_charges: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agencies: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examination: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_total_cost: Option<f64>,
}

impl VehiclePayload {
    pub fn cost(&self, field: CostField) -> Option<f64> {
        match field {
            CostField::Cpc => self.cpc,
            CostField::Valuation => self.valuation,
            CostField::CustomsDuty => self.customs_duty,
            CostField::CometShipping => self.comet_shipping,
            CostField::TerminalCharges => self.terminal_charges,
            CostField::Agencies => self.agencies,
            CostField::Examination => self.examination,
            CostField::Release => self.release,
            CostField::Disc => self.disc,
            CostField::Gate => self.gate,
            CostField::Ciu => self.ciu,
            CostField::Monitoring => self.monitoring,
        }
    }

    pub fn set_cost(&mut self, field: CostField, value: Option<f64>) {
        let slot = match field {
            CostField::Cpc => &mut self.cpc,
            CostField::Valuation => &mut self.valuation,
            CostField::CustomsDuty => &mut self.customs_duty,
            CostField::CometShipping => &mut self.comet_shipping,
            CostField::TerminalCharges => &mut self.terminal_charges,
            CostField::Agencies => &mut self.agencies,
            CostField::Examination => &mut self.examination,
            CostField::Release => &mut self.release,
            CostField::Disc => &mut self.disc,
            CostField::Gate => &mut self.gate,
            CostField::Ciu => &mut self.ciu,
            CostField::Monitoring => &mut self.monitoring,
        };
        *slot = value;
    }
}

/// Vehicle record as returned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: i64,
    #[serde(flatten)]
    pub vehicle: VehiclePayload,
}
