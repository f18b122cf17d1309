//! Remote collaborators consumed by the intake core: the estimate endpoint,
//! the vehicle list (used for VIN availability), and vehicle create/read.

pub mod http;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Terminal, VehiclePayload, VehicleRecord};

pub use http::HttpClient;

/// Matching strategies the estimate endpoint reports, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactWithTerminal,
    MakeModelWithTerminal,
    MakeYearWithTerminal,
    MakeWithTerminal,
    Exact,
    MakeAndModel,
    MakeAndYear,
    MakeOnly,
    YearOnly,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::ExactWithTerminal => "exact match at this terminal",
            MatchType::MakeModelWithTerminal => "same make and model at this terminal",
            MatchType::MakeYearWithTerminal => "same make and year at this terminal",
            MatchType::MakeWithTerminal => "same make at this terminal",
            MatchType::Exact => "exact match",
            MatchType::MakeAndModel => "same make and model",
            MatchType::MakeAndYear => "same make and year",
            MatchType::MakeOnly => "same make",
            MatchType::YearOnly => "same year",
        }
    }
}

/// Aggregate historical-cost estimate. A present response with no
/// `average_clearing_cost` means "no matching history", not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub average_clearing_cost: Option<f64>,
    #[serde(default)]
    pub sample_size: u32,
    #[serde(default)]
    pub is_normalized: bool,
    #[serde(default)]
    pub match_type: Option<MatchType>,
}

/// One field-level item inside a structured validation failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldErrorItem {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl FieldErrorItem {
    /// Dotted field path, skipping the leading request-section segment.
    pub fn field(&self) -> String {
        let segments: Vec<&str> = self
            .loc
            .iter()
            .filter_map(|segment| segment.as_str())
            .filter(|segment| *segment != "body" && *segment != "query")
            .collect();
        if segments.is_empty() {
            "request".to_string()
        } else {
            segments.join(".")
        }
    }
}

/// Error detail shapes the backend is known to produce: a bare message or an
/// array of field-level validation items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    FieldErrors(Vec<FieldErrorItem>),
}

impl ErrorDetail {
    /// Flattens whatever the backend sent into one display-ready string.
    pub fn to_display(&self) -> String {
        match self {
            ErrorDetail::Message(text) => text.clone(),
            ErrorDetail::FieldErrors(items) => items
                .iter()
                .map(|item| format!("{} -> {}", item.field(), item.msg))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Standard error envelope wrapping [`ErrorDetail`].
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

/// Remote-call failures, normalized to display-ready strings at this boundary
/// so raw transport errors never reach the presentation layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Remote(String),
    #[error("Could not reach the clearing service: {0}")]
    Transport(String),
    #[error("Unexpected response from the clearing service: {0}")]
    Decode(String),
}

/// Read-side collaborator serving historical clearing-cost estimates.
pub trait EstimateApi {
    /// `None` means the service found no matching history at any tier.
    fn global_search(
        &self,
        make: &str,
        model: &str,
        year: i32,
        terminal: Option<Terminal>,
    ) -> Result<Option<EstimateResult>, ApiError>;
}

/// Vehicle persistence collaborator.
pub trait VehicleApi {
    /// Whether a vehicle with this VIN is already registered.
    fn vin_exists(&self, vin: &str) -> Result<bool, ApiError>;

    /// Creates the record and returns it, id included.
    fn create(&self, payload: &VehiclePayload) -> Result<VehicleRecord, ApiError>;

    /// Reads a record back for the detail view.
    fn fetch(&self, id: i64) -> Result<VehicleRecord, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_passes_through_verbatim() {
        let detail: ErrorDetail =
            serde_json::from_str("\"VIN already registered\"").expect("parses");
        assert_eq!(detail.to_display(), "VIN already registered");
    }

    #[test]
    fn field_errors_flatten_to_one_line() {
        let raw = r#"[
            {"loc": ["body", "vin"], "msg": "field required"},
            {"loc": ["body", "year"], "msg": "value is not a valid integer"}
        ]"#;
        let detail: ErrorDetail = serde_json::from_str(raw).expect("parses");
        assert_eq!(
            detail.to_display(),
            "vin -> field required; year -> value is not a valid integer"
        );
    }

    #[test]
    fn positional_loc_segments_fall_back_to_request() {
        let raw = r#"[{"loc": ["body", 0], "msg": "invalid"}]"#;
        let detail: ErrorDetail = serde_json::from_str(raw).expect("parses");
        assert_eq!(detail.to_display(), "request -> invalid");
    }

    #[test]
    fn match_type_uses_the_backend_vocabulary() {
        let parsed: MatchType = serde_json::from_str("\"make_and_model\"").expect("parses");
        assert_eq!(parsed, MatchType::MakeAndModel);
        let parsed: MatchType =
            serde_json::from_str("\"exact_with_terminal\"").expect("parses");
        assert_eq!(parsed, MatchType::ExactWithTerminal);
    }

    #[test]
    fn estimate_result_tolerates_missing_metadata() {
        let parsed: EstimateResult =
            serde_json::from_str(r#"{"average_clearing_cost": null}"#).expect("parses");
        assert_eq!(parsed.average_clearing_cost, None);
        assert_eq!(parsed.sample_size, 0);
        assert!(!parsed.is_normalized);
        assert_eq!(parsed.match_type, None);
    }
}
