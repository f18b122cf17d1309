pub mod catalog;
pub mod vehicle;

pub use catalog::ModelCatalog;
pub use vehicle::{
    normalize_vin_input, ClearanceType, CostField, Terminal, VehicleDraft, VehiclePayload,
    VehicleRecord, VehicleStatus, Vin, VinParseError,
};
