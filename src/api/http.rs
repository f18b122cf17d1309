//! Blocking `ureq` client for the clearing service API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::domain::{Terminal, VehiclePayload, VehicleRecord};

use super::{ApiError, ErrorEnvelope, EstimateApi, EstimateResult, VehicleApi};

/// HTTP implementation of the remote collaborators. Non-2xx responses are not
/// surfaced as transport errors so their detail bodies stay readable.
pub struct HttpClient {
    agent: Agent,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl EstimateApi for HttpClient {
    fn global_search(
        &self,
        make: &str,
        model: &str,
        year: i32,
        terminal: Option<Terminal>,
    ) -> Result<Option<EstimateResult>, ApiError> {
        let mut request = self
            .agent
            .get(self.url("/estimate/global-search"))
            .query("make", make)
            .query("model", model)
            .query("year", year.to_string());
        if let Some(terminal) = terminal {
            request = request.query("terminal", terminal.label());
        }
        let response = request.call().map_err(transport)?;
        tracing::debug!(make, model, year, "estimate lookup issued");
        decode::<Option<EstimateResult>>(response)
    }
}

impl VehicleApi for HttpClient {
    fn vin_exists(&self, vin: &str) -> Result<bool, ApiError> {
        let response = self
            .agent
            .get(self.url("/vehicles/"))
            .query("search", vin)
            .query("limit", "1")
            .call()
            .map_err(transport)?;
        // Only the page length matters; record shapes vary across statuses.
        let page: Vec<serde_json::Value> = decode(response)?;
        Ok(!page.is_empty())
    }

    fn create(&self, payload: &VehiclePayload) -> Result<VehicleRecord, ApiError> {
        let response = self
            .agent
            .post(self.url("/vehicles/"))
            .send_json(payload)
            .map_err(transport)?;
        tracing::debug!(vin = %payload.vin, "create vehicle issued");
        decode::<VehicleRecord>(response)
    }

    fn fetch(&self, id: i64) -> Result<VehicleRecord, ApiError> {
        let response = self
            .agent
            .get(self.url(&format!("/vehicles/{id}")))
            .call()
            .map_err(transport)?;
        decode::<VehicleRecord>(response)
    }
}

fn transport(err: ureq::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn decode<T: DeserializeOwned>(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    } else {
        Err(remote_error(status.as_u16(), response))
    }
}

fn remote_error(code: u16, mut response: ureq::http::Response<ureq::Body>) -> ApiError {
    let detail = response
        .body_mut()
        .read_json::<ErrorEnvelope>()
        .ok()
        .and_then(|envelope| envelope.detail);
    match detail {
        Some(detail) => ApiError::Remote(detail.to_display()),
        None => ApiError::Remote(format!("service returned status {code}")),
    }
}
