//! Endpoint URLs and JSON fetching.
//!
//! The URL builders are plain string formatting and are tested natively;
//! [`fetch_json`] needs a browser (`gloo-net` over `fetch`).

use crate::error::FetchError;
use crate::selection::SelectionState;
use crate::{join_ids, DiseaseId, LocationId, Year};
use gloo_net::http::Request;
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Builds endpoint URLs relative to a base (empty for same origin).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Api {
    base: String,
}

impl Api {
    pub fn new(base: impl Into<String>) -> Self {
        Api {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base, path)
    }

    pub fn diseases(&self) -> String {
        self.url("diseases")
    }

    pub fn locations(&self) -> String {
        self.url("locations")
    }

    pub fn years(&self) -> String {
        self.url("years")
    }

    pub fn all_countries_rates(&self, year: Year, selection: &SelectionState) -> String {
        self.url(&format!(
            "all-countries-rates?year={}&{}",
            year,
            selection.to_query()
        ))
    }

    pub fn all_years_data(&self, selection: &SelectionState) -> String {
        self.url(&format!("all-years-data?{}", selection.to_query()))
    }

    pub fn country_history(&self, location: LocationId, selection: &SelectionState) -> String {
        self.url(&format!(
            "country-history?location={}&{}",
            location,
            selection.to_query()
        ))
    }

    pub fn disease_rates_by_level1(
        &self,
        location: LocationId,
        selection: &SelectionState,
    ) -> String {
        self.url(&format!(
            "disease-rates-by-level1?location={}&{}",
            location,
            selection.to_query()
        ))
    }

    pub fn disease_children(
        &self,
        parent: DiseaseId,
        year: Year,
        location: LocationId,
        selection: &SelectionState,
    ) -> String {
        self.url(&format!(
            "disease_children?parent_id={}&year={}&location_id={}&sexes={}",
            parent,
            year,
            location,
            join_ids(selection.sexes())
        ))
    }

    pub fn disease_details(
        &self,
        disease: DiseaseId,
        year: Year,
        location: LocationId,
        selection: &SelectionState,
    ) -> String {
        self.url(&format!(
            "disease_details?disease_id={}&year={}&location_id={}&sexes={}",
            disease,
            year,
            location,
            join_ids(selection.sexes())
        ))
    }

    pub fn hierarchical_disease_data(
        &self,
        year: Year,
        location: LocationId,
        selection: &SelectionState,
    ) -> String {
        self.url(&format!(
            "hierarchical-disease-data?year={}&location={}&{}",
            year,
            location,
            selection.to_query()
        ))
    }
}

/// Either the payload or the server's `{ "error": .. }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Failed { error: String },
    Ok(T),
}

/// Decode a response body, turning an `error` field into
/// [`FetchError::Lookup`].
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    match serde_json::from_str::<Reply<T>>(body) {
        Ok(Reply::Ok(value)) => Ok(value),
        Ok(Reply::Failed { error }) => Err(FetchError::Lookup(error)),
        // untagged errors are opaque; decode again for a useful message
        Err(_) => serde_json::from_str(body).map_err(FetchError::from),
    }
}

/// GET `url` and decode the JSON body.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    debug!("GET {}", url);
    let response = Request::get(url).send().await.map_err(|e| {
        error!("Request to {} failed: {}", url, e);
        FetchError::Network(e.to_string())
    })?;

    if !response.ok() {
        let err = FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        };
        error!("{}", err);
        return Err(err);
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    decode(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{ChildRate, DiseaseDetails};
    use crate::Sex;

    fn selection() -> SelectionState {
        SelectionState::from_parts([295, 409], [Sex::Male])
    }

    #[test]
    fn builds_selection_urls() {
        let api = Api::new("http://localhost:5000/");
        assert_eq!(api.diseases(), "http://localhost:5000/api/diseases");
        assert_eq!(
            api.all_countries_rates(2019, &selection()),
            "http://localhost:5000/api/all-countries-rates?year=2019&diseases=295,409&sexes=1"
        );
        assert_eq!(
            api.country_history(102, &selection()),
            "http://localhost:5000/api/country-history?location=102&diseases=295,409&sexes=1"
        );
    }

    #[test]
    fn drilldown_urls_only_carry_sexes() {
        let api = Api::default();
        assert_eq!(
            api.disease_children(295, 2019, 102, &selection()),
            "/api/disease_children?parent_id=295&year=2019&location_id=102&sexes=1"
        );
        assert_eq!(
            api.disease_details(297, 2019, 102, &selection()),
            "/api/disease_details?disease_id=297&year=2019&location_id=102&sexes=1"
        );
        assert_eq!(
            api.hierarchical_disease_data(2019, 102, &selection()),
            "/api/hierarchical-disease-data?year=2019&location=102&diseases=295,409&sexes=1"
        );
    }

    #[test]
    fn decode_maps_error_field_to_lookup() {
        let err = decode::<Vec<ChildRate>>(r#"{"error": "Missing required parameters"}"#);
        assert_eq!(
            err,
            Err(FetchError::Lookup("Missing required parameters".to_string()))
        );
        let err = decode::<DiseaseDetails>(r#"{"error": "Disease not found"}"#);
        assert!(matches!(err, Err(FetchError::Lookup(_))));
    }

    #[test]
    fn decode_payloads() {
        let rows: Vec<ChildRate> =
            decode(r#"[{"id": 297, "name": "Tuberculosis", "value": 1.5}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        let empty: Vec<ChildRate> = decode("[]").unwrap();
        assert!(empty.is_empty());
        assert!(matches!(
            decode::<Vec<ChildRate>>("not json"),
            Err(FetchError::Decode(_))
        ));
    }
}
