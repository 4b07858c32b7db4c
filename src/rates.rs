//! Response models of the rate endpoints.
//!
//! Rates are deaths per 100,000. The server omits rates it has no rows for,
//! and some endpoints serialise numbers as strings, so every numeric field
//! is read leniently and defaults to 0.

use crate::error::FetchError;
use crate::{defaults, number_or_string, DiseaseId, LocationId, Year};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Reads numbers, numeric strings and `null`; anything unreadable is 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// A rate map value, read with [`lenient_number`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate(#[serde(deserialize_with = "lenient_number")] pub f64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SexRates {
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
    #[serde(rename = "1", default, deserialize_with = "lenient_number")]
    pub male: f64,
    #[serde(rename = "2", default, deserialize_with = "lenient_number")]
    pub female: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default, deserialize_with = "lenient_number")]
    pub min: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            min: defaults::STATISTICS_MIN,
            max: defaults::STATISTICS_MAX,
        }
    }
}

impl Statistics {
    /// Upper bound of the colour domain; a zero maximum would collapse it.
    pub fn domain_max(&self) -> f64 {
        if self.max > 0.0 {
            self.max
        } else {
            1.0
        }
    }
}

/// Position of `value` on a `[0, max]` colour ramp, clamped to `[0, 1]`.
pub fn colour_fraction(value: f64, max: f64) -> f64 {
    let max = if max > 0.0 { max } else { 1.0 };
    (value / max).clamp(0.0, 1.0)
}

fn parse_location_map(raw: HashMap<String, SexRates>) -> HashMap<LocationId, SexRates> {
    raw.into_iter()
        .filter_map(|(key, rates)| match key.parse::<LocationId>() {
            Ok(id) => Some((id, rates)),
            Err(_) => {
                debug!("Skipping non-numeric location key {:?}", key);
                None
            }
        })
        .collect()
}

/// One map frame: rates per location for a single year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryRates {
    pub rates: HashMap<LocationId, SexRates>,
    pub statistics: Statistics,
}

impl CountryRates {
    /// Parse `/api/all-countries-rates`, splitting out `_statistics`.
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let Value::Object(mut object) = value else {
            return Err(FetchError::Decode(
                "country rates must be a JSON object".to_string(),
            ));
        };
        let statistics = match object.remove("_statistics") {
            Some(raw) => serde_json::from_value(raw)?,
            None => Statistics::default(),
        };
        let raw: HashMap<String, SexRates> = serde_json::from_value(Value::Object(object))?;
        Ok(CountryRates {
            rates: parse_location_map(raw),
            statistics,
        })
    }

    pub fn get(&self, location: LocationId) -> SexRates {
        self.rates.get(&location).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Location id to total rate, the shape the map colouring expects.
    pub fn totals(&self) -> BTreeMap<String, f64> {
        self.rates
            .iter()
            .map(|(id, rates)| (id.to_string(), rates.total))
            .collect()
    }
}

/// `/api/all-years-data`: every map frame for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllYearsData {
    #[serde(rename = "yearData", default)]
    year_data: HashMap<String, HashMap<String, SexRates>>,
    #[serde(default)]
    statistics: HashMap<String, Statistics>,
}

impl AllYearsData {
    pub fn has_year(&self, year: Year) -> bool {
        self.year_data.contains_key(&year.to_string())
    }

    pub fn frame(&self, year: Year) -> Option<CountryRates> {
        let key = year.to_string();
        let rates = self.year_data.get(&key)?;
        Some(CountryRates {
            rates: parse_location_map(rates.clone()),
            statistics: self.statistics.get(&key).copied().unwrap_or_default(),
        })
    }
}

/// `/api/country-history`: yearly totals of one location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryHistory {
    #[serde(default)]
    total: HashMap<String, Rate>,
}

impl CountryHistory {
    /// `(year, total)` sorted by year.
    pub fn series(&self) -> Vec<(Year, f64)> {
        let mut points: Vec<(Year, f64)> = self
            .total
            .iter()
            .filter_map(|(year, rate)| Some((year.parse().ok()?, rate.0)))
            .collect();
        points.sort_by_key(|(year, _)| *year);
        points
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawLevel1 {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: HashMap<String, SexRates>,
}

/// One level-1 cause and its yearly totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Level1Line {
    pub id: DiseaseId,
    pub name: String,
    pub points: Vec<(Year, f64)>,
}

impl Level1Line {
    pub fn value_at(&self, year: Year) -> Option<f64> {
        self.points
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, value)| *value)
    }
}

/// `/api/disease-rates-by-level1`, ordered by level-1 id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level1Rates {
    pub lines: Vec<Level1Line>,
}

impl Level1Rates {
    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let raw: HashMap<String, RawLevel1> = serde_json::from_value(value)?;
        let mut lines: Vec<Level1Line> = raw
            .into_iter()
            .filter_map(|(key, series)| {
                let id = key.parse::<DiseaseId>().ok()?;
                let mut points: Vec<(Year, f64)> = series
                    .data
                    .iter()
                    .filter_map(|(year, rates)| Some((year.parse().ok()?, rates.total)))
                    .collect();
                points.sort_by_key(|(year, _)| *year);
                Some(Level1Line {
                    id,
                    name: series.name,
                    points,
                })
            })
            .collect();
        lines.sort_by_key(|line| line.id);
        Ok(Level1Rates { lines })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Union of all years with data, ascending.
    pub fn years(&self) -> Vec<Year> {
        let mut years: Vec<Year> = self
            .lines
            .iter()
            .flat_map(|line| line.points.iter().map(|(year, _)| *year))
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn max_total(&self) -> f64 {
        self.lines
            .iter()
            .flat_map(|line| line.points.iter().map(|(_, value)| *value))
            .fold(0.0, f64::max)
    }
}

/// A row of `/api/disease_children`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRate {
    #[serde(deserialize_with = "number_or_string")]
    pub id: DiseaseId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: f64,
    #[serde(default)]
    pub has_children: bool,
}

/// `/api/disease_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDetails {
    #[serde(deserialize_with = "number_or_string")]
    pub id: DiseaseId,
    pub name: String,
    #[serde(default)]
    pub cause_code: Option<String>,
    #[serde(default)]
    pub country_name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub year: Year,
    #[serde(default)]
    pub rates: SexRates,
    #[serde(default)]
    pub has_children: bool,
}

/// A node of `/api/hierarchical-disease-data`, fed to the sunburst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunburstNode {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parent: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_rates_default_to_zero() {
        let rates: SexRates = serde_json::from_value(json!({"total": "12.5", "1": null})).unwrap();
        assert_eq!(
            rates,
            SexRates {
                total: 12.5,
                male: 0.0,
                female: 0.0
            }
        );
    }

    #[test]
    fn country_rates_split_statistics() {
        let value = json!({
            "102": {"total": 4.0, "1": 5.0, "2": 3.0},
            "6": {"total": 1.5},
            "_statistics": {"min": 1.5, "max": 4.0}
        });
        let rates = CountryRates::from_value(value).unwrap();
        assert_eq!(rates.rates.len(), 2);
        assert_eq!(rates.get(102).male, 5.0);
        assert_eq!(rates.get(6).female, 0.0);
        assert_eq!(rates.get(999), SexRates::default());
        assert_eq!(rates.statistics.max, 4.0);
        assert_eq!(rates.totals().get("6"), Some(&1.5));
    }

    #[test]
    fn country_rates_without_statistics_use_fallback() {
        let rates = CountryRates::from_value(json!({})).unwrap();
        assert!(rates.is_empty());
        assert_eq!(rates.statistics, Statistics { min: 0.0, max: 1.0 });
        assert!(CountryRates::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn colour_domain_never_collapses() {
        assert_eq!(Statistics { min: 0.0, max: 0.0 }.domain_max(), 1.0);
        assert_eq!(colour_fraction(5.0, 10.0), 0.5);
        assert_eq!(colour_fraction(20.0, 10.0), 1.0);
        assert_eq!(colour_fraction(0.3, 0.0), 0.3);
    }

    #[test]
    fn all_years_frames() {
        let data: AllYearsData = serde_json::from_value(json!({
            "yearData": {"2019": {"102": {"total": 2.0}}, "2020": {"102": {"total": 3.0}}},
            "statistics": {"2019": {"min": 2.0, "max": 2.0}}
        }))
        .unwrap();
        assert!(data.has_year(2020));
        assert!(!data.has_year(2021));
        assert_eq!(data.frame(2019).unwrap().statistics.max, 2.0);
        let frame = data.frame(2020).unwrap();
        assert_eq!(frame.get(102).total, 3.0);
        assert_eq!(frame.statistics, Statistics::default());
        assert!(data.frame(2021).is_none());
    }

    #[test]
    fn history_series_is_sorted() {
        let history: CountryHistory = serde_json::from_value(json!({
            "total": {"2001": "2.5", "1999": 1.0, "bad": 3.0}
        }))
        .unwrap();
        assert_eq!(history.series(), vec![(1999, 1.0), (2001, 2.5)]);
        let empty: CountryHistory = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn level1_rates_order_by_id() {
        let rates = Level1Rates::from_value(json!({
            "409": {"name": "NCDs", "data": {"2000": {"total": 9.0}, "1990": {"total": 7.0}}},
            "295": {"name": "Communicable", "data": {"2000": {}}}
        }))
        .unwrap();
        let ids: Vec<_> = rates.lines.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![295, 409]);
        assert_eq!(rates.years(), vec![1990, 2000]);
        assert_eq!(rates.max_total(), 9.0);
        assert_eq!(rates.lines[1].value_at(1990), Some(7.0));
        assert_eq!(rates.lines[0].value_at(2000), Some(0.0));
        assert_eq!(rates.lines[0].value_at(1990), None);
    }

    #[test]
    fn child_and_detail_rows() {
        let rows: Vec<ChildRate> = serde_json::from_value(json!([
            {"id": "297", "name": "Tuberculosis", "value": 3.25, "has_children": true},
            {"id": 298, "name": "HIV"}
        ]))
        .unwrap();
        assert!(rows[0].has_children);
        assert_eq!(rows[1].value, 0.0);

        let details: DiseaseDetails = serde_json::from_value(json!({
            "id": 297, "name": "Tuberculosis", "country_name": "Chile",
            "year": "2019", "rates": {"total": 1.0, "1": 1.5, "2": 0.5}
        }))
        .unwrap();
        assert_eq!(details.year, 2019);
        assert_eq!(details.cause_code, None);
        assert!(!details.has_children);
    }

    #[test]
    fn sunburst_nodes_accept_numeric_ids_and_null_parents() {
        let nodes: Vec<SunburstNode> = serde_json::from_value(json!([
            {"id": 294, "name": "All causes", "parent": null, "value": 10.0},
            {"id": "295", "name": "Communicable", "parent": 294, "value": "4"}
        ]))
        .unwrap();
        assert_eq!(nodes[0].parent, "");
        assert_eq!(nodes[1].parent, "294");
        assert_eq!(nodes[1].value, 4.0);
    }
}
