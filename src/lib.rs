//! Client core for the Mortality Atlas dashboard.
//!
//! Everything in the library is target independent: the disease hierarchy
//! index, the selection state with its URL round trip and cache keys, the
//! per-session response caches, the event driven session state machine and
//! the endpoint models. The Yew front end in `main.rs` wires these to the DOM.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

pub mod api;
pub mod cache;
pub mod drilldown;
pub mod error;
pub mod geo;
pub mod hierarchy;
pub mod logging;
pub mod playback;
pub mod rates;
pub mod route;
pub mod selection;
pub mod session;

pub use error::{FetchError, HierarchyError};
pub use hierarchy::{DiseaseHierarchy, DiseaseNode, DiseaseTree};
pub use selection::SelectionState;
pub use session::{Effect, FetchTicket, Session, SessionEvent};

/// Default session parameters
pub mod defaults {
    use super::Sex;

    pub const SEXES: [Sex; 2] = [Sex::Male, Sex::Female];
    pub const ANIMATION_SPEED_MS: u32 = 1000;
    pub const STATISTICS_MIN: f64 = 0.0;
    pub const STATISTICS_MAX: f64 = 1.0;
}

pub type DiseaseId = u32;
pub type LocationId = u32;
pub type Year = i32;

/// Sex filter codes as used by the rates endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sex {
    Male = 1,
    Female = 2,
}

impl Sex {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Sex> {
        match code {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Join ids with commas, the wire format of every list parameter.
pub fn join_ids<T: fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Accepts `12` as well as `"12"`. The API is not consistent about it.
pub(crate) fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
