//! Page routes and the navigation links between them.
//!
//! Every link carries the current selection in its query string so the next
//! page starts with the same filters.

use crate::selection::SelectionState;
use crate::{DiseaseId, LocationId, Year};
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled path patterns
static COUNTRY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/country/(\d+)/?$").unwrap());
static DRILLDOWN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/disease_drilldown/(\d+)/(\d+)/(\d+)/?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Map,
    Country {
        location: LocationId,
    },
    Drilldown {
        location: LocationId,
        year: Year,
        disease: DiseaseId,
    },
    NotFound,
}

impl Route {
    pub fn parse(pathname: &str) -> Route {
        let path = pathname.trim();
        if path.is_empty() || path == "/" || path == "/index.html" {
            return Route::Map;
        }

        if let Some(captures) = COUNTRY_REGEX.captures(path) {
            if let Ok(location) = captures[1].parse() {
                return Route::Country { location };
            }
        }

        if let Some(captures) = DRILLDOWN_REGEX.captures(path) {
            let parsed = (
                captures[1].parse(),
                captures[2].parse(),
                captures[3].parse(),
            );
            if let (Ok(location), Ok(year), Ok(disease)) = parsed {
                return Route::Drilldown {
                    location,
                    year,
                    disease,
                };
            }
        }

        Route::NotFound
    }

    pub fn path(&self) -> String {
        match self {
            Route::Map | Route::NotFound => "/".to_string(),
            Route::Country { location } => format!("/country/{}", location),
            Route::Drilldown {
                location,
                year,
                disease,
            } => format!("/disease_drilldown/{}/{}/{}", location, year, disease),
        }
    }

    /// Link to this page carrying `selection`.
    pub fn href(&self, selection: &SelectionState) -> String {
        format!("{}?{}", self.path(), selection.to_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sex;
    use rstest::rstest;

    #[rstest]
    #[case("/", Route::Map)]
    #[case("", Route::Map)]
    #[case("/country/102", Route::Country { location: 102 })]
    #[case("/country/102/", Route::Country { location: 102 })]
    #[case("/country/abc", Route::NotFound)]
    #[case("/disease_drilldown/102/2019/295", Route::Drilldown { location: 102, year: 2019, disease: 295 })]
    #[case("/disease_drilldown/102/2019", Route::NotFound)]
    #[case("/country/99999999999999", Route::NotFound)]
    #[case("/elsewhere", Route::NotFound)]
    fn parses_paths(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(Route::parse(path), expected);
    }

    #[test]
    fn links_carry_the_selection() {
        let selection = SelectionState::from_parts([295, 297], [Sex::Female]);
        assert_eq!(
            Route::Country { location: 102 }.href(&selection),
            "/country/102?diseases=295,297&sexes=2"
        );
        assert_eq!(
            Route::Drilldown {
                location: 102,
                year: 2019,
                disease: 295
            }
            .href(&selection),
            "/disease_drilldown/102/2019/295?diseases=295,297&sexes=2"
        );
        assert_eq!(Route::Map.href(&selection), "/?diseases=295,297&sexes=2");
    }

    #[test]
    fn path_round_trips() {
        let route = Route::Drilldown {
            location: 6,
            year: 1990,
            disease: 409,
        };
        assert_eq!(Route::parse(&route.path()), route);
    }
}
