//! Event driven state of a dashboard page.
//!
//! UI callbacks never touch the selection or the caches directly. They turn
//! DOM events into [`SessionEvent`]s, hand them to [`Session::handle`] and
//! act on the returned [`Effect`].
//!
//! Fetches are tagged with a [`FetchTicket`] when issued. A response is only
//! applied if its ticket still describes the current selection (and year,
//! for per-year requests); otherwise a slow response for an old selection
//! would overwrite a newer one.

use crate::cache::SessionCache;
use crate::hierarchy::DiseaseTree;
use crate::selection::SelectionState;
use crate::{DiseaseId, Sex, Year};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DiseaseToggled { id: DiseaseId, checked: bool },
    SexToggled { checked: Vec<Sex> },
    YearChanged(Year),
    FetchCompleted(FetchTicket),
}

/// What the caller should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The data on screen no longer matches; fetch it again.
    Refetch,
    /// The year changed and its frame is already cached.
    Redraw,
    /// The completed fetch is current; use its response.
    Apply,
    /// The completed fetch is out of date; drop its response.
    DiscardStale,
    Nothing,
}

/// Identifies the state a request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: String,
    pub generation: u64,
    pub year: Option<Year>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    selection: SelectionState,
    years: Vec<Year>,
    year: Option<Year>,
    generation: u64,
    cache: SessionCache,
}

impl Session {
    pub fn new(selection: SelectionState) -> Self {
        Session {
            selection,
            ..Session::default()
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Replace the selection wholesale, e.g. after reading it from the URL.
    pub fn set_selection(&mut self, selection: SelectionState) -> Effect {
        if selection == self.selection {
            return Effect::Nothing;
        }
        self.selection = selection;
        self.selection_changed();
        Effect::Refetch
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn year(&self) -> Option<Year> {
        self.year
    }

    /// Install the available years and jump to the latest one.
    pub fn set_years(&mut self, mut years: Vec<Year>) {
        years.sort_unstable();
        years.dedup();
        self.year = years.last().copied();
        self.years = years;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SessionCache {
        &mut self.cache
    }

    pub fn cache_key(&self, scope: Option<&str>) -> String {
        self.selection.cache_key(scope)
    }

    pub fn handle(&mut self, tree: &DiseaseTree, event: SessionEvent) -> Effect {
        match event {
            SessionEvent::DiseaseToggled { id, checked } => {
                let next = self.selection.toggle_disease(tree, id, checked);
                self.set_selection(next)
            }
            SessionEvent::SexToggled { checked } => {
                let next = self.selection.toggle_sex(&checked);
                self.set_selection(next)
            }
            SessionEvent::YearChanged(year) => self.change_year(year),
            SessionEvent::FetchCompleted(ticket) => {
                if self.is_current(&ticket) {
                    Effect::Apply
                } else {
                    debug!(
                        "Discarding stale response for {} (generation {}, now {})",
                        ticket.key, ticket.generation, self.generation
                    );
                    Effect::DiscardStale
                }
            }
        }
    }

    /// Tag a request for the current selection. `year` marks per-year data.
    pub fn issue(&self, scope: Option<&str>, year: Option<Year>) -> FetchTicket {
        FetchTicket {
            key: self.selection.cache_key(scope),
            generation: self.generation,
            year,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
            && ticket.year.map_or(true, |year| Some(year) == self.year)
    }

    fn change_year(&mut self, year: Year) -> Effect {
        if Some(year) == self.year {
            return Effect::Nothing;
        }
        if !self.years.contains(&year) {
            warn!("Year {} is not available, ignoring", year);
            return Effect::Nothing;
        }
        self.year = Some(year);

        let key = self.selection.cache_key(None);
        match self.cache.all_years.get(&key) {
            Some(data) if data.has_year(year) => Effect::Redraw,
            _ => Effect::Refetch,
        }
    }

    // Sex-only changes alter aggregated rates too, so every filter change
    // clears the caches.
    fn selection_changed(&mut self) {
        self.generation += 1;
        self.cache.invalidate_all();
        debug!(
            "Selection is now {} (generation {})",
            self.selection.cache_key(None),
            self.generation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tests::sample_tree;
    use crate::rates::{AllYearsData, CountryHistory};
    use serde_json::json;

    fn session() -> Session {
        let mut session = Session::new(SelectionState::new());
        session.set_years(vec![2000, 1990, 2010, 2000]);
        session
    }

    #[test]
    fn years_are_sorted_and_latest_is_current() {
        let session = session();
        assert_eq!(session.years(), &[1990, 2000, 2010]);
        assert_eq!(session.year(), Some(2010));
    }

    #[test]
    fn disease_toggle_cascades_and_invalidates() {
        let tree = sample_tree();
        let mut session = session();
        session.cache_mut().all_years.put("x", AllYearsData::default());

        let effect = session.handle(&tree, SessionEvent::DiseaseToggled { id: 10, checked: true });
        assert_eq!(effect, Effect::Refetch);
        assert_eq!(session.selection().diseases(), &[10, 100, 101]);
        assert!(session.cache().is_empty());
        assert_eq!(session.generation(), 1);

        let again = session.handle(&tree, SessionEvent::DiseaseToggled { id: 10, checked: true });
        assert_eq!(again, Effect::Nothing);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn sex_toggle_also_invalidates() {
        let tree = sample_tree();
        let mut session = session();
        session
            .cache_mut()
            .country_history
            .put("102|1,2", CountryHistory::default());

        let effect = session.handle(
            &tree,
            SessionEvent::SexToggled {
                checked: vec![Sex::Female],
            },
        );
        assert_eq!(effect, Effect::Refetch);
        assert!(session.cache().is_empty());

        let reset = session.handle(&tree, SessionEvent::SexToggled { checked: vec![] });
        assert_eq!(reset, Effect::Refetch);
        assert_eq!(session.selection().sexes(), &[Sex::Male, Sex::Female]);
    }

    #[test]
    fn stale_fetches_are_discarded() {
        let tree = sample_tree();
        let mut session = session();
        let old = session.issue(None, session.year());
        session.handle(&tree, SessionEvent::DiseaseToggled { id: 2, checked: true });
        let new = session.issue(None, session.year());

        assert_eq!(
            session.handle(&tree, SessionEvent::FetchCompleted(old)),
            Effect::DiscardStale
        );
        assert_eq!(
            session.handle(&tree, SessionEvent::FetchCompleted(new)),
            Effect::Apply
        );
    }

    #[test]
    fn per_year_tickets_go_stale_on_year_change() {
        let tree = sample_tree();
        let mut session = session();
        let yearly = session.issue(None, Some(2010));
        let history = session.issue(Some("102"), None);
        session.handle(&tree, SessionEvent::YearChanged(1990));

        assert!(!session.is_current(&yearly));
        assert!(session.is_current(&history));
        assert_eq!(history.key, "102||1,2");
    }

    #[test]
    fn year_change_redraws_from_cache_when_possible() {
        let tree = sample_tree();
        let mut session = session();
        assert_eq!(
            session.handle(&tree, SessionEvent::YearChanged(2010)),
            Effect::Nothing
        );
        assert_eq!(
            session.handle(&tree, SessionEvent::YearChanged(1995)),
            Effect::Nothing
        );
        assert_eq!(
            session.handle(&tree, SessionEvent::YearChanged(2000)),
            Effect::Refetch
        );

        let data: AllYearsData =
            serde_json::from_value(json!({"yearData": {"1990": {}}, "statistics": {}})).unwrap();
        let key = session.cache_key(None);
        session.cache_mut().all_years.put(key, data);
        assert_eq!(
            session.handle(&tree, SessionEvent::YearChanged(1990)),
            Effect::Redraw
        );
        assert_eq!(session.year(), Some(1990));
    }
}
