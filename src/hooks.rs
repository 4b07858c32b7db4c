use log::{error, info};
use mortality_atlas::api::{fetch_json, Api};
use mortality_atlas::geo::LocationIndex;
use mortality_atlas::{
    DiseaseHierarchy, DiseaseTree, Effect, FetchError, SelectionState, Session, SessionEvent,
    Year,
};
use serde::de::DeserializeOwned;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use yew::prelude::*;

/// Shared handle to a page's [`Session`].
///
/// Callbacks created once (map event closures, timers, fetch completions)
/// hold a clone and always see the live session. Changes that affect the
/// view go through [`dispatch`](Self::dispatch) or [`update`](Self::update),
/// which re-render the owning component.
#[derive(Clone)]
pub struct SessionHandle {
    session: Rc<RefCell<Session>>,
    rerender: UseForceUpdateHandle,
}

impl SessionHandle {
    pub fn borrow(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    /// Feed an event to the session and re-render unless nothing changed.
    pub fn dispatch(&self, tree: &DiseaseTree, event: SessionEvent) -> Effect {
        let effect = self.session.borrow_mut().handle(tree, event);
        if !matches!(effect, Effect::Nothing | Effect::DiscardStale) {
            self.rerender.force_update();
        }
        effect
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = f(&mut self.session.borrow_mut());
        self.rerender.force_update();
        result
    }

    /// Mutate without re-rendering, e.g. to fill a cache.
    pub fn silent(&self) -> RefMut<'_, Session> {
        self.session.borrow_mut()
    }

    pub fn refresh(&self) {
        self.rerender.force_update();
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.session, &other.session)
    }
}

/// Page session seeded from the URL selection.
#[hook]
pub fn use_session(selection: SelectionState) -> SessionHandle {
    let session = use_mut_ref(move || Session::new(selection));
    let rerender = use_force_update();
    SessionHandle { session, rerender }
}

/// Fetch `url` in the background and hand the decoded body to `done`.
pub fn spawn_fetch<T, F>(url: String, done: F)
where
    T: DeserializeOwned + 'static,
    F: FnOnce(Result<T, FetchError>) + 'static,
{
    wasm_bindgen_futures::spawn_local(async move {
        done(fetch_json::<T>(&url).await);
    });
}

/// The most recent request of one kind on a page.
///
/// A reply is applied only when its key is still the latest one begun, so
/// a slow answer to an older click never replaces a newer one.
#[derive(Debug)]
pub struct Latest<K> {
    current: Option<K>,
}

impl<K> Default for Latest<K> {
    fn default() -> Self {
        Latest { current: None }
    }
}

impl<K: PartialEq> Latest<K> {
    pub fn begin(&mut self, key: K) {
        self.current = Some(key);
    }

    /// Forget the pending request; every outstanding reply is refused.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn accepts(&self, key: &K) -> bool {
        self.current.as_ref() == Some(key)
    }
}

/// State of one asynchronously loaded region of a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    Loading,
    Ready(T),
    NoData,
    Failed(String),
}

impl<T> Default for Load<T> {
    fn default() -> Self {
        Load::Loading
    }
}

/// Reference data every page needs before it can render filters.
#[derive(Debug, PartialEq)]
pub struct Catalog {
    pub tree: Rc<DiseaseTree>,
    pub locations: Rc<LocationIndex>,
    pub years: Vec<Year>,
}

async fn load_catalog(api: &Api) -> Result<Catalog, FetchError> {
    let (diseases_url, locations_url, years_url) = (api.diseases(), api.locations(), api.years());
    let (hierarchy, locations, years) = futures::join!(
        fetch_json::<DiseaseHierarchy>(&diseases_url),
        fetch_json::<HashMap<String, String>>(&locations_url),
        fetch_json::<Vec<Year>>(&years_url),
    );
    let tree = DiseaseTree::from_hierarchy(&hierarchy?)?;
    let locations = LocationIndex::from_map(locations?);
    let mut years = years?;
    years.sort_unstable();
    info!(
        "Loaded {} diseases, {} locations, {} years",
        tree.len(),
        locations.len(),
        years.len()
    );
    Ok(Catalog {
        tree: Rc::new(tree),
        locations: Rc::new(locations),
        years,
    })
}

/// Diseases, locations and years, fetched concurrently once per page.
#[hook]
pub fn use_catalog(api: Api) -> Load<Rc<Catalog>> {
    let catalog = use_state(|| Load::Loading);
    {
        let catalog = catalog.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match load_catalog(&api).await {
                    Ok(loaded) => catalog.set(Load::Ready(Rc::new(loaded))),
                    Err(err) => {
                        error!("Error loading data: {}", err);
                        catalog.set(Load::Failed(format!("Error loading data: {}", err)));
                    }
                }
            });
            || ()
        });
    }
    (*catalog).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_request_wins_over_earlier_reply() {
        let mut latest = Latest::default();
        latest.begin(1990);
        latest.begin(2019);
        assert!(!latest.accepts(&1990));
        assert!(latest.accepts(&2019));
    }

    #[test]
    fn reset_refuses_everything_pending() {
        let mut latest = Latest::default();
        latest.begin(7u32);
        latest.reset();
        assert!(!latest.accepts(&7));
        latest.begin(7);
        assert!(latest.accepts(&7));
    }

    #[test]
    fn nothing_begun_accepts_nothing() {
        let latest = Latest::<u32>::default();
        assert!(!latest.accepts(&0));
    }

    #[test]
    fn catalog_load_starts_in_loading_state() {
        assert_eq!(Load::<Rc<Catalog>>::default(), Load::Loading);
    }
}
