//! The dashboard pages: world map, country detail and disease drill-down.
//!
//! Each page owns a [`Session`](mortality_atlas::Session) seeded from the
//! URL. Fetches are tagged with a ticket when issued and only applied if the
//! session still agrees when they complete.

use crate::chart::{self, MapCallbacks};
use crate::components::*;
use crate::config::*;
use crate::hooks::{spawn_fetch, use_catalog, use_session, Catalog, Latest, Load, SessionHandle};
use crate::navigate;
use crate::utils::format_rate;
use gloo_timers::callback::Interval;
use log::{debug, error, warn};
use mortality_atlas::api::Api;
use mortality_atlas::drilldown::DrilldownPath;
use mortality_atlas::geo::LocationIndex;
use mortality_atlas::playback::Playback;
use mortality_atlas::rates::{
    AllYearsData, ChildRate, CountryHistory, CountryRates, DiseaseDetails, Level1Rates, SexRates,
    Statistics, SunburstNode,
};
use mortality_atlas::route::Route;
use mortality_atlas::{
    defaults, DiseaseId, DiseaseTree, Effect, FetchError, LocationId, SelectionState,
    SessionEvent, Sex, Year,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlInputElement, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};
use yew::prelude::*;

// ──────────────────────────────────────────────────────────────────────────────
// Shared pieces

/// Sex checkboxes and the disease tree, both feeding the page session.
fn render_filters(tree: &Rc<DiseaseTree>, session: &SessionHandle) -> Html {
    let selection = session.borrow().selection().clone();
    let on_sexes = {
        let session = session.clone();
        let tree = tree.clone();
        Callback::from(move |checked: Vec<Sex>| {
            session.dispatch(&tree, SessionEvent::SexToggled { checked });
        })
    };
    let on_toggle = {
        let session = session.clone();
        let tree = tree.clone();
        Callback::from(move |(id, checked): (DiseaseId, bool)| {
            session.dispatch(&tree, SessionEvent::DiseaseToggled { id, checked });
        })
    };
    html! {
        <div class="filters">
            <div class="filter-section">
                <h3>{ "Sex" }</h3>
                <SexFilter selected={selection.sexes().to_vec()} on_change={on_sexes} />
            </div>
            <div class="filter-section">
                <h3>{ "Diseases" }</h3>
                <DiseaseTreeView tree={tree.clone()} selection={selection} on_toggle={on_toggle} />
            </div>
        </div>
    }
}

/// Link button that leaves the page for `route` with the current selection.
fn nav_button(label: &str, id: &str, route: Route, session: &SessionHandle) -> Html {
    let session = session.clone();
    let onclick = Callback::from(move |_| navigate(&route.href(session.borrow().selection())));
    html! { <button id={id.to_string()} class="nav-button" {onclick}>{ label }</button> }
}

fn scroll_into_view(id: &str) {
    let Some(element) = gloo_utils::document().get_element_by_id(id) else {
        warn!("No element #{} to scroll to", id);
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

fn catalog_status(catalog: &Load<Rc<Catalog>>) -> Option<Html> {
    match catalog {
        Load::Ready(_) => None,
        Load::Failed(message) => Some(render_error(message)),
        Load::Loading | Load::NoData => Some(render_loading("Loading data...")),
    }
}

#[derive(Properties, PartialEq)]
pub struct MapPageProps {
    pub selection: SelectionState,
}

// ──────────────────────────────────────────────────────────────────────────────
// Map page

/// Tooltip contents for the hovered country.
#[derive(Debug, Clone, PartialEq)]
struct Hover {
    location: LocationId,
    name: String,
    rates: SexRates,
    history: Option<Vec<(Year, f64)>>,
}

/// Everything the map callbacks, timers and fetch completions share.
#[derive(Clone)]
struct MapContext {
    api: Api,
    tree: Rc<DiseaseTree>,
    locations: Rc<LocationIndex>,
    session: SessionHandle,
    frame: Rc<RefCell<CountryRates>>,
    status: UseStateHandle<Load<Statistics>>,
    hovered: UseStateHandle<Option<Hover>>,
    hover_target: Rc<RefCell<Option<LocationId>>>,
}

impl MapContext {
    fn paint(&self, rates: CountryRates) {
        let max = rates.statistics.domain_max();
        if let Err(err) = chart::colour_countries(&rates.totals(), max, NO_DATA_FILL) {
            error!("Could not colour the map: {:?}", err);
        }
        self.status.set(Load::Ready(rates.statistics));
        *self.frame.borrow_mut() = rates;
    }

    /// Nothing selected: every country gets the no-data fill.
    fn clear(&self) {
        if let Err(err) = chart::colour_countries(&BTreeMap::new(), 0.0, NO_DATA_FILL) {
            error!("Could not clear the map: {:?}", err);
        }
        self.status.set(Load::NoData);
        *self.frame.borrow_mut() = CountryRates::default();
    }

    /// Draw the current year, from the all-years cache when it has the frame.
    fn refresh(&self) {
        let session = self.session.borrow();
        let Some(year) = session.year() else {
            return;
        };
        if session.selection().is_empty() {
            drop(session);
            self.clear();
            return;
        }

        let cached = session
            .cache()
            .all_years
            .get(&session.cache_key(None))
            .and_then(|data| data.frame(year));
        if let Some(frame) = cached {
            drop(session);
            debug!("Drawing {} from the all-years cache", year);
            self.paint(frame);
            return;
        }

        let ticket = session.issue(None, Some(year));
        let url = self.api.all_countries_rates(year, session.selection());
        drop(session);

        let ctx = self.clone();
        spawn_fetch(url, move |result: Result<Value, FetchError>| {
            let effect = ctx
                .session
                .dispatch(&ctx.tree, SessionEvent::FetchCompleted(ticket));
            if effect != Effect::Apply {
                return;
            }
            match result.and_then(CountryRates::from_value) {
                Ok(rates) => ctx.paint(rates),
                Err(err) => {
                    error!("Error fetching rates by country: {}", err);
                    ctx.status
                        .set(Load::Failed(format!("Error loading map data: {}", err)));
                }
            }
        });
    }

    fn hover(&self, location: LocationId) {
        *self.hover_target.borrow_mut() = Some(location);
        let scope = location.to_string();
        let session = self.session.borrow();
        let key = session.cache_key(Some(&scope));
        let history = session
            .cache()
            .country_history
            .get(&key)
            .map(CountryHistory::series);
        let hover = Hover {
            location,
            name: self.locations.name(location).unwrap_or_default().to_string(),
            rates: self.frame.borrow().get(location),
            history: history.clone(),
        };
        self.hovered.set(Some(hover.clone()));
        if history.is_some() || session.selection().is_empty() {
            return;
        }

        let ticket = session.issue(Some(&scope), None);
        let url = self.api.country_history(location, session.selection());
        drop(session);

        let ctx = self.clone();
        spawn_fetch(url, move |result: Result<CountryHistory, FetchError>| {
            let key = ticket.key.clone();
            let effect = ctx
                .session
                .dispatch(&ctx.tree, SessionEvent::FetchCompleted(ticket));
            if effect != Effect::Apply {
                return;
            }
            match result {
                Ok(history) => {
                    let series = history.series();
                    ctx.session
                        .silent()
                        .cache_mut()
                        .country_history
                        .put(key, history);
                    if *ctx.hover_target.borrow() == Some(location) {
                        ctx.hovered.set(Some(Hover {
                            history: Some(series),
                            ..hover
                        }));
                    }
                }
                Err(err) => error!("Error fetching country history: {}", err),
            }
        });
    }

    fn leave(&self) {
        *self.hover_target.borrow_mut() = None;
        self.hovered.set(None);
    }

    fn callbacks(&self) -> MapCallbacks {
        let locations = self.locations.clone();
        let on_click = {
            let session = self.session.clone();
            move |location: LocationId| {
                navigate(&Route::Country { location }.href(session.borrow().selection()))
            }
        };
        let on_hover = {
            let ctx = self.clone();
            move |location: LocationId| ctx.hover(location)
        };
        let on_leave = {
            let ctx = self.clone();
            move || ctx.leave()
        };
        MapCallbacks {
            match_country: Closure::new(move |name: String| locations.match_country(&name)),
            on_click: Closure::new(on_click),
            on_hover: Closure::new(on_hover),
            on_leave: Closure::new(on_leave),
        }
    }
}

/// Start the animation timer. Any previous timer is dropped first, so at
/// most one is ever running.
fn start_animation(
    ctx: &MapContext,
    playback: &Rc<RefCell<Playback>>,
    timer: &Rc<RefCell<Option<Interval>>>,
) {
    timer.borrow_mut().take();
    let rewound = playback.borrow_mut().start();
    if let Some(year) = rewound {
        ctx.session
            .dispatch(&ctx.tree, SessionEvent::YearChanged(year));
    }
    ctx.session.refresh();

    let tick = {
        let ctx = ctx.clone();
        let playback = playback.clone();
        move || {
            let frame = playback.borrow_mut().tick();
            let Some(frame) = frame else {
                return;
            };
            ctx.session
                .dispatch(&ctx.tree, SessionEvent::YearChanged(frame.year));
            if frame.finished {
                // the idle interval stays until the next start, stop or unmount
                debug!("Animation finished at {}", frame.year);
                ctx.session.refresh();
            }
        }
    };
    *timer.borrow_mut() = Some(Interval::new(defaults::ANIMATION_SPEED_MS, tick));
}

fn toggle_play(
    ctx: &MapContext,
    playback: &Rc<RefCell<Playback>>,
    timer: &Rc<RefCell<Option<Interval>>>,
) {
    if !playback.borrow().can_toggle() {
        return;
    }
    if playback.borrow().is_playing() {
        playback.borrow_mut().stop();
        timer.borrow_mut().take();
        ctx.session.refresh();
        return;
    }

    let session = ctx.session.borrow();
    let key = session.cache_key(None);
    if session.selection().is_empty() || session.cache().all_years.contains(&key) {
        drop(session);
        start_animation(ctx, playback, timer);
        return;
    }

    let ticket = session.issue(None, None);
    let url = ctx.api.all_years_data(session.selection());
    drop(session);
    playback.borrow_mut().set_loading(true);
    ctx.session.refresh();

    let ctx = ctx.clone();
    let playback = playback.clone();
    let timer = timer.clone();
    spawn_fetch(url, move |result: Result<AllYearsData, FetchError>| {
        playback.borrow_mut().set_loading(false);
        let key = ticket.key.clone();
        let effect = ctx
            .session
            .dispatch(&ctx.tree, SessionEvent::FetchCompleted(ticket));
        match result {
            Ok(data) if effect == Effect::Apply => {
                ctx.session.silent().cache_mut().all_years.put(key, data);
                start_animation(&ctx, &playback, &timer);
            }
            Ok(_) => ctx.session.refresh(),
            Err(err) => {
                error!("Error loading all years data: {}", err);
                ctx.session.refresh();
            }
        }
    });
}

fn render_tooltip(hover: &Hover, year: Option<Year>, sexes: &[Sex]) -> Html {
    let graph = match &hover.history {
        Some(points) => html! {
            <div class="tooltip-graph">
                <HistoryGraph points={points.clone()} current_year={year} />
            </div>
        },
        None => html! { <div class="tooltip-loading">{ "Loading historical data..." }</div> },
    };
    html! {
        <div class="tooltip" data-id={hover.location.to_string()}>
            <div class="tooltip-title">{ &hover.name }</div>
            { graph }
            <div class="tooltip-details">
                if let Some(year) = year {
                    <div>{ format!("Year: {}", year) }</div>
                }
                <div>{ format!("Total Rate: {}", format_rate(hover.rates.total)) }</div>
                if sexes.contains(&Sex::Male) {
                    <div>{ format!("Male Rate: {}", format_rate(hover.rates.male)) }</div>
                }
                if sexes.contains(&Sex::Female) {
                    <div>{ format!("Female Rate: {}", format_rate(hover.rates.female)) }</div>
                }
            </div>
        </div>
    }
}

/// World map coloured by the total rate of the current year.
#[function_component(MapPage)]
pub fn map_page(props: &MapPageProps) -> Html {
    let api = Api::new(API_BASE);
    let catalog = use_catalog(api.clone());
    let session = use_session(props.selection.clone());
    let status = use_state(|| Load::<Statistics>::Loading);
    let hovered = use_state(|| None::<Hover>);
    let hover_target = use_mut_ref(|| None::<LocationId>);
    let frame = use_mut_ref(CountryRates::default);
    let playback = use_mut_ref(Playback::default);
    let timer = use_mut_ref(|| None::<Interval>);
    let map_callbacks = use_mut_ref(|| None::<MapCallbacks>);

    let ctx = match &catalog {
        Load::Ready(catalog) => Some(MapContext {
            api,
            tree: catalog.tree.clone(),
            locations: catalog.locations.clone(),
            session: session.clone(),
            frame,
            status: status.clone(),
            hovered: hovered.clone(),
            hover_target,
        }),
        _ => None,
    };

    // Draw the base map once the catalog is in
    {
        let ctx = ctx.clone();
        let catalog = catalog.clone();
        let playback = playback.clone();
        use_effect_with(ctx.is_some(), move |_| {
            if let (Some(ctx), Load::Ready(catalog)) = (ctx, catalog) {
                ctx.session.update(|s| s.set_years(catalog.years.clone()));
                let year = ctx.session.borrow().year();
                *playback.borrow_mut() = Playback::new(ctx.session.borrow().years().to_vec(), year);

                let callbacks = ctx.callbacks();
                chart::init_world_map(MAP_CONTAINER_ID, WORLD_ATLAS_URL, &callbacks);
                *map_callbacks.borrow_mut() = Some(callbacks);
            }
            || ()
        });
    }

    // Recolour whenever the selection or the year changes
    {
        let ctx = ctx.clone();
        let (generation, year) = {
            let s = session.borrow();
            (s.generation(), s.year())
        };
        use_effect_with((ctx.is_some(), generation, year), move |_| {
            if let Some(ctx) = ctx {
                ctx.refresh();
            }
            || ()
        });
    }

    // Stop the timer when leaving the page
    {
        let timer = timer.clone();
        use_effect_with((), move |_| move || drop(timer.borrow_mut().take()));
    }

    let Some(ctx) = ctx else {
        return html! {
            <div class="page map-page">
                <div id={MAP_CONTAINER_ID}></div>
                { for catalog_status(&catalog) }
            </div>
        };
    };

    let (years, year, sexes) = {
        let s = session.borrow();
        (s.years().to_vec(), s.year(), s.selection().sexes().to_vec())
    };
    let year_index = year
        .and_then(|y| years.iter().position(|candidate| *candidate == y))
        .unwrap_or(0);

    let on_timeline = {
        let ctx = ctx.clone();
        let playback = playback.clone();
        let years = years.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let Some(&year) = input.value().parse::<usize>().ok().and_then(|i| years.get(i)) else {
                return;
            };
            playback.borrow_mut().seek(year);
            let effect = ctx
                .session
                .dispatch(&ctx.tree, SessionEvent::YearChanged(year));
            debug!("Timeline moved to {}: {:?}", year, effect);
        })
    };

    let on_play = {
        let ctx = ctx.clone();
        let playback = playback.clone();
        let timer = timer.clone();
        Callback::from(move |_| toggle_play(&ctx, &playback, &timer))
    };

    let (loading, label) = {
        let playback = playback.borrow();
        (playback.is_loading(), playback.button_label())
    };

    let legend = match &*status {
        Load::Ready(stats) => html! { <Legend min={stats.min} max={stats.max} /> },
        Load::NoData => html! {
            <>
                <Legend min={0.0} max={0.0} />
                { render_no_data("Select at least one disease to colour the map.") }
            </>
        },
        Load::Failed(message) => render_error(message),
        Load::Loading => render_loading("Loading map data..."),
    };

    html! {
        <div class="page map-page">
            <div class="sidebar">{ render_filters(&ctx.tree, &session) }</div>
            <div class="main-content">
                <div id={MAP_CONTAINER_ID}></div>
                { legend }
                <div class="timeline">
                    <button id="play-button" disabled={loading} onclick={on_play}>
                        if loading {
                            <span class="loader"></span>
                        } else {
                            <span class="play-text">{ label }</span>
                        }
                    </button>
                    <input type="range"
                        id="timeline-slider"
                        min="0"
                        max={years.len().saturating_sub(1).to_string()}
                        value={year_index.to_string()}
                        oninput={on_timeline}
                    />
                    <div id="current-year-display">
                        { year.map(|y| format!("Year: {}", y)).unwrap_or_default() }
                    </div>
                </div>
                if let Some(hover) = &*hovered {
                    { render_tooltip(hover, year, &sexes) }
                }
            </div>
        </div>
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Country page

#[derive(Properties, PartialEq)]
pub struct CountryPageProps {
    pub location: LocationId,
    pub selection: SelectionState,
}

type SunburstState = Option<(Year, Load<Rc<Vec<SunburstNode>>>)>;

/// Level-1 cause trends for one country, with a sunburst per year.
#[function_component(CountryPage)]
pub fn country_page(props: &CountryPageProps) -> Html {
    let api = Api::new(API_BASE);
    let catalog = use_catalog(api.clone());
    let session = use_session(props.selection.clone());
    let rates = use_state(|| Load::<Rc<Level1Rates>>::Loading);
    let sunburst = use_state(|| None as SunburstState);
    let sunburst_year = use_mut_ref(Latest::<Year>::default);
    let location = props.location;
    let generation = session.borrow().generation();

    // A sunburst drawn for the old filters no longer applies
    {
        let sunburst = sunburst.clone();
        let sunburst_year = sunburst_year.clone();
        use_effect_with(generation, move |_| {
            sunburst_year.borrow_mut().reset();
            if sunburst.is_some() {
                sunburst.set(None);
            }
            || ()
        });
    }

    {
        let api = api.clone();
        let session = session.clone();
        let rates = rates.clone();
        let catalog = catalog.clone();
        let ready = matches!(catalog, Load::Ready(_));
        use_effect_with((ready, generation), move |_| {
            if let Load::Ready(catalog) = catalog {
                let tree = catalog.tree.clone();
                let s = session.borrow();
                let ticket = s.issue(Some(&location.to_string()), None);
                let url = api.disease_rates_by_level1(location, s.selection());
                drop(s);
                rates.set(Load::Loading);
                spawn_fetch(url, move |result: Result<Value, FetchError>| {
                    if session.dispatch(&tree, SessionEvent::FetchCompleted(ticket)) != Effect::Apply {
                        return;
                    }
                    match result.and_then(Level1Rates::from_value) {
                        Ok(data) if data.is_empty() => rates.set(Load::NoData),
                        Ok(data) => rates.set(Load::Ready(Rc::new(data))),
                        Err(err) => {
                            error!("Error loading disease data: {}", err);
                            rates.set(Load::Failed("Error loading disease data".to_string()));
                        }
                    }
                });
            }
            || ()
        });
    }

    // Plotly draws into the container once it is in the DOM
    use_effect_with((*sunburst).clone(), |state| {
        if let Some((_, Load::Ready(nodes))) = state {
            match chart::draw_sunburst(SUNBURST_CONTAINER_ID, nodes) {
                Ok(()) => scroll_into_view("sunburst-container"),
                Err(err) => error!("Could not draw the sunburst: {:?}", err),
            }
        }
        || ()
    });

    let on_year_click = {
        let api = api.clone();
        let session = session.clone();
        let sunburst = sunburst.clone();
        Callback::from(move |year: Year| {
            sunburst_year.borrow_mut().begin(year);
            sunburst.set(Some((year, Load::Loading)));
            let s = session.borrow();
            let ticket = s.issue(Some(&location.to_string()), None);
            let url = api.hierarchical_disease_data(year, location, s.selection());
            drop(s);
            let session = session.clone();
            let sunburst = sunburst.clone();
            let sunburst_year = sunburst_year.clone();
            spawn_fetch(url, move |result: Result<Vec<SunburstNode>, FetchError>| {
                if !sunburst_year.borrow().accepts(&year) || !session.borrow().is_current(&ticket) {
                    debug!("Dropping the {} sunburst for an outdated view", year);
                    return;
                }
                let state = match result {
                    Ok(nodes) if nodes.is_empty() => Load::NoData,
                    Ok(nodes) => Load::Ready(Rc::new(nodes)),
                    Err(err) => {
                        error!("Error fetching hierarchical data: {}", err);
                        Load::Failed(format!("Error loading data: {}", err))
                    }
                };
                sunburst.set(Some((year, state)));
            });
        })
    };

    let on_point_click = {
        let session = session.clone();
        Callback::from(move |(disease, year): (DiseaseId, Year)| {
            let route = Route::Drilldown {
                location,
                year,
                disease,
            };
            navigate(&route.href(session.borrow().selection()));
        })
    };

    let Load::Ready(catalog) = &catalog else {
        return html! { <div class="page country-page">{ for catalog_status(&catalog) }</div> };
    };
    let country = catalog
        .locations
        .name(location)
        .unwrap_or("Unknown country")
        .to_string();

    let chart = match &*rates {
        Load::Loading => render_loading("Loading disease data..."),
        Load::NoData => render_no_data("No data available for selected diseases and sexes"),
        Load::Failed(message) => render_error(message),
        Load::Ready(rates) => html! {
            <LineChart rates={rates.clone()} on_year_click={on_year_click} on_point_click={on_point_click} />
        },
    };

    let sunburst_view = match &*sunburst {
        None => html! {},
        Some((_, Load::Loading)) => render_loading("Loading disease hierarchy data..."),
        Some((_, Load::NoData)) => render_no_data("No data available for this selection."),
        Some((_, Load::Failed(message))) => render_error(message),
        Some((year, Load::Ready(_))) => html! {
            <>
                <h3 id="sunburst-title">{ format!("Disease Hierarchy Visualization for {}", year) }</h3>
                <div id={SUNBURST_CONTAINER_ID}></div>
            </>
        },
    };

    html! {
        <div class="page country-page">
            <div class="sidebar">{ render_filters(&catalog.tree, &session) }</div>
            <div class="main-content">
                <div class="page-header">
                    { nav_button("Back to Map", "back-button", Route::Map, &session) }
                    <h2 id="country-title">{ format!("{} Mortality Rates by Disease Category", country) }</h2>
                </div>
                <div id="line-chart-container">{ chart }</div>
                <div id="sunburst-container">{ sunburst_view }</div>
            </div>
        </div>
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Drill-down page

#[derive(Properties, PartialEq)]
pub struct DrilldownPageProps {
    pub location: LocationId,
    pub year: Year,
    pub disease: DiseaseId,
    pub selection: SelectionState,
}

/// Subcause bars of one disease in one country and year.
#[function_component(DrilldownPage)]
pub fn drilldown_page(props: &DrilldownPageProps) -> Html {
    let api = Api::new(API_BASE);
    let catalog = use_catalog(api.clone());
    let session = use_session(props.selection.clone());
    let path = use_state(|| None::<DrilldownPath>);
    let children = use_state(|| Load::<Rc<Vec<ChildRate>>>::Loading);
    let details = use_state(|| None::<Load<DiseaseDetails>>);
    let selected_bar = use_state(|| None::<DiseaseId>);
    let showing = use_mut_ref(Latest::<DiseaseId>::default);
    let details_for = use_mut_ref(Latest::<DiseaseId>::default);
    let (location, year, disease) = (props.location, props.year, props.disease);
    let generation = session.borrow().generation();

    let load_details = {
        let api = api.clone();
        let session = session.clone();
        let details = details.clone();
        let details_for = details_for.clone();
        Callback::from(move |id: DiseaseId| {
            details_for.borrow_mut().begin(id);
            details.set(Some(Load::Loading));
            let s = session.borrow();
            let ticket = s.issue(Some(&id.to_string()), None);
            let url = api.disease_details(id, year, location, s.selection());
            drop(s);
            let session = session.clone();
            let details = details.clone();
            let details_for = details_for.clone();
            spawn_fetch(url, move |result: Result<DiseaseDetails, FetchError>| {
                if !details_for.borrow().accepts(&id) || !session.borrow().is_current(&ticket) {
                    debug!("Dropping details of {} for an outdated view", id);
                    return;
                }
                let state = match result {
                    Ok(found) => Load::Ready(found),
                    Err(FetchError::Lookup(message)) => Load::Failed(message),
                    Err(err) => {
                        error!("Error loading disease details: {}", err);
                        Load::Failed("Error loading disease details. Please try again.".to_string())
                    }
                };
                details.set(Some(state));
            });
        })
    };

    // Root crumb once the disease names are known
    {
        let path = path.clone();
        use_effect_with(catalog.clone(), move |catalog| {
            if let Load::Ready(catalog) = catalog {
                let name = catalog.tree.name_of(disease).unwrap_or("Disease");
                path.set(Some(DrilldownPath::new(disease, name)));
            }
            || ()
        });
    }

    // Children of the current crumb
    {
        let api = api.clone();
        let session = session.clone();
        let children = children.clone();
        let details = details.clone();
        let selected_bar = selected_bar.clone();
        let details_for = details_for.clone();
        let load_details = load_details.clone();
        let current = (*path).as_ref().map(|p| p.current().id);
        use_effect_with((current, generation), move |&(current, _)| {
            if let Some(current) = current {
                showing.borrow_mut().begin(current);
                children.set(Load::Loading);
                details_for.borrow_mut().reset();
                details.set(None);
                selected_bar.set(None);
                let s = session.borrow();
                let ticket = s.issue(Some(&current.to_string()), None);
                let url = api.disease_children(current, year, location, s.selection());
                drop(s);
                spawn_fetch(url, move |result: Result<Vec<ChildRate>, FetchError>| {
                    if !showing.borrow().accepts(&current) || !session.borrow().is_current(&ticket) {
                        debug!("Dropping children of {} for an outdated view", current);
                        return;
                    }
                    match result {
                        Ok(rows) if rows.is_empty() => {
                            children.set(Load::Ready(Rc::new(rows)));
                            load_details.emit(current);
                        }
                        Ok(rows) => children.set(Load::Ready(Rc::new(rows))),
                        Err(err) => {
                            error!("Error loading drilldown data: {}", err);
                            children.set(Load::Failed("Error loading data. Please try again.".to_string()));
                        }
                    }
                });
            }
            || ()
        });
    }

    let Load::Ready(catalog) = &catalog else {
        return html! { <div class="page drilldown-page">{ for catalog_status(&catalog) }</div> };
    };
    let Some(trail) = (*path).clone() else {
        return html! { <div class="page drilldown-page">{ render_loading("Loading data...") }</div> };
    };

    let on_crumb = {
        let path = path.clone();
        let trail = trail.clone();
        Callback::from(move |index: usize| {
            let mut next = trail.clone();
            next.truncate_to(index);
            path.set(Some(next));
        })
    };
    let on_back = {
        let path = path.clone();
        let trail = trail.clone();
        Callback::from(move |_| {
            let mut next = trail.clone();
            if next.back().is_some() {
                path.set(Some(next));
            }
        })
    };
    let on_drill = {
        let path = path.clone();
        let trail = trail.clone();
        Callback::from(move |row: ChildRate| {
            let mut next = trail.clone();
            next.push(row.id, row.name);
            path.set(Some(next));
        })
    };
    let on_select = {
        let selected_bar = selected_bar.clone();
        Callback::from(move |id: DiseaseId| {
            selected_bar.set(Some(id));
            load_details.emit(id);
        })
    };
    let on_close = {
        let details = details.clone();
        let selected_bar = selected_bar.clone();
        Callback::from(move |_: ()| {
            details_for.borrow_mut().reset();
            details.set(None);
            selected_bar.set(None);
        })
    };

    let chart = match &*children {
        Load::Loading => render_loading("Loading data..."),
        Load::NoData => render_no_data("No data available for the selected diseases and sexes."),
        Load::Failed(message) => render_error(message),
        Load::Ready(rows) if rows.is_empty() => html! {},
        Load::Ready(rows) => html! {
            <BarChart rows={rows.clone()} selected={*selected_bar} {on_select} {on_drill} />
        },
    };

    let details_view = match &*details {
        None => html! {},
        Some(Load::Loading) => render_loading("Loading disease details..."),
        Some(Load::Ready(found)) => html! {
            <DetailsPanel details={found.clone()} sexes={session.borrow().selection().sexes().to_vec()} {on_close} />
        },
        Some(Load::Failed(message)) => render_error(message),
        Some(Load::NoData) => render_no_data("No details available."),
    };

    html! {
        <div class="page drilldown-page">
            <div class="sidebar">{ render_filters(&catalog.tree, &session) }</div>
            <div class="main-content">
                <div class="page-header">
                    { nav_button("Back to Country", "back-to-country", Route::Country { location }, &session) }
                    { nav_button("Back to Map", "back-to-map", Route::Map, &session) }
                </div>
                <Breadcrumbs path={trail.clone()} on_select={on_crumb} />
                if trail.can_go_back() {
                    <button id="back-button" onclick={on_back}>{ "← Back" }</button>
                }
                <h2 id="chart-title">{ trail.title(year) }</h2>
                <div id="chart-container">{ chart }</div>
                <div id="details-container">{ details_view }</div>
            </div>
        </div>
    }
}

/// Unknown path: offer the way back to the map.
#[function_component(NotFoundPage)]
pub fn not_found_page(props: &MapPageProps) -> Html {
    let href = Route::Map.href(&props.selection);
    html! {
        <div class="page not-found">
            <h2>{ "Page not found" }</h2>
            <a href={href}>{ "Back to Map" }</a>
        </div>
    }
}
