//! Main module for the Mortality Atlas front end using Yew.
//! Routes the browser location to a page and installs logging.

use log::{error, info, LevelFilter};
use mortality_atlas::logging;
use mortality_atlas::route::Route;
use mortality_atlas::SelectionState;
use yew::prelude::*;

mod chart;
mod components;
mod config;
mod hooks;
mod pages;
mod utils;

use pages::{CountryPage, DrilldownPage, MapPage, NotFoundPage};

/// Leave for `href`. Every page rebuilds its state from the URL.
pub fn navigate(href: &str) {
    info!("Navigating to {}", href);
    if let Err(err) = gloo_utils::window().location().set_href(href) {
        error!("Navigation to {} failed: {:?}", href, err);
    }
}

/// `(pathname, search)` of the current page.
fn current_location() -> (String, String) {
    let location = gloo_utils::window().location();
    (
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default(),
    )
}

#[function_component]
pub fn App() -> Html {
    let (pathname, search) = current_location();
    let selection = SelectionState::from_query(&search);

    match Route::parse(&pathname) {
        Route::Map => html! { <MapPage {selection} /> },
        Route::Country { location } => html! { <CountryPage {location} {selection} /> },
        Route::Drilldown {
            location,
            year,
            disease,
        } => html! { <DrilldownPage {location} {year} {disease} {selection} /> },
        Route::NotFound => html! { <NotFoundPage {selection} /> },
    }
}

/// Entry point: installs the console logger, then renders the App.
fn main() {
    if logging::init(LevelFilter::Debug).is_err() {
        web_sys::console::warn_1(&"A logger was already installed".into());
    }
    yew::Renderer::<App>::new().render();
}
