//! JavaScript interop for the d3 world map and the Plotly sunburst.
//! Provides Rust bindings to chart helper functions defined in chart_helpers.js.

use mortality_atlas::rates::SunburstNode;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/chart_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = initWorldMap)]
    fn init_world_map_js(
        container_id: &str,
        atlas_url: &str,
        match_country: &Closure<dyn Fn(String) -> Option<u32>>,
        on_click: &Closure<dyn Fn(u32)>,
        on_hover: &Closure<dyn Fn(u32)>,
        on_leave: &Closure<dyn Fn()>,
    );

    #[wasm_bindgen(js_name = colourCountries)]
    fn colour_countries_js(totals: JsValue, max: f64, no_data_fill: &str);

    /// `d3.interpolateYlOrRd` at `fraction`.
    #[wasm_bindgen(js_name = rampColour)]
    pub fn ramp_colour(fraction: f64) -> String;

    #[wasm_bindgen(js_name = drawSunburst)]
    fn draw_sunburst_js(
        container_id: &str,
        ids: JsValue,
        labels: JsValue,
        parents: JsValue,
        values: JsValue,
    );
}

/// Plain JS objects rather than `Map`s, which d3 cannot index.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

/// Callbacks the map hands back to Rust. The map resolves every topology
/// country name through `match_country` once, then reports our location ids.
pub struct MapCallbacks {
    pub match_country: Closure<dyn Fn(String) -> Option<u32>>,
    pub on_click: Closure<dyn Fn(u32)>,
    pub on_hover: Closure<dyn Fn(u32)>,
    pub on_leave: Closure<dyn Fn()>,
}

/// Draw the base map into `container_id`.
pub fn init_world_map(container_id: &str, atlas_url: &str, callbacks: &MapCallbacks) {
    init_world_map_js(
        container_id,
        atlas_url,
        &callbacks.match_country,
        &callbacks.on_click,
        &callbacks.on_hover,
        &callbacks.on_leave,
    );
}

/// Fill every country from its total rate on a `[0, max]` ramp; countries
/// without a rate get `no_data_fill`.
pub fn colour_countries(
    totals: &BTreeMap<String, f64>,
    max: f64,
    no_data_fill: &str,
) -> Result<(), serde_wasm_bindgen::Error> {
    colour_countries_js(to_js(totals)?, max, no_data_fill);
    Ok(())
}

/// Plotly sunburst of a hierarchical rate breakdown.
pub fn draw_sunburst(
    container_id: &str,
    nodes: &[SunburstNode],
) -> Result<(), serde_wasm_bindgen::Error> {
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let labels: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    let parents: Vec<&str> = nodes.iter().map(|n| n.parent.as_str()).collect();
    let values: Vec<f64> = nodes.iter().map(|n| n.value).collect();
    draw_sunburst_js(
        container_id,
        to_js(&ids)?,
        to_js(&labels)?,
        to_js(&parents)?,
        to_js(&values)?,
    );
    Ok(())
}
