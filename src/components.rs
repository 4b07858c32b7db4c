//! Pure Yew view components for the Mortality Atlas UI.
//!
//! These components render from props only. State lives in the pages and
//! the library `Session`; user input is reported through callbacks.

use crate::chart::ramp_colour;
use crate::config::*;
use crate::utils::{
    bar_chart_height, format_rate, label_frequency, nearest_line, padded_max, value_ticks,
    year_at, BandScale, LinearScale, Margin,
};
use mortality_atlas::drilldown::DrilldownPath;
use mortality_atlas::rates::{ChildRate, DiseaseDetails, Level1Rates};
use mortality_atlas::{DiseaseId, DiseaseTree, SelectionState, Sex, Year};
use std::collections::HashSet;
use std::rc::Rc;
use web_sys::{Element, HtmlInputElement};
use yew::prelude::*;

/// Inline "loading" message for a chart region.
pub fn render_loading(message: &str) -> Html {
    html! { <div class="loading-message">{ message }</div> }
}

/// Inline error message; the rest of the page stays usable.
pub fn render_error(message: &str) -> Html {
    html! { <div class="error-message">{ message }</div> }
}

/// Valid response without rows. Not an error.
pub fn render_no_data(message: &str) -> Html {
    html! { <div class="no-data-message">{ message }</div> }
}

#[derive(Properties, PartialEq)]
pub struct SexFilterProps {
    pub selected: Vec<Sex>,
    pub on_change: Callback<Vec<Sex>>,
}

/// Male / female checkboxes. Reports the full set of checked sexes.
#[function_component(SexFilter)]
pub fn sex_filter(props: &SexFilterProps) -> Html {
    let render_box = |sex: Sex| {
        let selected = props.selected.clone();
        let on_change = props.on_change.clone();
        let onchange = Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut checked: Vec<Sex> = selected.iter().copied().filter(|s| *s != sex).collect();
            if input.checked() {
                checked.push(sex);
            }
            on_change.emit(checked);
        });
        let id = format!("{}-checkbox", sex.label().to_lowercase());
        html! {
            <label for={id.clone()}>
                <input type="checkbox"
                    class="sex-checkbox"
                    id={id}
                    data-sex={sex.code().to_string()}
                    checked={props.selected.contains(&sex)}
                    {onchange}
                />
                { sex.label() }
            </label>
        }
    };

    html! {
        <div class="sex-filter">
            { render_box(Sex::Male) }
            { render_box(Sex::Female) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DiseaseTreeProps {
    pub tree: Rc<DiseaseTree>,
    pub selection: SelectionState,
    pub on_toggle: Callback<(DiseaseId, bool)>,
}

/// Collapsible checkbox tree over the disease hierarchy. Every level starts
/// collapsed. Checkbox state always comes from the selection, so a cascade
/// is reflected without touching child inputs.
#[function_component(DiseaseTreeView)]
pub fn disease_tree_view(props: &DiseaseTreeProps) -> Html {
    let expanded = use_state(HashSet::<DiseaseId>::new);

    let toggle_expanded = {
        let expanded = expanded.clone();
        Callback::from(move |id: DiseaseId| {
            let mut next = (*expanded).clone();
            if !next.remove(&id) {
                next.insert(id);
            }
            expanded.set(next);
        })
    };

    fn render_level(
        tree: &DiseaseTree,
        ids: Vec<DiseaseId>,
        checked: &HashSet<DiseaseId>,
        expanded: &HashSet<DiseaseId>,
        on_toggle: &Callback<(DiseaseId, bool)>,
        on_expand: &Callback<DiseaseId>,
    ) -> Html {
        ids.into_iter()
            .filter_map(|id| tree.get(id))
            .map(|info| {
                let id = info.id;
                let is_open = expanded.contains(&id);
                let checkbox_id = format!("disease-{}", id);
                let onchange = {
                    let on_toggle = on_toggle.clone();
                    Callback::from(move |e: Event| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        on_toggle.emit((id, input.checked()));
                    })
                };
                let icon = if !info.has_children() {
                    html! { <span class="toggle-icon">{ "\u{00a0}" }</span> }
                } else {
                    let on_expand = on_expand.clone();
                    let arrow = if is_open { "▼" } else { "▶" };
                    html! {
                        <span class="toggle-icon" onclick={Callback::from(move |_| on_expand.emit(id))}>
                            { arrow }
                        </span>
                    }
                };
                let children = if info.has_children() && is_open {
                    let child_ids = tree.children(id).map(|c| c.id).collect();
                    html! {
                        <div class="disease-children">
                            { render_level(tree, child_ids, checked, expanded, on_toggle, on_expand) }
                        </div>
                    }
                } else {
                    html! {}
                };
                html! {
                    <div class="disease-item" key={id} data-id={id.to_string()}>
                        { icon }
                        <span>
                            <input type="checkbox"
                                class="checkbox"
                                id={checkbox_id.clone()}
                                checked={checked.contains(&id)}
                                {onchange}
                            />
                            <label for={checkbox_id}>{ info.label() }</label>
                        </span>
                        { children }
                    </div>
                }
            })
            .collect::<Html>()
    }

    let checked: HashSet<DiseaseId> = props
        .tree
        .checked_states(&props.selection)
        .into_iter()
        .filter_map(|(id, checked)| checked.then_some(id))
        .collect();
    let roots = props.tree.roots().map(|info| info.id).collect();
    html! {
        <div id="disease-tree">
            { render_level(&props.tree, roots, &checked, &expanded, &props.on_toggle, &toggle_expanded) }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct LegendProps {
    pub min: f64,
    pub max: f64,
}

/// Colour ramp legend of the map.
#[function_component(Legend)]
pub fn legend(props: &LegendProps) -> Html {
    let gradient = format!(
        "background: linear-gradient(to right, {}, {}); width: {}px; height: {}px;",
        ramp_colour(0.0),
        ramp_colour(1.0),
        LEGEND_WIDTH,
        LEGEND_HEIGHT
    );
    html! {
        <div id="legend-container" class="legend">
            <div class="legend-ramp" style={gradient}></div>
            <div class="legend-labels">
                <span class="legend-min">{ format!("Min: {}", format_rate(props.min)) }</span>
                <span class="legend-max">{ format!("Max: {}", format_rate(props.max)) }</span>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct HistoryGraphProps {
    pub points: Vec<(Year, f64)>,
    pub current_year: Option<Year>,
}

/// Small total-rate line shown while hovering a country.
#[function_component(HistoryGraph)]
pub fn history_graph(props: &HistoryGraphProps) -> Html {
    if props.points.is_empty() {
        return html! {};
    }
    let margin = Margin::new(10.0, 40.0, 30.0, 40.0);
    let (inner_w, inner_h) = margin.inner(HISTORY_WIDTH, HISTORY_HEIGHT);
    let first = props.points[0].0;
    let last = props.points[props.points.len() - 1].0;
    let max = props.points.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let x = LinearScale::new((first as f64, last as f64), (0.0, inner_w));
    let y = LinearScale::new((0.0, padded_max(max)), (inner_h, 0.0));

    let path = line_path(props.points.iter().map(|(year, v)| (x.map(*year as f64), y.map(*v))));
    let marker = props.current_year.map(|year| {
        let px = x.map(year as f64);
        html! {
            <line x1={px.to_string()} x2={px.to_string()} y1="0" y2={inner_h.to_string()}
                stroke="#000" stroke-width="1" stroke-dasharray="3,3" opacity="0.5" />
        }
    });

    html! {
        <svg width={HISTORY_WIDTH.to_string()} height={HISTORY_HEIGHT.to_string()}>
            <g transform={format!("translate({},{})", margin.left, margin.top)}>
                { for marker }
                <path d={path} fill="none" stroke="#000" stroke-width="3" />
                <text class="line-graph-axis" x="0" y={(inner_h + 20.0).to_string()}>{ first }</text>
                <text class="line-graph-axis" x={inner_w.to_string()} y={(inner_h + 20.0).to_string()}
                    text-anchor="end">{ last }</text>
                <text class="line-graph-axis" x="-5" y="5" text-anchor="end">
                    { format!("{:.1}", padded_max(max)) }
                </text>
            </g>
        </svg>
    }
}

fn line_path(points: impl Iterator<Item = (f64, f64)>) -> String {
    points
        .enumerate()
        .map(|(i, (x, y))| format!("{}{:.2},{:.2}", if i == 0 { "M" } else { "L" }, x, y))
        .collect::<Vec<_>>()
        .join("")
}

#[derive(Properties, PartialEq)]
pub struct LineChartProps {
    pub rates: Rc<Level1Rates>,
    pub on_year_click: Callback<Year>,
    pub on_point_click: Callback<(DiseaseId, Year)>,
}

/// Pointer position inside the element that received `event`.
fn pointer_in(event: &MouseEvent) -> Option<(f64, f64)> {
    let bounds = event.target_dyn_into::<Element>()?.get_bounding_client_rect();
    Some((
        event.client_x() as f64 - bounds.left(),
        event.client_y() as f64 - bounds.top(),
    ))
}

/// Level-1 cause lines over the years for one country.
///
/// Moving over the plot area shows a crosshair on the nearest year with
/// every line's value. Clicking drills into the line drawn nearest the
/// pointer at that year.
#[function_component(LineChart)]
pub fn line_chart(props: &LineChartProps) -> Html {
    let highlighted = use_state(|| None::<DiseaseId>);
    let hover_year = use_state_eq(|| None::<Year>);

    let years = props.rates.years();
    if props.rates.is_empty() || years.is_empty() {
        return render_no_data("No data available for selected diseases and sexes");
    }

    let margin = Margin::new(40.0, 160.0, 60.0, 80.0);
    let (inner_w, inner_h) = margin.inner(LINE_CHART_WIDTH, LINE_CHART_HEIGHT);
    let x = LinearScale::new(
        (years[0] as f64, years[years.len() - 1] as f64),
        (0.0, inner_w),
    );
    let y_max = padded_max(props.rates.max_total());
    let y = LinearScale::new((0.0, y_max), (inner_h, 0.0));
    let every = label_frequency(years.len());

    let x_ticks = years.iter().enumerate().map(|(i, &year)| {
        let px = x.map(year as f64);
        let onclick = {
            let on_year_click = props.on_year_click.clone();
            Callback::from(move |_| on_year_click.emit(year))
        };
        let label = if i % every == 0 {
            year.to_string()
        } else {
            String::new()
        };
        html! {
            <g class="tick" transform={format!("translate({},{})", px, inner_h)} style="cursor: pointer" {onclick}>
                <line y2="8" stroke="#000" stroke-width="2" />
                <text y="22" text-anchor="middle">{ label }</text>
            </g>
        }
    });

    let y_ticks = value_ticks(y_max, 10).into_iter().map(|v| {
        html! {
            <g class="tick" transform={format!("translate(0,{})", y.map(v))}>
                <line x2="-6" stroke="#000" />
                <text x="-9" dy="0.32em" text-anchor="end">{ format!("{:.0}", v) }</text>
            </g>
        }
    });

    let lines = props.rates.lines.iter().enumerate().map(|(i, line)| {
        let colour = category_colour(i);
        let opacity = match *highlighted {
            Some(id) if id != line.id => "0.2",
            _ => "1",
        };
        let width = if *highlighted == Some(line.id) { "3" } else { "2" };
        let path = line_path(
            line.points
                .iter()
                .map(|(year, v)| (x.map(*year as f64), y.map(*v))),
        );
        let points = line.points.iter().map(|&(year, value)| {
            let r = if *hover_year == Some(year) { "5" } else { "3" };
            html! {
                <circle class={format!("point-{}", year)}
                    cx={x.map(year as f64).to_string()} cy={y.map(value).to_string()} r={r}
                    fill={colour} stroke="#fff" stroke-width="1.5" />
            }
        });
        html! {
            <g class={format!("line disease-{}", line.id)} opacity={opacity}>
                <path d={path} fill="none" stroke={colour} stroke-width={width} />
                { for points }
            </g>
        }
    });

    let crosshair = match *hover_year {
        Some(year) => render_crosshair(&props.rates, year, &x, inner_w, inner_h),
        None => html! {},
    };
    let onmousemove = {
        let hover_year = hover_year.clone();
        let years = years.clone();
        Callback::from(move |e: MouseEvent| {
            if let Some((px, _)) = pointer_in(&e) {
                hover_year.set(year_at(&x, &years, px));
            }
        })
    };
    let onmouseleave = {
        let hover_year = hover_year.clone();
        Callback::from(move |_: MouseEvent| hover_year.set(None))
    };
    let on_overlay_click = {
        let rates = props.rates.clone();
        let on_point_click = props.on_point_click.clone();
        let years = years.clone();
        Callback::from(move |e: MouseEvent| {
            let Some((px, py)) = pointer_in(&e) else {
                return;
            };
            let Some(year) = year_at(&x, &years, px) else {
                return;
            };
            let positions = rates
                .lines
                .iter()
                .filter_map(|line| Some((line.id, y.map(line.value_at(year)?))));
            if let Some(id) = nearest_line(positions, py) {
                on_point_click.emit((id, year));
            }
        })
    };

    let legend = props.rates.lines.iter().enumerate().map(|(i, line)| {
        let id = line.id;
        let onmouseover = {
            let highlighted = highlighted.clone();
            Callback::from(move |_| highlighted.set(Some(id)))
        };
        let onmouseout = {
            let highlighted = highlighted.clone();
            Callback::from(move |_| highlighted.set(None))
        };
        html! {
            <g class={format!("legend-item legend-item-{}", id)}
                transform={format!("translate(0,{})", i * 25)}
                style="cursor: pointer" {onmouseover} {onmouseout}>
                <rect width="15" height="15" fill={category_colour(i)} />
                <text x="20" y="12" style="font-size: 12px">{ &line.name }</text>
            </g>
        }
    });

    html! {
        <svg width={LINE_CHART_WIDTH.to_string()} height={LINE_CHART_HEIGHT.to_string()}>
            <g transform={format!("translate({},{})", margin.left, margin.top)}>
                <g class="x-axis">{ for x_ticks }</g>
                <g class="y-axis">{ for y_ticks }</g>
                <text class="x-axis-label" x={(inner_w / 2.0).to_string()} y={(inner_h + 40.0).to_string()}
                    text-anchor="middle">{ "Year" }</text>
                <text class="y-axis-label" transform="rotate(-90)" x={(-inner_h / 2.0).to_string()} y="-60"
                    text-anchor="middle">{ "Rate per 100,000" }</text>
                <g class="lines-group">{ for lines }</g>
                { crosshair }
                <rect class="overlay" width={inner_w.to_string()} height={inner_h.to_string()}
                    fill="none" pointer-events="all" style="cursor: crosshair"
                    {onmousemove} {onmouseleave} onclick={on_overlay_click} />
                <g class="legend" transform={format!("translate({},10)", inner_w + 10.0)}>{ for legend }</g>
            </g>
        </svg>
    }
}

/// Vertical line at `year` and a box listing each line's value there.
fn render_crosshair(
    rates: &Level1Rates,
    year: Year,
    x: &LinearScale,
    inner_w: f64,
    inner_h: f64,
) -> Html {
    let px = x.map(year as f64);
    let rows: Vec<(usize, &str, f64)> = rates
        .lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| Some((i, line.name.as_str(), line.value_at(year)?)))
        .collect();
    let box_height = 24.0 + rows.len() as f64 * 18.0;
    // keep the box inside the plot
    let box_x = if px + 10.0 + CROSSHAIR_BOX_WIDTH > inner_w {
        px - 10.0 - CROSSHAIR_BOX_WIDTH
    } else {
        px + 10.0
    };
    let items = rows.into_iter().enumerate().map(|(row, (i, name, value))| {
        let top = 36.0 + row as f64 * 18.0;
        html! {
            <g class="tooltip-row">
                <circle cx="10" cy={(top - 4.0).to_string()} r="4" fill={category_colour(i)} />
                <text x="20" y={top.to_string()} style="font-size: 12px">
                    { format!("{}: {}", name, format_rate(value)) }
                </text>
            </g>
        }
    });
    html! {
        <g class="crosshair" pointer-events="none">
            <line x1={px.to_string()} x2={px.to_string()} y1="0" y2={inner_h.to_string()}
                stroke="#999" stroke-width="1" stroke-dasharray="4,4" />
            <g class="tooltip" transform={format!("translate({},10)", box_x)}>
                <rect width={CROSSHAIR_BOX_WIDTH.to_string()} height={box_height.to_string()}
                    fill="#fff" stroke="#ccc" rx="4" opacity="0.95" />
                <text class="tooltip-details" x="10" y="17" style="font-weight: bold">
                    { format!("Year: {}", year) }
                </text>
                { for items }
            </g>
        </g>
    }
}

#[derive(Properties, PartialEq)]
pub struct BarChartProps {
    pub rows: Rc<Vec<ChildRate>>,
    pub selected: Option<DiseaseId>,
    pub on_select: Callback<DiseaseId>,
    pub on_drill: Callback<ChildRate>,
}

/// Horizontal bars of subcause rates. Rows with a zero rate are skipped;
/// `➤` drills into rows that have subcauses of their own.
#[function_component(BarChart)]
pub fn bar_chart(props: &BarChartProps) -> Html {
    if props.rows.iter().all(|row| row.value == 0.0) {
        return render_no_data("No data available for the selected diseases and sexes.");
    }

    let margin = Margin::new(20.0, 120.0, 50.0, 230.0);
    let height = bar_chart_height(props.rows.len(), BAR_ROW_HEIGHT, BAR_CHART_MIN_HEIGHT);
    let (inner_w, inner_h) = margin.inner(BAR_CHART_WIDTH, height);
    let max = props.rows.iter().map(|r| r.value).fold(0.0, f64::max);
    let x = LinearScale::new((0.0, padded_max(max)), (0.0, inner_w));
    let bands = BandScale {
        count: props.rows.len(),
        range: inner_h,
    };

    let rows = props.rows.iter().enumerate().map(|(i, row)| {
        let top = bands.position(i);
        let mid = top + bands.bandwidth() / 2.0 + 4.0;
        let label = html! {
            <text class="y-label" x="-8" y={mid.to_string()} text-anchor="end" font-size="12px">
                { &row.name }
            </text>
        };
        if row.value <= 0.0 {
            return label;
        }

        let width = x.map(row.value);
        let onclick = {
            let on_select = props.on_select.clone();
            let id = row.id;
            Callback::from(move |_| on_select.emit(id))
        };
        let drill = if row.has_children {
            let onclick = {
                let on_drill = props.on_drill.clone();
                let row = row.clone();
                Callback::from(move |e: MouseEvent| {
                    e.stop_propagation();
                    on_drill.emit(row.clone());
                })
            };
            html! {
                <text class="drill-indicator" x={(width + 45.0).to_string()} y={mid.to_string()}
                    fill="#666" style="cursor: pointer" {onclick}>{ "➤" }</text>
            }
        } else {
            html! {}
        };
        let class = if props.selected == Some(row.id) { "bar selected-bar" } else { "bar" };
        html! {
            <g>
                { label }
                <rect class={class} x="0" y={top.to_string()} width={width.to_string()}
                    height={bands.bandwidth().to_string()} fill={category_colour(i)}
                    data-id={row.id.to_string()} style="cursor: pointer" {onclick} />
                <text class="bar-label" x={(width + 5.0).to_string()} y={mid.to_string()}>
                    { format_rate(row.value) }
                </text>
                { drill }
            </g>
        }
    });

    let ticks = value_ticks(padded_max(max), 5).into_iter().map(|v| {
        html! {
            <g class="tick" transform={format!("translate({},{})", x.map(v), inner_h)}>
                <line y2="6" stroke="#000" />
                <text y="18" text-anchor="middle">{ format!("{:.1}", v) }</text>
            </g>
        }
    });

    html! {
        <svg width={BAR_CHART_WIDTH.to_string()} height={height.to_string()}>
            <g transform={format!("translate({},{})", margin.left, margin.top)}>
                { for rows }
                <g class="x-axis">{ for ticks }</g>
                <text class="x-axis-label" x={(inner_w / 2.0).to_string()} y={(inner_h + 40.0).to_string()}
                    text-anchor="middle">{ "Rate per 100,000" }</text>
            </g>
        </svg>
    }
}

#[derive(Properties, PartialEq)]
pub struct DetailsPanelProps {
    pub details: DiseaseDetails,
    pub sexes: Vec<Sex>,
    pub on_close: Callback<()>,
}

#[function_component(DetailsPanel)]
pub fn details_panel(props: &DetailsPanelProps) -> Html {
    let d = &props.details;
    let code = d.cause_code.clone().unwrap_or_else(|| "No code".to_string());
    let on_close = props.on_close.reform(|_: MouseEvent| ());
    html! {
        <div class="disease-details">
            <div class="details-header">
                <h3>{ format!("{} ({})", d.name, code) }</h3>
                <button class="close-details" onclick={on_close}>{ "×" }</button>
            </div>
            <div class="details-section">
                <h4>{ "Disease Information" }</h4>
                <p><strong>{ "Country: " }</strong>{ &d.country_name }</p>
                <p><strong>{ "Year: " }</strong>{ d.year }</p>
                <p><strong>{ "Disease ID: " }</strong>{ d.id }</p>
                <p><strong>{ "Disease Code: " }</strong>
                    { d.cause_code.clone().unwrap_or_else(|| "Not available".to_string()) }</p>
            </div>
            <div class="details-section">
                <h4>{ "Rate Statistics" }</h4>
                <p><strong>{ "Total Rate: " }</strong>{ format!("{} per 100,000", format_rate(d.rates.total)) }</p>
                if props.sexes.contains(&Sex::Male) {
                    <p><strong>{ "Male Rate: " }</strong>{ format!("{} per 100,000", format_rate(d.rates.male)) }</p>
                }
                if props.sexes.contains(&Sex::Female) {
                    <p><strong>{ "Female Rate: " }</strong>{ format!("{} per 100,000", format_rate(d.rates.female)) }</p>
                }
            </div>
            if !d.has_children {
                <div class="details-section">
                    <p>{ "This disease has no further subcategories in the hierarchy." }</p>
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BreadcrumbsProps {
    pub path: DrilldownPath,
    pub on_select: Callback<usize>,
}

#[function_component(Breadcrumbs)]
pub fn breadcrumbs(props: &BreadcrumbsProps) -> Html {
    let last = props.path.crumbs().len().saturating_sub(1);
    let items = props.path.crumbs().iter().enumerate().map(|(index, crumb)| {
        let separator = if index > 0 {
            html! { <span class="breadcrumb-separator">{ " > " }</span> }
        } else {
            html! {}
        };
        let item = if index < last {
            let on_select = props.on_select.clone();
            html! {
                <span class="breadcrumb-item clickable"
                    onclick={Callback::from(move |_| on_select.emit(index))}>{ &crumb.name }</span>
            }
        } else {
            html! { <span class="breadcrumb-item">{ &crumb.name }</span> }
        };
        html! { <>{ separator }{ item }</> }
    });
    html! { <div id="breadcrumb-container">{ for items }</div> }
}
