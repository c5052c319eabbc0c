use anyhow::Result;
use building_data::{AvailabilityMatrix, BandScale, BuildingData, ObservationSeries, Utility};
use serde::Serialize;
use serde_json::{json, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// (count, label, step) for the range selector; `None` count means "all"
const RANGE_BUTTONS: [(Option<u32>, &str, &str); 6] = [
    (Some(1), "1d", "day"),
    (Some(7), "1w", "day"),
    (Some(1), "1m", "month"),
    (Some(6), "6m", "month"),
    (Some(1), "1y", "year"),
    (None, "all", "all"),
];

const AVAILABILITY_HOVER: &str = "<i>Building ID</i>: b%{x}<br><i>Year</i>: %{y}<br><b>Availability</b>: %{text}<extra></extra>";

/// Plotly figure: a list of traces plus a layout
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn load_trace(series: &ObservationSeries, axis: &str) -> Value {
    let x: Vec<String> = series
        .observations
        .iter()
        .map(|o| o.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .collect();
    // Absent readings serialise as null and break the line
    let y: Vec<Option<f64>> = series.observations.iter().map(|o| o.value).collect();

    json!({
        "type": "scatter",
        "mode": "lines",
        "name": series.utility.display_name(),
        "x": x,
        "y": y,
        "connectgaps": false,
        "yaxis": axis,
    })
}

fn range_selector() -> Value {
    let buttons: Vec<Value> = RANGE_BUTTONS
        .iter()
        .map(|(count, label, step)| match count {
            Some(count) => json!({
                "count": count,
                "label": label,
                "step": step,
                "stepmode": "backward",
            }),
            None => json!({ "label": label, "step": step }),
        })
        .collect();

    json!({ "buttons": buttons })
}

/// Equipment load on the left axis, heating load (when present) on the right
pub fn building_figure(data: &BuildingData) -> Figure {
    let mut traces = vec![load_trace(&data.electricity, "y")];
    if let Some(gas) = &data.gas {
        traces.push(load_trace(gas, "y2"));
    }

    let axis_title = |utility: Utility| format!("{} [kWh]", utility.display_name());

    let layout = json!({
        "title": { "text": format!("UCam Building b{}", data.building_id), "x": 0.5 },
        "xaxis": {
            "title": { "text": "Datetime" },
            "rangeslider": { "visible": true },
            "rangeselector": range_selector(),
        },
        "yaxis": {
            "title": { "text": axis_title(Utility::Electricity) },
            "fixedrange": false,
        },
        "yaxis2": {
            "title": { "text": axis_title(Utility::Gas) },
            "overlaying": "y",
            "side": "right",
            "anchor": "x",
            "fixedrange": false,
        },
        "legend": {
            "orientation": "h",
            "yanchor": "bottom",
            "y": 1.02,
            "xanchor": "right",
            "x": 1,
        },
    });

    Figure {
        data: traces,
        layout,
    }
}

/// Discrete heat map of a building × year matrix. Cell colours and the
/// hover text both come from `scale`.
pub fn availability_figure(matrix: &AvailabilityMatrix, scale: &BandScale, title: &str) -> Figure {
    let text: Vec<Vec<&str>> = matrix
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| scale.label_for(*v).unwrap_or("Unknown"))
                .collect()
        })
        .collect();

    let heatmap = json!({
        "type": "heatmap",
        "z": matrix.values,
        "x": matrix.building_ids,
        "y": matrix.years,
        "text": text,
        "hovertemplate": AVAILABILITY_HOVER,
        "colorscale": scale.plotly_colorscale(),
        "zmin": 0.0,
        "zmax": 1.0,
        "colorbar": {
            "tickvals": scale.tick_values(),
            "ticktext": scale.tick_labels(),
        },
    });

    let layout = json!({
        "title": { "text": title },
        "xaxis": {
            "title": { "text": "Building ID" },
            "nticks": matrix.building_ids.len(),
        },
        "yaxis": {
            "title": { "text": "Year" },
            "tickvals": matrix.years,
        },
    });

    Figure {
        data: vec![heatmap],
        layout,
    }
}
