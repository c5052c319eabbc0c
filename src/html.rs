//! Standalone HTML pages around a Plotly figure.

use crate::figures::Figure;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;
use std::process::Command;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_page(title: &str, figure: &Figure) -> Result<String> {
    // A literal "</" inside a JSON string would close the script element
    let figure_json = figure.to_json()?.replace("</", "<\\/");

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="{cdn}"></script>
    <style>
        html, body {{ height: 100%; margin: 0; }}
        #chart {{ width: 100%; height: 100%; }}
    </style>
</head>
<body>
    <div id="chart"></div>
    <script>
        const figure = {figure_json};
        Plotly.newPlot('chart', figure.data, figure.layout, {{ responsive: true }});
    </script>
</body>
</html>
"##,
        title = escape_html(title),
        cdn = PLOTLY_CDN,
        figure_json = figure_json,
    ))
}

/// Write the page, creating parent directories as needed
pub fn write_page(path: &Path, title: &str, figure: &Figure) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let page = render_page(title, figure)?;
    fs::write(path, page).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn opener() -> Command {
    if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    }
}

/// Run an opener on `path` and wait for it to exit. The platform openers
/// hand the file to the browser and return, so this does not block on the
/// browser itself.
fn launch(mut command: Command, path: &Path) -> bool {
    match command.arg(path).status() {
        Ok(status) if status.success() => {
            info!("Opened {}", path.display());
            true
        }
        Ok(status) => {
            warn!("Could not open {} in a browser: opener exited with {}", path.display(), status);
            false
        }
        Err(e) => {
            warn!("Could not open {} in a browser: {}", path.display(), e);
            false
        }
    }
}

/// Hand a written chart to the platform's default browser. Failing to
/// launch one is not an error for the run.
pub fn open_in_browser(path: &Path) {
    launch(opener(), path);
}
