//! Index of retained charts: a two-column HTML table of links.
//!
//! The index is regenerated from a directory scan every time, never patched.

use chrono::{DateTime, Local};
use std::fs;
use tracing::info;

use super::chart::escape_html;
use super::layout::ArtifactLayout;
use crate::error::AppResult;

const PAGE_TITLE: &str = "HVAC Saved Measurements";

/// Render the index for `names`, in the given order.
///
/// With `table_only` the output is an embeddable `<table>` fragment;
/// otherwise a full page stamped with `generated_at`.
pub fn render_index(names: &[String], table_only: bool, generated_at: DateTime<Local>) -> String {
    let mut html = String::new();
    let stamp = generated_at.format("%Y-%m-%d %H:%M:%S");

    if !table_only {
        html.push_str(&format!("<!-- hvac_daq index: {stamp} -->\n"));
        html.push_str(&format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>{PAGE_TITLE} {stamp}</title>\n</head>\n<body>\n<h2>{PAGE_TITLE} {stamp}</h2>\n"
        ));
    }

    html.push_str("<table width=\"600\" border=\"1\">\n");
    for (i, name) in names.iter().enumerate() {
        if i % 2 == 0 {
            html.push_str("  <tr>\n");
        }
        let name = escape_html(name);
        html.push_str(&format!(
            "    <td><a href=\"{name}\" target=\"_blank\" rel=\"noopener noreferrer\">{name}</a></td>\n"
        ));
        if i % 2 == 1 {
            html.push_str(" </tr>\n");
        }
    }
    if names.len() % 2 == 1 {
        html.push_str(" </tr>\n");
    }
    html.push_str("</table>\n");

    if !table_only {
        html.push_str("</body>\n</html>\n");
    }
    html
}

/// Chart file names currently in the data directory, sorted.
pub fn list_charts(layout: &ArtifactLayout) -> AppResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(layout.data_dir())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if layout.is_chart(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Rescan the data directory and replace the index file.
///
/// Returns the number of linked charts.
pub fn write_index(layout: &ArtifactLayout, table_only: bool, now: DateTime<Local>) -> AppResult<usize> {
    let names = list_charts(layout)?;
    let html = render_index(&names, table_only, now);

    let target = layout.index_path();
    let tmp = target.with_extension("html.tmp");
    fs::write(&tmp, html)?;
    fs::rename(&tmp, &target)?;

    info!(path = %target.display(), charts = names.len(), "index rebuilt");
    Ok(names.len())
}
