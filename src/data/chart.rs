//! Chart rendering.
//!
//! [`ChartRenderer`] is a pure sink: the same [`LineChart`] always produces
//! the same bytes. [`EChartsHtmlRenderer`] emits a standalone HTML page that
//! loads ECharts from a CDN and embeds the chart options as JSON.

use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{AppResult, DaqError};

const ECHARTS_JS: &str = "https://go-echarts.github.io/go-echarts-assets/assets/echarts.min.js";
const THEMES_BASE: &str = "https://go-echarts.github.io/go-echarts-assets/assets/themes";

/// One named y-series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label
    pub name: String,
    /// One value per x-axis point
    pub data: Vec<f64>,
}

impl Series {
    /// Named series over `data`.
    pub fn new(name: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Renderer input: a titled line chart over a categorical x-axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    /// Main title
    pub title: String,
    /// Line under the title
    pub subtitle: String,
    /// Category labels
    pub x_axis: Vec<String>,
    /// Plotted lines
    pub series: Vec<Series>,
}

/// Turns a [`LineChart`] into an artifact.
pub trait ChartRenderer: Send + Sync {
    /// Write the rendered `chart` to `out`.
    fn render(&self, chart: &LineChart, out: &mut dyn Write) -> AppResult<()>;
}

/// Self-contained ECharts page, one smooth line per series with min/max mark lines.
#[derive(Debug, Clone)]
pub struct EChartsHtmlRenderer {
    /// ECharts theme name
    pub theme: String,
    /// CSS width of the chart container
    pub width: String,
    /// CSS height of the chart container
    pub height: String,
}

impl Default for EChartsHtmlRenderer {
    fn default() -> Self {
        Self {
            theme: "westeros".to_string(),
            width: "900px".to_string(),
            height: "500px".to_string(),
        }
    }
}

impl EChartsHtmlRenderer {
    /// ECharts option object for `chart`.
    pub fn options(&self, chart: &LineChart) -> Value {
        let series: Vec<Value> = chart
            .series
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "type": "line",
                    "smooth": true,
                    "data": s.data,
                    "markLine": {
                        "data": [
                            { "name": "Minimum", "type": "min" },
                            { "name": "Maximum", "type": "max" }
                        ]
                    }
                })
            })
            .collect();

        json!({
            "title": { "text": chart.title, "subtext": chart.subtitle },
            "tooltip": { "show": true },
            "legend": { "show": true },
            "xAxis": [{ "data": chart.x_axis }],
            "yAxis": [{}],
            "series": series
        })
    }

    fn chart_id(chart: &LineChart) -> String {
        // FNV-1a over the titles keeps the id stable across runs.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in chart.title.bytes().chain(chart.subtitle.bytes()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        format!("chart{hash:016x}")
    }
}

impl ChartRenderer for EChartsHtmlRenderer {
    fn render(&self, chart: &LineChart, out: &mut dyn Write) -> AppResult<()> {
        let options = serde_json::to_string(&self.options(chart))?
            // Keep the JSON from closing the surrounding <script> element.
            .replace("</", "<\\/");
        let id = Self::chart_id(chart);
        let theme = escape_html(&self.theme);

        write!(
            out,
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <script src="{ECHARTS_JS}"></script>
    <script src="{THEMES_BASE}/{theme}.js"></script>
</head>
<body>
<div class="container">
    <div class="item" id="{id}" style="width:{width};height:{height};"></div>
</div>
<script type="text/javascript">
    "use strict";
    let chart_{id} = echarts.init(document.getElementById('{id}'), "{theme}", {{ renderer: "canvas" }});
    let option_{id} = {options};
    chart_{id}.setOption(option_{id});
</script>
</body>
</html>
"#,
            title = escape_html(&chart.title),
            width = escape_html(&self.width),
            height = escape_html(&self.height),
        )
        .map_err(|e| DaqError::Render(e.to_string()))?;
        Ok(())
    }
}

/// Render `chart` into `path`, replacing any partial file from an earlier attempt.
pub fn write_chart(renderer: &dyn ChartRenderer, chart: &LineChart, path: &Path) -> AppResult<()> {
    let mut buf = Vec::new();
    renderer.render(chart, &mut buf)?;
    fs::write(path, buf)?;
    Ok(())
}

/// Minimal HTML text escaping.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> LineChart {
        LineChart {
            title: "HVAC Daily Chart 0.1.0".to_string(),
            subtitle: "Indoor and Outdoor Temperatures from 2024-03-17_Infinitive.csv".to_string(),
            x_axis: vec!["17.0000".to_string(), "17.0028".to_string()],
            series: vec![
                Series::new("Indoor Temp", vec![72.0, 73.0]),
                Series::new("Outdoor Temp", vec![45.0, 46.0]),
            ],
        }
    }

    fn render(chart: &LineChart) -> String {
        let mut out = Vec::new();
        EChartsHtmlRenderer::default().render(chart, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(&chart()), render(&chart()));
    }

    #[test]
    fn page_embeds_titles_and_series() {
        let html = render(&chart());
        assert!(html.contains("<title>HVAC Daily Chart 0.1.0</title>"));
        assert!(html.contains("westeros"));
        assert!(html.contains("\"Indoor Temp\""));
        assert!(html.contains("\"17.0028\""));
        assert!(html.contains("\"type\":\"max\""));
    }

    #[test]
    fn options_have_one_entry_per_series() {
        let options = EChartsHtmlRenderer::default().options(&chart());
        let series = options["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1]["name"], "Outdoor Temp");
        assert_eq!(series[1]["smooth"], true);
        assert_eq!(options["xAxis"][0]["data"][0], "17.0000");
    }

    #[test]
    fn markup_in_titles_is_escaped() {
        let mut c = chart();
        c.title = "</script><b>".to_string();
        let html = render(&c);
        assert!(html.contains("<title>&lt;/script&gt;&lt;b&gt;</title>"));
        assert!(!html.contains("\"</script>"));
    }

    #[test]
    fn write_chart_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-03-17_Temperature.html");
        write_chart(&EChartsHtmlRenderer::default(), &chart(), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
