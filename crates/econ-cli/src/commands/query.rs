//! 단일 지표 조회 출력.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use econ_core::{Frequency, ObservationPoint, TimeWindow};
use econ_data::MetricView;

use super::{format_pct, format_value, OutputFormat};

/// JSON 출력용 조회 결과.
#[derive(Debug, Serialize)]
pub struct SeriesReport<'a> {
    pub metric: &'a str,
    pub name: &'a str,
    pub source: String,
    pub window: TimeWindow,
    pub resolution: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub change_pct: Option<f64>,
    pub yoy_label: &'static str,
    pub level: &'a [ObservationPoint],
    pub yoy: &'a [ObservationPoint],
}

impl<'a> SeriesReport<'a> {
    pub fn new(view: &'a MetricView) -> Self {
        Self {
            metric: &view.descriptor.id,
            name: &view.descriptor.name,
            source: view.descriptor.source_label(),
            window: view.window,
            resolution: view.resolution,
            start: view.range.start(),
            end: view.range.end(),
            change_pct: view.change_pct,
            yoy_label: view.derived.kind().label(),
            level: view.level.points(),
            yoy: view.derived.points(),
        }
    }
}

/// 조회 결과를 지정 형식 문자열로 만듭니다.
pub fn render_view(view: &MetricView, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&SeriesReport::new(view))?),
        OutputFormat::Table => Ok(format_table(view)),
    }
}

fn format_table(view: &MetricView) -> String {
    let descriptor = &view.descriptor;
    let mut output = String::new();

    output.push_str(&format!("{} ({})\n", descriptor.name, descriptor.source_label()));
    if !descriptor.description.is_empty() {
        output.push_str(&format!("{}\n", descriptor.description));
    }
    output.push_str(&format!(
        "Window: {} ({}) | Resolution: {} | Change: {}\n\n",
        view.window,
        view.range,
        view.resolution,
        format_pct(view.change_pct)
    ));

    output.push_str(&format!(
        "{:<12} {:>14} {:>14}\n",
        "DATE",
        "LEVEL",
        view.derived.kind().label()
    ));
    output.push_str(&"-".repeat(42));
    output.push('\n');

    for point in view.level.points() {
        output.push_str(&format!(
            "{:<12} {:>14} {:>14}\n",
            point.date,
            format_value(point.value),
            format_pct(view.derived.value_at(point.date))
        ));
    }

    output.push('\n');
    output.push_str(&format!(
        "Points: {} (missing {})",
        view.level.len(),
        view.level.missing_count()
    ));
    output
}
