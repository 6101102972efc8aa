//! 분류별 대시보드 요약 출력.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use econ_data::MetricOutcome;

use super::{format_pct, format_value, truncate, OutputFormat};

/// 지표 하나의 요약 행.
#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub metric: String,
    pub name: Option<String>,
    pub latest_date: Option<NaiveDate>,
    pub latest: Option<f64>,
    pub yoy: Option<f64>,
    pub change_pct: Option<f64>,
    pub error: Option<String>,
}

impl From<&MetricOutcome> for SummaryRow {
    fn from(outcome: &MetricOutcome) -> Self {
        match &outcome.result {
            Ok(view) => {
                let latest = view.latest();
                Self {
                    metric: outcome.metric_id.clone(),
                    name: Some(view.descriptor.name.clone()),
                    latest_date: latest.map(|(date, _)| date),
                    latest: latest.map(|(_, value)| value),
                    yoy: view.latest_yoy().map(|(_, value)| value),
                    change_pct: view.change_pct,
                    error: None,
                }
            }
            Err(e) => Self {
                metric: outcome.metric_id.clone(),
                name: None,
                latest_date: None,
                latest: None,
                yoy: None,
                change_pct: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// 일괄 조회 결과를 지정 형식 문자열로 만듭니다.
///
/// 실패한 지표도 행으로 남기며, 전체 실패로 취급하지 않습니다.
pub fn render_summary(outcomes: &[MetricOutcome], format: OutputFormat) -> Result<String> {
    let rows: Vec<SummaryRow> = outcomes.iter().map(SummaryRow::from).collect();

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => Ok(format_table(&rows)),
    }
}

fn format_table(rows: &[SummaryRow]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<24} {:<28} {:<12} {:>12} {:>10} {:>10}\n",
        "ID", "NAME", "DATE", "LATEST", "YOY", "CHANGE"
    ));
    output.push_str(&"-".repeat(101));
    output.push('\n');

    for row in rows {
        if let Some(error) = &row.error {
            output.push_str(&format!("{:<24} ✗ {}\n", row.metric, truncate(error, 74)));
            continue;
        }
        output.push_str(&format!(
            "{:<24} {:<28} {:<12} {:>12} {:>10} {:>10}\n",
            row.metric,
            truncate(row.name.as_deref().unwrap_or("-"), 28),
            row.latest_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_value(row.latest),
            format_pct(row.yoy),
            format_pct(row.change_pct),
        ));
    }

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    output.push('\n');
    output.push_str(&format!("Total: {} metrics, {} failed", rows.len(), failed));
    output
}
