//! 지표 카탈로그 출력.

use anyhow::Result;
use std::sync::Arc;

use econ_core::{Category, MetricCatalog, MetricDescriptor};

use super::{truncate, OutputFormat};

/// 카탈로그(또는 한 분류)를 지정 형식 문자열로 만듭니다.
pub fn render_catalog(
    catalog: &MetricCatalog,
    category: Option<Category>,
    format: OutputFormat,
) -> Result<String> {
    let metrics: Vec<Arc<MetricDescriptor>> = match category {
        Some(category) => catalog.by_category(category),
        None => catalog.all().to_vec(),
    };

    match format {
        OutputFormat::Json => {
            let descriptors: Vec<&MetricDescriptor> = metrics.iter().map(|m| m.as_ref()).collect();
            Ok(serde_json::to_string_pretty(&descriptors)?)
        }
        OutputFormat::Table => Ok(format_table(&metrics)),
    }
}

fn format_table(metrics: &[Arc<MetricDescriptor>]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<24} {:<28} {:<16} {:<10} {:<28}\n",
        "ID", "NAME", "CATEGORY", "FREQUENCY", "SOURCE"
    ));
    output.push_str(&"-".repeat(110));
    output.push('\n');

    for metric in metrics {
        output.push_str(&format!(
            "{:<24} {:<28} {:<16} {:<10} {:<28}\n",
            metric.id,
            truncate(&metric.name, 28),
            metric.category.display_name(),
            metric.frequency,
            metric.source_label(),
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} metrics", metrics.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_category_table() {
        let catalog = MetricCatalog::standard();
        let table = render_catalog(&catalog, Some(Category::InterestRate), OutputFormat::Table).unwrap();

        assert!(table.contains("fed_funds_rate"));
        assert!(table.contains("FRED: DBAA - DGS10"));
        assert!(!table.contains("real_gdp"));
        assert!(table.ends_with("Total: 3 metrics"));
    }

    #[test]
    fn test_render_json() {
        let catalog = MetricCatalog::standard();
        let json = render_catalog(&catalog, None, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), catalog.len());
        assert_eq!(parsed[0]["id"], "real_gdp");
    }
}
