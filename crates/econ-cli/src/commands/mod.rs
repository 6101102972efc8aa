//! CLI 명령어 구현 모듈.

pub mod catalog;
pub mod dashboard;
pub mod query;

use anyhow::Result;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 숫자 표시 (결측은 "-").
pub(crate) fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1_000.0 => format!("{:.0}", v),
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// 증감률 표시 (부호 포함).
pub(crate) fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.2}%", v),
        None => "-".to_string(),
    }
}

/// 문자 단위로 자르기.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("TABLE").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_value(Some(5.333)), "5.33");
        assert_eq!(format_value(Some(158_000.4)), "158000");
        assert_eq!(format_value(None), "-");
        assert_eq!(format_pct(Some(2.5)), "+2.50%");
        assert_eq!(format_pct(Some(-0.25)), "-0.25%");
        assert_eq!(truncate("Personal Saving Rate", 8), "Persona…");
        assert_eq!(truncate("VIX", 8), "VIX");
    }
}
