//! 지표 메타데이터.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Frequency;

/// 대시보드 지표 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 소비
    Consumption,
    /// 공급
    Supply,
    /// 금리
    InterestRate,
    /// 시장
    Market,
}

impl Category {
    /// 화면 표시 순서.
    pub const ALL: [Category; 4] = [
        Category::Consumption,
        Category::Supply,
        Category::InterestRate,
        Category::Market,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Consumption => "Consumption",
            Category::Supply => "Supply",
            Category::InterestRate => "Interest Rate",
            Category::Market => "Market",
        }
    }

    /// 설정 키로 쓰는 이름.
    pub fn as_key(&self) -> &'static str {
        match self {
            Category::Consumption => "consumption",
            Category::Supply => "supply",
            Category::InterestRate => "interest_rate",
            Category::Market => "market",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_key() == normalized)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// 데이터 제공자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Federal Reserve Economic Data
    #[serde(rename = "fred")]
    Fred,
    /// Yahoo Finance
    #[serde(rename = "yahoo")]
    YahooFinance,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Fred => write!(f, "FRED"),
            Provider::YahooFinance => write!(f, "Yahoo Finance"),
        }
    }
}

/// 두 시계열의 결합 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineOp {
    /// 주 시계열 ÷ 보조 시계열
    Ratio,
    /// 주 시계열 − 보조 시계열
    Spread,
}

impl CombineOp {
    /// 결합 값 계산. 비율의 분모가 0이면 값이 없습니다.
    pub fn apply(&self, left: f64, right: f64) -> Option<f64> {
        match self {
            CombineOp::Ratio if right == 0.0 => None,
            CombineOp::Ratio => Some(left / right),
            CombineOp::Spread => Some(left - right),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CombineOp::Ratio => "/",
            CombineOp::Spread => "-",
        }
    }
}

/// 같은 제공자의 두 번째 시계열과의 결합.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combination {
    pub op: CombineOp,
    /// 보조 시계열의 제공자 고유 식별자
    pub other_native_id: String,
}

/// 대시보드 지표 정의.
///
/// 프로세스 시작 시 카탈로그에서 생성되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// 고유하고 안정적인 지표 ID
    pub id: String,
    /// 표시 이름
    pub name: String,
    /// 지표 설명
    pub description: String,
    pub category: Category,
    pub provider: Provider,
    /// 제공자 고유 식별자 (FRED 시리즈 ID, Yahoo 티커)
    pub native_id: String,
    /// 결합 지표인 경우 보조 시계열
    pub combination: Option<Combination>,
    /// 원본 발표 주기
    pub frequency: Frequency,
}

impl MetricDescriptor {
    /// 단일 시계열 지표.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        provider: Provider,
        native_id: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category,
            provider,
            native_id: native_id.into(),
            combination: None,
            frequency,
        }
    }

    /// 설명을 설정합니다.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// 보조 시계열과의 결합을 설정합니다.
    pub fn combined_with(mut self, op: CombineOp, other_native_id: impl Into<String>) -> Self {
        self.combination = Some(Combination {
            op,
            other_native_id: other_native_id.into(),
        });
        self
    }

    /// 사람이 읽을 수 있는 원천 표기 (예: "FRED: DBAA - DGS10").
    pub fn source_label(&self) -> String {
        match &self.combination {
            Some(c) => format!(
                "{}: {} {} {}",
                self.provider,
                self.native_id,
                c.op.symbol(),
                c.other_native_id
            ),
            None => format!("{}: {}", self.provider, self.native_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_op() {
        assert_eq!(CombineOp::Ratio.apply(4.0, 2.0), Some(2.0));
        assert_eq!(CombineOp::Ratio.apply(4.0, 0.0), None);
        assert_eq!(CombineOp::Spread.apply(5.5, 4.25), Some(1.25));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("interest-rate".parse::<Category>().unwrap(), Category::InterestRate);
        assert_eq!("Market".parse::<Category>().unwrap(), Category::Market);
        assert!("housing".parse::<Category>().is_err());
    }

    #[test]
    fn test_source_label() {
        let spread = MetricDescriptor::new(
            "credit_spread",
            "BAA Credit Spread",
            Category::InterestRate,
            Provider::Fred,
            "DBAA",
            Frequency::Daily,
        )
        .combined_with(CombineOp::Spread, "DGS10");
        assert_eq!(spread.source_label(), "FRED: DBAA - DGS10");
    }
}
