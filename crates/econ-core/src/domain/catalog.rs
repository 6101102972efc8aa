//! 지표 카탈로그.
//!
//! 대시보드에 노출되는 모든 지표와 제공자 바인딩을 등록하는 읽기 전용 레지스트리입니다.
//! 프로세스 시작 시 한 번 생성해서 `Arc`로 공유합니다.

use std::collections::HashMap;
use std::sync::Arc;

use super::metric::{Category, CombineOp, MetricDescriptor, Provider};
use crate::error::{CoreError, CoreResult};
use crate::types::Frequency;

/// 지표 카탈로그.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: HashMap<String, Arc<MetricDescriptor>>,
    /// 등록 순서 (목록 표시용, 조회와는 무관)
    order: Vec<Arc<MetricDescriptor>>,
}

impl MetricCatalog {
    /// 지표 목록으로 카탈로그를 생성합니다. ID가 중복되면 실패합니다.
    pub fn new(descriptors: impl IntoIterator<Item = MetricDescriptor>) -> CoreResult<Self> {
        let mut metrics = HashMap::new();
        let mut order = Vec::new();

        for descriptor in descriptors {
            if descriptor.id.trim().is_empty() {
                return Err(CoreError::Catalog("빈 지표 ID".to_string()));
            }
            let descriptor = Arc::new(descriptor);
            if metrics
                .insert(descriptor.id.clone(), descriptor.clone())
                .is_some()
            {
                return Err(CoreError::Catalog(format!(
                    "중복된 지표 ID: {}",
                    descriptor.id
                )));
            }
            order.push(descriptor);
        }

        Ok(Self { metrics, order })
    }

    /// 기본 대시보드 지표로 구성된 카탈로그.
    ///
    /// 기본 목록의 ID 고유성은 테스트로 보장합니다.
    pub fn standard() -> Self {
        let order: Vec<Arc<MetricDescriptor>> =
            standard_metrics().into_iter().map(Arc::new).collect();
        let metrics = order.iter().map(|m| (m.id.clone(), m.clone())).collect();
        Self { metrics, order }
    }

    /// ID로 지표를 조회합니다.
    pub fn resolve(&self, metric_id: &str) -> CoreResult<Arc<MetricDescriptor>> {
        self.metrics
            .get(metric_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownMetric(metric_id.to_string()))
    }

    pub fn contains(&self, metric_id: &str) -> bool {
        self.metrics.contains_key(metric_id)
    }

    /// 등록된 모든 지표.
    pub fn all(&self) -> &[Arc<MetricDescriptor>] {
        &self.order
    }

    /// 분류별 지표 목록.
    pub fn by_category(&self, category: Category) -> Vec<Arc<MetricDescriptor>> {
        self.order
            .iter()
            .filter(|m| m.category == category)
            .cloned()
            .collect()
    }

    /// 지표가 하나 이상 등록된 분류 (표시 순서).
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.order.iter().any(|m| m.category == *c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn fred(
    id: &str,
    name: &str,
    category: Category,
    series_id: &str,
    frequency: Frequency,
    description: &str,
) -> MetricDescriptor {
    MetricDescriptor::new(id, name, category, Provider::Fred, series_id, frequency)
        .with_description(description)
}

fn yahoo(id: &str, name: &str, category: Category, ticker: &str, description: &str) -> MetricDescriptor {
    MetricDescriptor::new(id, name, category, Provider::YahooFinance, ticker, Frequency::Daily)
        .with_description(description)
}

/// 기본 지표 정의.
fn standard_metrics() -> Vec<MetricDescriptor> {
    use Category::*;
    use Frequency::*;

    vec![
        // 소비
        fred(
            "real_gdp",
            "Real GDP",
            Consumption,
            "GDPC1",
            Quarterly,
            "Inflation-adjusted value of all goods and services produced in the US.",
        ),
        fred(
            "nonfarm_payroll",
            "Non-Farm Payroll",
            Consumption,
            "PAYEMS",
            Monthly,
            "Number of US workers excluding proprietors, private household employees and farm employees.",
        ),
        fred(
            "initial_claims",
            "Initial Jobless Claims",
            Consumption,
            "ICSA",
            Weekly,
            "New jobless claims filed by individuals seeking unemployment benefits.",
        ),
        fred(
            "personal_saving_rate",
            "Personal Saving Rate",
            Consumption,
            "PSAVERT",
            Monthly,
            "Percentage of disposable personal income saved by individuals.",
        ),
        fred(
            "new_home_sales",
            "New Home Sales",
            Consumption,
            "HSN1F",
            Monthly,
            "New single-family houses sold.",
        ),
        fred(
            "vehicle_sales",
            "Total Vehicle Sales",
            Consumption,
            "TOTALSA",
            Monthly,
            "Total light weight vehicles sold.",
        ),
        fred(
            "retail_sales",
            "Retail Sales",
            Consumption,
            "RSXFS",
            Monthly,
            "Total sales for retail trade excluding food services.",
        ),
        // 공급
        fred(
            "manufacturing_pmi",
            "ISM Manufacturing PMI",
            Supply,
            "NAPM",
            Monthly,
            "Survey-based index of manufacturing businesses; above 50 indicates expansion.",
        ),
        fred(
            "services_pmi",
            "ISM Services PMI",
            Supply,
            "NMFCI",
            Monthly,
            "Survey-based index of service sector businesses; above 50 indicates expansion.",
        ),
        fred(
            "building_permits",
            "Building Permits",
            Supply,
            "PERMIT",
            Monthly,
            "New housing units authorized by building permits.",
        ),
        fred(
            "durable_goods_orders",
            "Durable Goods Orders",
            Supply,
            "DGORDER",
            Monthly,
            "New orders for manufactured durable goods.",
        ),
        fred(
            "weekly_economic_index",
            "Weekly Economic Index",
            Supply,
            "WEI",
            Weekly,
            "NY Fed index of real economic activity from high-frequency data.",
        ),
        yahoo(
            "copper_gold_ratio",
            "Copper/Gold Ratio",
            Supply,
            "HG=F",
            "Copper futures over gold futures; a gauge of economic health and inflation expectations.",
        )
        .combined_with(CombineOp::Ratio, "GC=F"),
        yahoo(
            "oil_gold_ratio",
            "Oil/Gold Ratio",
            Supply,
            "CL=F",
            "Crude oil futures over gold futures; an indicator of economic activity and inflation.",
        )
        .combined_with(CombineOp::Ratio, "GC=F"),
        // 금리
        fred(
            "fed_funds_rate",
            "Federal Funds Rate",
            InterestRate,
            "DFF",
            Daily,
            "Overnight rate at which banks lend reserves to each other.",
        ),
        fred(
            "credit_spread",
            "BAA Credit Spread",
            InterestRate,
            "DBAA",
            Daily,
            "Moody's BAA corporate bond yield minus the 10-year Treasury yield.",
        )
        .combined_with(CombineOp::Spread, "DGS10"),
        yahoo(
            "vix",
            "VIX Index",
            InterestRate,
            "^VIX",
            "CBOE volatility index; the market's expectation of 30-day volatility.",
        ),
        // 시장
        yahoo(
            "sp500",
            "S&P 500",
            Market,
            "^GSPC",
            "S&P 500 index level.",
        ),
    ]
}
