//! 도메인 모델.
//!
//! - 지표 메타데이터 (`MetricDescriptor`)
//! - 지표 카탈로그 (`MetricCatalog`)

pub mod catalog;
pub mod metric;

pub use catalog::MetricCatalog;
pub use metric::{Category, Combination, CombineOp, MetricDescriptor, Provider};
