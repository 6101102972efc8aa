//! 공통 타입 정의.

pub mod frequency;
pub mod series;
pub mod window;

pub use frequency::Frequency;
pub use series::{DerivedSeries, ObservationPoint, TimeSeries, TransformKind};
pub use window::{DateRange, TimeWindow};
