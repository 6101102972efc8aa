//! 파생 지표 계산.

use std::sync::Arc;

use econ_core::{DerivedSeries, ObservationPoint, TimeSeries, TransformKind};

/// 전년 동기 대비 증감률(%)을 계산합니다.
///
/// 각 유효 관측치 `(t, v)`에 대해 `t`의 전년 동기 라벨에 정확히 일치하는 값 `v0`를 찾고,
/// `v0 != 0`이면 `(v - v0) / v0 * 100`을 `t`에 기록합니다. 비교 값이 없거나 0이면
/// `t`는 결과에서 빠집니다. 입력은 정렬이 끝난 시계열이어야 합니다.
pub fn derive_yoy(series: &Arc<TimeSeries>) -> DerivedSeries {
    let frequency = series.frequency();

    let points: Vec<ObservationPoint> = series
        .present()
        .filter_map(|(date, value)| {
            let base = series.value_at(frequency.year_ago(date)?)?;
            if base == 0.0 {
                return None;
            }
            let growth = (value - base) / base * 100.0;
            growth.is_finite().then_some(ObservationPoint::new(date, growth))
        })
        .collect();

    DerivedSeries::new(
        TransformKind::YearOverYear,
        series.clone(),
        series.derive(frequency, points),
    )
}

/// 첫 유효 값 대비 마지막 유효 값의 변화율(%).
///
/// 유효 값이 두 개 미만이거나 첫 값이 0이면 `None`.
pub fn percent_change(series: &TimeSeries) -> Option<f64> {
    let mut present = series.present();
    let (_, first) = present.next()?;
    let (_, last) = present.last()?;

    if first == 0.0 {
        return None;
    }
    let change = (last - first) / first * 100.0;
    change.is_finite().then_some(change)
}
