//! 주기 정렬 엔진.
//!
//! 서로 다른 주기의 시계열을 공통 보고 달력으로 맞춥니다. 정렬된 모든 날짜는
//! 목표 주기의 기간 라벨입니다 ([`Frequency::period_start`] 참고).
//!
//! - 같은 주기: 날짜를 기간 라벨로 정규화하고 기간당 한 점만 남깁니다.
//! - 저빈도 → 고빈도: 원본 값을 자신의 원본 기간 안에서만 앞으로 채웁니다 (보간 없음).
//! - 고빈도 → 저빈도: 각 목표 기간의 마지막 유효 관측치를 사용합니다 (평균 없음).
//!
//! 원본의 공백은 결측 점으로 전파되며, 첫 관측치 이전의 목표 기간은 만들지 않습니다.

use chrono::NaiveDate;

use econ_core::{Frequency, ObservationPoint, TimeSeries};

/// 시계열을 목표 주기로 정렬합니다.
///
/// 순수 함수이며, 같은 주기로 다시 정렬하면 입력과 동일한 시계열이 나옵니다.
pub fn align(series: &TimeSeries, target: Frequency) -> TimeSeries {
    let source = series.frequency();

    let points = if target > source {
        downsample(series.points(), target)
    } else if target < source {
        upsample(series.points(), source, target, series.range().end())
    } else {
        normalize(series.points(), target)
    };

    series.derive(target, points)
}

/// 기간별로 묶어 마지막 유효 값을 남깁니다. 유효 값이 없는 기간은 결측입니다.
fn normalize(points: &[ObservationPoint], frequency: Frequency) -> Vec<ObservationPoint> {
    let mut out: Vec<ObservationPoint> = Vec::with_capacity(points.len());

    for point in points {
        let label = frequency.period_start(point.date);
        match out.last_mut() {
            Some(last) if last.date == label => {
                if point.value.is_some() {
                    last.value = point.value;
                }
            }
            _ => out.push(ObservationPoint {
                date: label,
                value: point.value,
            }),
        }
    }

    out
}

/// 고빈도 → 저빈도. 사이에 관측치가 전혀 없는 목표 기간은 결측 점으로 채웁니다.
fn downsample(points: &[ObservationPoint], target: Frequency) -> Vec<ObservationPoint> {
    let grouped = normalize(points, target);
    fill_gaps(grouped, target)
}

/// 저빈도 → 고빈도 전방 채우기.
///
/// 원본 값은 자신의 원본 기간 안의 목표 라벨에만 유효합니다. 원본 기간에 관측치가
/// 없거나 결측이면 해당 목표 라벨들도 결측입니다.
fn upsample(
    points: &[ObservationPoint],
    source: Frequency,
    target: Frequency,
    end: NaiveDate,
) -> Vec<ObservationPoint> {
    let periods = fill_gaps(normalize(points, source), source);
    let mut out = Vec::new();

    for period in &periods {
        let period_end = source.period_end(period.date).min(end);

        let mut label = target.period_start(period.date);
        if label < period.date {
            // 이전 원본 기간에서 시작하는 목표 기간 (예: 월초 이전 월요일)
            match target.next_period(label) {
                Some(next) => label = next,
                None => continue,
            }
        }

        while label <= period_end {
            out.push(ObservationPoint {
                date: label,
                value: period.value,
            });
            match target.next_period(label) {
                Some(next) => label = next,
                None => break,
            }
        }
    }

    out
}

/// 기간 라벨 목록의 첫 점과 마지막 점 사이에서 빠진 기간을 결측 점으로 채웁니다.
fn fill_gaps(labelled: Vec<ObservationPoint>, frequency: Frequency) -> Vec<ObservationPoint> {
    let mut out: Vec<ObservationPoint> = Vec::with_capacity(labelled.len());

    for point in labelled {
        if let Some(last) = out.last() {
            let mut next = frequency.next_period(last.date);
            while let Some(date) = next {
                if date >= point.date {
                    break;
                }
                out.push(ObservationPoint::missing(date));
                next = frequency.next_period(date);
            }
        }
        out.push(point);
    }

    out
}
