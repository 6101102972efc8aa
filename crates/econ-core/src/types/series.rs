//! 시계열 데이터 구조체.
//!
//! `TimeSeries`는 생성 후 변경되지 않습니다. 변환은 항상 새 시계열을 만듭니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{DateRange, Frequency};
use crate::domain::MetricDescriptor;

/// 단일 관측치. 값이 없으면(`None`) 결측입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl ObservationPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// 지표 하나의 시계열.
///
/// 날짜 오름차순이며 같은 날짜는 한 번만 나타납니다.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    descriptor: Arc<MetricDescriptor>,
    range: DateRange,
    frequency: Frequency,
    points: Vec<ObservationPoint>,
}

impl TimeSeries {
    /// 관측치 목록으로 시계열을 생성합니다.
    ///
    /// 날짜순으로 정렬하고, 같은 날짜가 여러 번 있으면 마지막 값을 남깁니다.
    /// 단, 마지막 값이 결측이면 같은 날짜의 유효한 값을 우선합니다.
    pub fn new(
        descriptor: Arc<MetricDescriptor>,
        range: DateRange,
        frequency: Frequency,
        mut points: Vec<ObservationPoint>,
    ) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<ObservationPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => {
                    if point.value.is_some() || last.value.is_none() {
                        *last = point;
                    }
                }
                _ => deduped.push(point),
            }
        }

        Self {
            descriptor,
            range,
            frequency,
            points: deduped,
        }
    }

    /// 빈 시계열 (구간 내 데이터 없음).
    pub fn empty(descriptor: Arc<MetricDescriptor>, range: DateRange, frequency: Frequency) -> Self {
        Self {
            descriptor,
            range,
            frequency,
            points: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn metric_id(&self) -> &str {
        &self.descriptor.id
    }

    /// 이 시계열을 만들 때 사용한 조회 구간.
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// 날짜가 표현된 주기.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ObservationPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ObservationPoint> {
        self.points.last()
    }

    /// 정확히 해당 날짜의 관측치.
    pub fn get(&self, date: NaiveDate) -> Option<&ObservationPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| &self.points[idx])
    }

    /// 해당 날짜의 값. 관측치가 없거나 결측이면 `None`.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.get(date).and_then(|p| p.value)
    }

    /// 결측이 아닌 관측치만 순회합니다.
    pub fn present(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().filter_map(|p| p.value.map(|v| (p.date, v)))
    }

    /// 결측 관측치 수.
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_missing()).count()
    }

    /// 같은 지표 정보로 다른 관측치를 가진 새 시계열을 만듭니다.
    pub fn derive(&self, frequency: Frequency, points: Vec<ObservationPoint>) -> Self {
        Self::new(self.descriptor.clone(), self.range, frequency, points)
    }

    /// 기간이 구간과 겹치지 않는 관측치를 잘라낸 새 시계열.
    ///
    /// 라벨은 기간 시작일이므로, 구간 시작일이 기간 중간에 있으면 그 기간의 라벨은
    /// 구간 시작일보다 앞설 수 있습니다.
    pub fn trimmed(&self, range: DateRange) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| p.date <= range.end() && self.frequency.period_end(p.date) >= range.start())
            .copied()
            .collect();

        Self {
            descriptor: self.descriptor.clone(),
            range,
            frequency: self.frequency,
            points,
        }
    }
}

/// 파생 지표 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// 전년 동기 대비 증감률 (%)
    YearOverYear,
}

impl TransformKind {
    /// 차트 보조축 라벨.
    pub fn label(&self) -> &'static str {
        match self {
            TransformKind::YearOverYear => "YoY Growth %",
        }
    }
}

/// 원본 시계열에서 계산된 파생 시계열.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    kind: TransformKind,
    source: Arc<TimeSeries>,
    series: TimeSeries,
}

impl DerivedSeries {
    pub fn new(kind: TransformKind, source: Arc<TimeSeries>, series: TimeSeries) -> Self {
        Self {
            kind,
            source,
            series,
        }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    /// 계산에 사용한 원본 시계열.
    pub fn source(&self) -> &Arc<TimeSeries> {
        &self.source
    }

    /// 파생 값 시계열 (레벨 시계열과 같은 방식으로 다룰 수 있음).
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// 구간 밖의 파생 값을 잘라냅니다. 원본 참조는 유지됩니다.
    pub fn trimmed(&self, range: DateRange) -> Self {
        Self {
            kind: self.kind,
            source: self.source.clone(),
            series: self.series.trimmed(range),
        }
    }
}

impl std::ops::Deref for DerivedSeries {
    type Target = TimeSeries;

    fn deref(&self) -> &Self::Target {
        &self.series
    }
}
