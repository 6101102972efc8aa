//! 조회 기간 타입.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 양 끝을 포함하는 달력 날짜 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 구간 생성. `start > end`이면 `None`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 날짜가 구간 안에 있는지 확인합니다.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 시작일을 주어진 개월 수만큼 앞당긴 구간.
    ///
    /// YoY 계산용 비교 구간을 함께 가져올 때 사용합니다.
    pub fn extend_back_months(&self, months: u32) -> Self {
        let start = self
            .start
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: self.end,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// 대시보드 조회 창.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    /// 최근 1년
    #[serde(rename = "1y")]
    OneYear,
    /// 최근 2년
    #[serde(rename = "2y")]
    TwoYears,
    /// 최근 5년
    #[serde(rename = "5y")]
    FiveYears,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [TimeWindow::OneYear, TimeWindow::TwoYears, TimeWindow::FiveYears];

    /// 창 길이 (년).
    pub fn years(&self) -> u32 {
        match self {
            TimeWindow::OneYear => 1,
            TimeWindow::TwoYears => 2,
            TimeWindow::FiveYears => 5,
        }
    }

    /// `today`로 끝나는 구체적인 날짜 구간을 계산합니다.
    pub fn range_ending(&self, today: NaiveDate) -> DateRange {
        let start = today
            .checked_sub_months(Months::new(12 * self.years()))
            .unwrap_or(NaiveDate::MIN);
        DateRange { start, end: today }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::OneYear => "1y",
            TimeWindow::TwoYears => "2y",
            TimeWindow::FiveYears => "5y",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1y" | "1" => Ok(TimeWindow::OneYear),
            "2y" | "2" => Ok(TimeWindow::TwoYears),
            "5y" | "5" => Ok(TimeWindow::FiveYears),
            _ => Err(format!("Invalid window: {} (use 1y, 2y, 5y)", s)),
        }
    }
}
