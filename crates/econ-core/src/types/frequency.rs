//! 시계열 관측 주기 정의.
//!
//! 각 주기는 자신의 기간을 대표하는 "기간 라벨" 날짜를 가집니다:
//! - 일간: 해당 날짜
//! - 주간: ISO 주의 월요일
//! - 월간: 해당 월의 1일
//! - 분기: 해당 분기 첫 달의 1일
//!
//! FRED가 월간/분기 관측치를 기간 시작일로 표기하는 방식과 동일합니다.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 관측 주기.
///
/// 선언 순서가 곧 기간의 길이 순서입니다 (`Daily < Weekly < Monthly < Quarterly`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// 일간
    Daily,
    /// 주간
    Weekly,
    /// 월간
    Monthly,
    /// 분기
    Quarterly,
}

impl Frequency {
    /// 모든 주기 (짧은 순).
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
    ];

    /// 날짜가 속한 기간의 라벨을 반환합니다.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let offset = date.weekday().num_days_from_monday() as u64;
                date - Days::new(offset)
            }
            Frequency::Monthly => date.with_day(1).unwrap_or(date),
            Frequency::Quarterly => {
                let first_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
            }
        }
    }

    /// 다음 기간의 라벨을 반환합니다.
    ///
    /// `label`은 이미 기간 라벨이어야 합니다. 달력 범위를 벗어나면 `None`.
    pub fn next_period(&self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => label.checked_add_days(Days::new(1)),
            Frequency::Weekly => label.checked_add_days(Days::new(7)),
            Frequency::Monthly => label.checked_add_months(Months::new(1)),
            Frequency::Quarterly => label.checked_add_months(Months::new(3)),
        }
    }

    /// 날짜가 속한 기간의 마지막 날.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        let start = self.period_start(date);
        self.next_period(start)
            .and_then(|next| next.pred_opt())
            .unwrap_or(start)
    }

    /// 전년 동기 비교 시점.
    ///
    /// 주간 라벨은 월요일이므로 12개월 전이 월요일에 떨어지지 않습니다.
    /// 주간은 52주 전 라벨과 비교하고, 나머지는 12개월 전 달력 날짜와 비교합니다.
    pub fn year_ago(&self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => label.checked_sub_days(Days::new(52 * 7)),
            _ => label.checked_sub_months(Months::new(12)),
        }
    }

    /// 설정 파일/CLI에서 쓰는 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Frequency::Daily),
            "weekly" | "w" | "1w" => Ok(Frequency::Weekly),
            "monthly" | "m" | "1m" => Ok(Frequency::Monthly),
            "quarterly" | "q" | "3m" => Ok(Frequency::Quarterly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}
