//! 두 시계열 결합 (비율, 스프레드).

use econ_core::{CombineOp, ObservationPoint};

/// 두 관측치 목록을 날짜 기준 inner join 후 결합합니다.
///
/// 양쪽 모두에 있는 날짜만 남습니다. 한쪽이라도 결측이거나 비율의 분모가 0이면
/// 해당 날짜는 결측으로 남습니다. 입력은 날짜 오름차순이어야 합니다.
pub fn combine(
    op: CombineOp,
    left: &[ObservationPoint],
    right: &[ObservationPoint],
) -> Vec<ObservationPoint> {
    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        let (l, r) = (&left[i], &right[j]);
        match l.date.cmp(&r.date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                let value = match (l.value, r.value) {
                    (Some(a), Some(b)) => op.apply(a, b).filter(|v| v.is_finite()),
                    _ => None,
                };
                out.push(ObservationPoint {
                    date: l.date,
                    value,
                });
                i += 1;
                j += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_ratio_inner_join() {
        let copper = vec![
            ObservationPoint::new(date(1), 4.0),
            ObservationPoint::new(date(4), 4.2),
            ObservationPoint::new(date(5), 4.4),
        ];
        let gold = vec![
            ObservationPoint::new(date(1), 2000.0),
            ObservationPoint::new(date(5), 2200.0),
            ObservationPoint::new(date(6), 2210.0),
        ];

        let ratio = combine(CombineOp::Ratio, &copper, &gold);
        assert_eq!(ratio.len(), 2);
        assert_eq!(ratio[0].date, date(1));
        assert!((ratio[0].value.unwrap() - 0.002).abs() < 1e-12);
        assert!((ratio[1].value.unwrap() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominator_is_missing() {
        let left = vec![ObservationPoint::new(date(1), 1.0)];
        let right = vec![ObservationPoint::new(date(1), 0.0)];
        let ratio = combine(CombineOp::Ratio, &left, &right);
        assert_eq!(ratio, vec![ObservationPoint::missing(date(1))]);
    }

    #[test]
    fn test_spread_keeps_missing_legs() {
        let baa = vec![
            ObservationPoint::new(date(1), 6.1),
            ObservationPoint::missing(date(4)),
        ];
        let treasury = vec![
            ObservationPoint::new(date(1), 4.3),
            ObservationPoint::new(date(4), 4.2),
        ];
        let spread = combine(CombineOp::Spread, &baa, &treasury);
        assert!((spread[0].value.unwrap() - 1.8).abs() < 1e-9);
        assert!(spread[1].is_missing());
    }
}
