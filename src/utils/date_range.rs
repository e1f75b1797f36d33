use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::AppError;

/// 按日期筛选的闭区间：开始日 00:00:00 到结束日 23:59:59.999（UTC）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn from_dates(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, AppError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::field("startDate", "startDate must not be after endDate"));
            }
        }

        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| AppError::Internal("invalid end-of-day time".into()))?;

        Ok(Self {
            start: start_date.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            end: end_date.map(|d| d.and_time(end_of_day).and_utc()),
        })
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.map(|d| d.date_naive())
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end.map(|d| d.date_naive())
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }

    /// 同一区间按日历日比较（用于 DATE 列）
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start.date_naive())
            && self.end.is_none_or(|end| date <= end.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn end_date_is_inclusive_until_end_of_day() {
        let range = DateRange::from_dates(Some(date("2024-01-10")), Some(date("2024-01-15"))).unwrap();
        assert!(range.contains(ts("2024-01-15T23:00:00Z")));
        assert!(range.contains(ts("2024-01-15T23:59:59.999Z")));
        assert!(!range.contains(ts("2024-01-16T00:00:01Z")));
    }

    #[test]
    fn start_date_begins_at_midnight() {
        let range = DateRange::from_dates(Some(date("2024-01-10")), None).unwrap();
        assert!(range.contains(ts("2024-01-10T00:00:00Z")));
        assert!(!range.contains(ts("2024-01-09T23:59:59Z")));
        assert!(range.contains(ts("2030-01-01T00:00:00Z")));
    }

    #[test]
    fn open_range_accepts_everything() {
        let range = DateRange::default();
        assert!(range.contains(ts("1999-12-31T12:00:00Z")));
        assert!(range.contains_date(date("2099-01-01")));
    }

    #[test]
    fn reversed_range_is_a_field_error() {
        let err = DateRange::from_dates(Some(date("2024-02-01")), Some(date("2024-01-01"))).unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.contains_key("startDate")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn calendar_dates_compare_by_day() {
        let range = DateRange::from_dates(Some(date("2024-01-10")), Some(date("2024-01-15"))).unwrap();
        assert!(range.contains_date(date("2024-01-15")));
        assert!(!range.contains_date(date("2024-01-16")));
        assert!(!range.contains_date(date("2024-01-09")));
        assert_eq!(range.end_date(), Some(date("2024-01-15")));
    }
}
