//! The gym's single canonical calendar.
//!
//! Every "today" in the service comes from here and is passed on as an explicit
//! reference date. Stored calendar dates (plan windows, check-ins) are already
//! dates in this calendar; payment timestamps are UTC instants and are mapped
//! into it before any day-level comparison.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Calendar date of a UTC instant.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// UTC instant at which `date` begins.
    ///
    /// When local midnight falls in a DST gap the day starts at the first
    /// local time that exists, which is still on `date`.
    pub fn day_start_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        let step = Duration::minutes(15);

        let mut local = midnight;
        while local.date() == date {
            if let Some(dt) = local.and_local_timezone(self.tz).earliest() {
                return dt.with_timezone(&Utc);
            }
            local += step;
        }

        // The whole day was skipped (zone changed sides of the date line).
        midnight.and_utc()
    }
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn utc_evening_is_next_day_in_kolkata() {
        let cal = Calendar::new(chrono_tz::Asia::Kolkata);
        // 20:00 UTC is 01:30 the next morning in IST
        let instant = Utc.with_ymd_and_hms(2024, 1, 31, 20, 0, 0).unwrap();
        assert_eq!(cal.date_of(instant), date(2024, 2, 1));
    }

    #[test]
    fn day_start_is_local_midnight() {
        let cal = Calendar::new(chrono_tz::Asia::Kolkata);
        let start = cal.day_start_utc(date(2024, 2, 1));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 31, 18, 30, 0).unwrap());
    }

    #[test]
    fn day_start_in_utc_calendar() {
        let cal = Calendar::new(chrono_tz::UTC);
        let start = cal.day_start_utc(date(2024, 6, 15));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn day_start_skips_dst_gap_at_midnight() {
        // Santiago jumps from 00:00 -04 to 01:00 -03 on 2024-09-08
        let cal = Calendar::new(chrono_tz::America::Santiago);
        let start = cal.day_start_utc(date(2024, 9, 8));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
        assert_eq!(cal.date_of(start), date(2024, 9, 8));
        assert_eq!(cal.date_of(start - Duration::seconds(1)), date(2024, 9, 7));
    }

    #[test]
    fn day_start_after_fall_back() {
        // Santiago falls back to 23:00 -04 at 00:00 -03 on 2024-04-07
        let cal = Calendar::new(chrono_tz::America::Santiago);
        let start = cal.day_start_utc(date(2024, 4, 7));
        assert_eq!(cal.date_of(start), date(2024, 4, 7));
        assert_eq!(cal.date_of(start - Duration::seconds(1)), date(2024, 4, 6));
    }

    #[test]
    fn month_and_year_starts() {
        assert_eq!(start_of_month(date(2024, 2, 29)), date(2024, 2, 1));
        assert_eq!(start_of_year(date(2024, 11, 5)), date(2024, 1, 1));
    }
}
