//! NYSE-like holiday calendar, computed per-year rather than hardcoded per-date so the engine
//! keeps producing a sensible calendar indefinitely past "the present" (spec §9 requires the
//! price series to extend beyond today without bound).

use chrono::{Datelike, NaiveDate, Weekday};

/// The `n`th occurrence of `weekday` in `(year, month)`, 1-indexed.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid month");
    let first_weekday_offset = (7 + weekday.num_days_from_monday()
        - first.weekday().num_days_from_monday())
        % 7;
    first + chrono::Duration::days((first_weekday_offset + 7 * (n - 1)) as i64)
}

/// The last occurrence of `weekday` in `(year, month)`.
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid month");
    let last_day = next_month_first - chrono::Duration::days(1);
    let offset = (7 + last_day.weekday().num_days_from_monday() - weekday.num_days_from_monday())
        % 7;
    last_day - chrono::Duration::days(offset as i64)
}

/// Easter Sunday via the anonymous Gregorian (Meeus/Jones/Butcher) algorithm.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).expect("valid Easter date")
}

/// Observed-date adjustment: a fixed holiday landing on Saturday is observed the preceding
/// Friday; landing on Sunday, the following Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - chrono::Duration::days(1),
        Weekday::Sun => date + chrono::Duration::days(1),
        _ => date,
    }
}

/// True if `date` is an NYSE-observed holiday (market closed all day).
pub fn is_nyse_holiday(date: NaiveDate) -> bool {
    let year = date.year();
    if date.year() < 1970 {
        // No holiday calendar defined before the simulation's epoch; treat as a normal day.
        return false;
    }

    let new_years = observed(NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
    let mlk = nth_weekday(year, 1, Weekday::Mon, 3);
    let washington = nth_weekday(year, 2, Weekday::Mon, 3);
    let good_friday = easter_sunday(year) - chrono::Duration::days(2);
    let memorial_day = last_weekday(year, 5, Weekday::Mon);
    let juneteenth = observed(NaiveDate::from_ymd_opt(year, 6, 19).unwrap());
    let independence_day = observed(NaiveDate::from_ymd_opt(year, 7, 4).unwrap());
    let labor_day = nth_weekday(year, 9, Weekday::Mon, 1);
    let thanksgiving = nth_weekday(year, 11, Weekday::Thu, 4);
    let christmas = observed(NaiveDate::from_ymd_opt(year, 12, 25).unwrap());

    // MLK Day and Juneteenth were not observed by NYSE prior to 1998 / 2022 respectively, but
    // the engine applies the modern calendar uniformly, avoiding a second axis of historical
    // special-casing here.
    [
        new_years,
        mlk,
        washington,
        good_friday,
        memorial_day,
        juneteenth,
        independence_day,
        labor_day,
        thanksgiving,
        christmas,
    ]
    .contains(&date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_christmas() {
        assert!(is_nyse_holiday(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()));
    }

    #[test]
    fn recognises_thanksgiving_fourth_thursday() {
        // 2024-11-28 is the fourth Thursday of November 2024.
        assert!(is_nyse_holiday(NaiveDate::from_ymd_opt(2024, 11, 28).unwrap()));
        assert!(!is_nyse_holiday(NaiveDate::from_ymd_opt(2024, 11, 21).unwrap()));
    }

    #[test]
    fn regular_day_is_not_a_holiday() {
        assert!(!is_nyse_holiday(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }

    #[test]
    fn observed_shift_for_weekend_new_years() {
        // 2022-01-01 is a Saturday; observed Friday 2021-12-31.
        assert!(is_nyse_holiday(NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()));
    }
}
