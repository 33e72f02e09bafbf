use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use anyhow::{anyhow, Result};

use crate::model::task::parse_calendar_date;

/// Parses a human date relative to the local calendar day.
pub fn parse_human_date(input: &str) -> Result<NaiveDate> {
    parse_human_date_from(input, Local::now().date_naive())
}

/// Same as [`parse_human_date`] with an explicit "today".
pub fn parse_human_date_from(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date"));
    }

    // 1. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "tomorrow" | "tom" => return shift(today, Duration::try_days(1)),
        "eow" => {
            // Upcoming Sunday, today included
            let days_to_sunday = (7 - today.weekday().num_days_from_sunday()) % 7;
            return shift(today, Duration::try_days(days_to_sunday as i64));
        }
        "eom" => return last_day_of_month(today.year(), today.month()),
        _ => {}
    }

    // 2. Relative format (+Nd, +Nw, +Nm)
    if let Some(rest) = input.strip_prefix('+') {
        let unit_len = rest.chars().last().map_or(0, char::len_utf8);
        if rest.len() <= unit_len {
            return Err(anyhow!("Invalid relative format: {}", input));
        }
        let (num_str, unit) = rest.split_at(rest.len() - unit_len);
        let count: i64 = num_str
            .parse()
            .map_err(|_| anyhow!("Invalid relative format: {}", input))?;

        return match unit {
            "d" => shift(today, Duration::try_days(count)),
            "w" => shift(today, Duration::try_weeks(count)),
            "m" => add_months(today, count),
            _ => Err(anyhow!("Unknown unit in relative date: {}", unit)),
        };
    }

    // 3. Calendar date or timestamp
    if let Some(date) = parse_calendar_date(input) {
        return Ok(date);
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target) = parse_weekday_str(day_str) {
            let mut days_needed = target.num_days_from_sunday() as i64
                - today.weekday().num_days_from_sunday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            // 1:fri is the next Friday, 2:fri the one after.
            let days_needed = (count - 1)
                .checked_mul(7)
                .and_then(|extra| extra.checked_add(days_needed));
            return shift(today, days_needed.and_then(Duration::try_days));
        }
    }

    Err(anyhow!("Could not parse date: {}", input))
}

fn shift(date: NaiveDate, delta: Option<Duration>) -> Result<NaiveDate> {
    delta
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| anyhow!("Date out of range"))
}

fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| anyhow!("Date out of range"))
}

/// Calendar month addition, clamped to the last day of the target month.
fn add_months(date: NaiveDate, count: i64) -> Result<NaiveDate> {
    let months = (date.year() as i64 * 12 + (date.month() as i64 - 1))
        .checked_add(count)
        .ok_or_else(|| anyhow!("Date out of range"))?;
    let year = i32::try_from(months.div_euclid(12)).map_err(|_| anyhow!("Date out of range"))?;
    let month = (months.rem_euclid(12) + 1) as u32;

    match NaiveDate::from_ymd_opt(year, month, date.day()) {
        Some(d) => Ok(d),
        None => last_day_of_month(year, month),
    }
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => count.parse::<i64>().ok().filter(|c| *c >= 1).map(|c| (c, day)),
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday
    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_human_date_from("today", anchor()).unwrap(), anchor());
        assert_eq!(parse_human_date_from("tom", anchor()).unwrap(), ymd(2025, 1, 16));
        assert_eq!(parse_human_date_from("eow", anchor()).unwrap(), ymd(2025, 1, 19));
        assert_eq!(parse_human_date_from("eom", anchor()).unwrap(), ymd(2025, 1, 31));
    }

    #[test]
    fn test_relative() {
        assert_eq!(parse_human_date_from("+3d", anchor()).unwrap(), ymd(2025, 1, 18));
        assert_eq!(parse_human_date_from("+2w", anchor()).unwrap(), ymd(2025, 1, 29));
        assert_eq!(parse_human_date_from("+1m", anchor()).unwrap(), ymd(2025, 2, 15));
        assert_eq!(
            parse_human_date_from("+1m", ymd(2025, 1, 31)).unwrap(),
            ymd(2025, 2, 28)
        );
        assert_eq!(parse_human_date_from("+12m", anchor()).unwrap(), ymd(2026, 1, 15));
        assert!(parse_human_date_from("+d", anchor()).is_err());
        assert!(parse_human_date_from("+3y", anchor()).is_err());
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(parse_human_date_from("fri", anchor()).unwrap(), ymd(2025, 1, 17));
        assert_eq!(parse_human_date_from("2:fri", anchor()).unwrap(), ymd(2025, 1, 24));
        // Same weekday means next week
        assert_eq!(parse_human_date_from("wed", anchor()).unwrap(), ymd(2025, 1, 22));
    }

    #[test]
    fn test_absolute_and_invalid() {
        assert_eq!(parse_human_date_from("2025-03-01", anchor()).unwrap(), ymd(2025, 3, 1));
        assert!(parse_human_date_from("someday", anchor()).is_err());
        assert!(parse_human_date_from("", anchor()).is_err());
    }

    #[test]
    fn test_out_of_range_dates_are_errors() {
        assert!(parse_human_date_from("+999999999999d", anchor()).is_err());
        assert!(parse_human_date_from("+99999999w", anchor()).is_err());
        assert!(parse_human_date_from("+9223372036854775807m", anchor()).is_err());
        assert!(parse_human_date_from("+99999999999m", anchor()).is_err());
        assert!(parse_human_date_from("999999999999999:fri", anchor()).is_err());
        assert!(parse_human_date_from("9223372036854775807:fri", anchor()).is_err());
    }

    #[test]
    fn test_parse_weekday_token() {
        assert_eq!(parse_weekday_token("fri"), Some((1, "fri")));
        assert_eq!(parse_weekday_token("2:fri"), Some((2, "fri")));
        assert_eq!(parse_weekday_token("x:fri"), None);
    }
}
