use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// Whole hours elapsed between `then` and `now`, never negative.
pub fn hours_between(then: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - then).num_hours().max(0) as u64
}

/// Relative age such as "in the last hour", "5 hours ago" or "2 days ago".
pub fn relative_age(hours: u64) -> String {
    if hours < 1 {
        return "in the last hour".to_string();
    }
    if hours < 24 {
        return format!("{hours} {} ago", plural("hour", hours));
    }
    let days = hours / 24;
    format!("{days} {} ago", plural("day", days))
}

pub fn plural(word: &str, count: u64) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Midnight on the first day of the month `months` before `now`.
pub fn months_ago_snapped(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let shifted = now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    NaiveDate::from_ymd_opt(shifted.year(), shifted.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(shifted)
}

/// Join items as "a", "a and b" or "a, b, and c".
pub fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
