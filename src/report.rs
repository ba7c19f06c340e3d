use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::aggregate::EnrichedPull;

pub const REPORT_TITLE: &str = "Pull Report (Averages)";

/// Durations collected for the pulls created in one month, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthStats {
    pub minutes_until_merged: Vec<i64>,
    pub minutes_until_first_review: Vec<i64>,
}

impl MonthStats {
    pub fn hours_until_merged(&self) -> Option<i64> {
        average_hours(&self.minutes_until_merged)
    }

    pub fn hours_until_first_review(&self) -> Option<i64> {
        average_hours(&self.minutes_until_first_review)
    }

    pub fn total(&self) -> usize {
        self.minutes_until_merged.len()
    }
}

/// Merge statistics of pulls, keyed by the first day of their creation month.
#[derive(Debug, Clone, Default)]
pub struct PullReport {
    pub months: BTreeMap<NaiveDate, MonthStats>,
}

/// Group merged pulls by creation month. Pulls that were never merged are
/// left out, and so are zero-length durations.
pub fn build(pulls: &[EnrichedPull]) -> PullReport {
    let mut report = PullReport::default();

    for pull in pulls {
        let Some(merged_at) = pull.merged_at else {
            continue;
        };
        let Some(month) = month_of(pull.created_at) else {
            continue;
        };

        let stats = report.months.entry(month).or_default();

        let merged = minutes_between(pull.created_at, merged_at);
        if merged > 0 {
            stats.minutes_until_merged.push(merged);
        }

        if let Some(first_review) = pull.review_report.first_submitted_at() {
            let reviewed = minutes_between(pull.created_at, first_review);
            if reviewed > 0 {
                stats.minutes_until_first_review.push(reviewed);
            }
        }
    }

    tracing::debug!(months = report.months.len(), "Built pull report");
    report
}

impl PullReport {
    /// One line per month, oldest first, under a title line.
    pub fn render(&self) -> String {
        let mut out = format!("{REPORT_TITLE}\n");
        for (month, stats) in &self.months {
            let _ = writeln!(
                out,
                "{}:\tHours Until Merged: [{}],\tHours Until First Review: [{}],\tTotal PRs: [{}]",
                month.format("%b %Y"),
                padded(stats.hours_until_merged()),
                padded(stats.hours_until_first_review()),
                stats.total()
            );
        }
        out
    }
}

fn month_of(at: DateTime<Utc>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_minutes()
}

fn average_hours(minutes: &[i64]) -> Option<i64> {
    if minutes.is_empty() {
        return None;
    }
    let total: i64 = minutes.iter().sum();
    Some(total.div_euclid(60 * minutes.len() as i64))
}

fn padded(hours: Option<i64>) -> String {
    match hours {
        Some(hours) => format!("{hours:05}"),
        None => "-----".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::review;
    use crate::platform::types::ReviewState;
    use crate::review::ReviewReport;
    use chrono::{Duration, TimeZone};

    fn merged_pull(
        number: u64,
        created_at: DateTime<Utc>,
        merged_after_minutes: Option<i64>,
        reviews_after_minutes: &[i64],
    ) -> EnrichedPull {
        let raw = reviews_after_minutes
            .iter()
            .map(|m| review("alice", ReviewState::Commented, created_at + Duration::minutes(*m)))
            .collect();
        EnrichedPull {
            org: "acme".to_string(),
            repo: "demo".to_string(),
            repo_url: "https://github.com/acme/demo".to_string(),
            number,
            title: format!("Pull {number}"),
            url: format!("https://github.com/acme/demo/pull/{number}"),
            author: "octocat".to_string(),
            draft: false,
            created_at,
            closed_at: merged_after_minutes.map(|m| created_at + Duration::minutes(m)),
            merged_at: merged_after_minutes.map(|m| created_at + Duration::minutes(m)),
            age: String::new(),
            age_in_hours: 0,
            files_and_changes: None,
            commits: None,
            requested_reviewers: Vec::new(),
            review_report: ReviewReport::raw_only(raw),
            user: None,
        }
    }

    #[test]
    fn test_groups_by_creation_month() {
        let jan = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2026, 2, 3, 9, 0, 0).unwrap();
        let pulls = vec![
            merged_pull(1, feb, Some(120), &[60]),
            merged_pull(2, jan, Some(600), &[90, 30]),
            merged_pull(3, jan, Some(300), &[]),
            merged_pull(4, jan, None, &[10]),
        ];

        let report = build(&pulls);
        assert_eq!(report.months.len(), 2);

        let january = &report.months[&NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()];
        assert_eq!(january.total(), 2);
        // (600 + 300) / 2 minutes is 7.5 hours.
        assert_eq!(january.hours_until_merged(), Some(7));
        assert_eq!(january.minutes_until_first_review, vec![30]);
        assert_eq!(january.hours_until_first_review(), Some(0));
    }

    #[test]
    fn test_render_is_chronological() {
        let dec = Utc.with_ymd_and_hms(2025, 12, 5, 9, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();
        let pulls = vec![
            merged_pull(1, mar, Some(180), &[]),
            merged_pull(2, dec, Some(1500), &[120]),
        ];

        let rendered = build(&pulls).render();
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(
            lines[1],
            "Dec 2025:\tHours Until Merged: [00025],\tHours Until First Review: [00002],\tTotal PRs: [1]"
        );
        assert_eq!(
            lines[2],
            "Mar 2026:\tHours Until Merged: [00003],\tHours Until First Review: [-----],\tTotal PRs: [1]"
        );
    }

    #[test]
    fn test_no_merged_pulls() {
        let created = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();
        let report = build(&[merged_pull(1, created, None, &[5])]);

        assert!(report.months.is_empty());
        assert_eq!(report.render(), format!("{REPORT_TITLE}\n"));
    }
}
