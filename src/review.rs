use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::platform::types::{ReviewEvent, ReviewState};
use crate::redact::redact;
use crate::timeutil::{hours_between, relative_age};

/// The effective review of one reviewer on one pull.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedReview {
    pub login: String,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
    pub relative_age: String,
    pub email: Option<String>,
    pub context: String,
}

/// Approval arithmetic for one pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewVerdict {
    pub approvals: u32,
    pub changes_requested: u32,
    pub required_reviewers: u32,
    pub approvals_remaining: u32,
}

impl ReviewVerdict {
    pub fn new(approvals: u32, changes_requested: u32, required_reviewers: u32) -> Self {
        Self {
            approvals,
            changes_requested,
            required_reviewers,
            approvals_remaining: required_reviewers.saturating_sub(approvals),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub reviews: BTreeMap<String, ResolvedReview>,
    pub verdict: ReviewVerdict,
}

/// Raw review history of a pull and, unless only raw reviews were asked
/// for, the resolved per-reviewer state.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub raw: Vec<ReviewEvent>,
    pub resolution: Option<Resolution>,
}

impl ReviewReport {
    pub fn raw_only(raw: Vec<ReviewEvent>) -> Self {
        Self {
            raw,
            resolution: None,
        }
    }

    pub fn resolved(
        raw: Vec<ReviewEvent>,
        reviews: BTreeMap<String, ResolvedReview>,
        required_reviewers: u32,
    ) -> Self {
        let (approvals, changes_requested) = tally(&reviews);
        Self {
            raw,
            resolution: Some(Resolution {
                reviews,
                verdict: ReviewVerdict::new(approvals, changes_requested, required_reviewers),
            }),
        }
    }

    pub fn verdict(&self) -> Option<&ReviewVerdict> {
        self.resolution.as_ref().map(|r| &r.verdict)
    }

    pub fn reviews(&self) -> impl Iterator<Item = &ResolvedReview> {
        self.resolution.iter().flat_map(|r| r.reviews.values())
    }

    /// Earliest submission across the raw history, whatever its state.
    pub fn first_submitted_at(&self) -> Option<DateTime<Utc>> {
        self.raw.iter().filter_map(|r| r.submitted_at).min()
    }
}

/// Fold review events into one effective review per reviewer.
///
/// Events that are not a verdict (dismissed, pending), events from reviewers
/// whose review is currently re-requested, and events without a reviewer or
/// submission time are ignored. Among the rest the latest submission wins;
/// an event no later than the stored one is discarded, so the outcome does
/// not depend on input order.
pub fn resolve_reviews(
    events: &[ReviewEvent],
    requested_reviewers: &[String],
    now: DateTime<Utc>,
) -> BTreeMap<String, ResolvedReview> {
    let mut reviews: BTreeMap<String, ResolvedReview> = BTreeMap::new();

    for event in events {
        if !event.state.is_verdict() {
            tracing::debug!(state = ?event.state, "Ignoring review that is not a verdict");
            continue;
        }

        let (Some(login), Some(submitted_at)) = (&event.reviewer, event.submitted_at) else {
            tracing::debug!(
                state = ?event.state,
                "Ignoring review without reviewer or submission time"
            );
            continue;
        };

        if requested_reviewers.iter().any(|r| r == login) {
            tracing::debug!(
                reviewer = %redact(login),
                state = ?event.state,
                "Ignoring review from re-requested reviewer"
            );
            continue;
        }

        if let Some(existing) = reviews.get(login) {
            if existing.submitted_at >= submitted_at {
                tracing::debug!(reviewer = %redact(login), "Ignoring superseded review");
                continue;
            }
        }

        reviews.insert(
            login.clone(),
            ResolvedReview {
                login: login.clone(),
                state: event.state,
                submitted_at,
                relative_age: relative_age(hours_between(submitted_at, now)),
                email: None,
                context: event.state.context().to_string(),
            },
        );
    }

    reviews
}

/// Count approvals and change requests among resolved reviews.
pub fn tally(reviews: &BTreeMap<String, ResolvedReview>) -> (u32, u32) {
    reviews
        .values()
        .fold((0, 0), |(approvals, changes), review| match review.state {
            ReviewState::Approved => (approvals + 1, changes),
            ReviewState::ChangesRequested => (approvals, changes + 1),
            _ => (approvals, changes),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::review;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn hours_ago(hours: i64) -> DateTime<Utc> {
        now() - Duration::hours(hours)
    }

    #[test]
    fn test_latest_review_wins_regardless_of_order() {
        let older = review("alice", ReviewState::ChangesRequested, hours_ago(10));
        let newer = review("alice", ReviewState::Approved, hours_ago(2));

        for events in [
            vec![older.clone(), newer.clone()],
            vec![newer.clone(), older.clone()],
        ] {
            let reviews = resolve_reviews(&events, &[], now());
            let alice = &reviews["alice"];
            assert_eq!(alice.state, ReviewState::Approved);
            assert_eq!(alice.submitted_at, hours_ago(2));
            assert_eq!(alice.relative_age, "2 hours ago");
            assert_eq!(alice.context, "approved this");
        }
    }

    #[test]
    fn test_equal_timestamp_keeps_first() {
        let events = vec![
            review("alice", ReviewState::Commented, hours_ago(1)),
            review("alice", ReviewState::Approved, hours_ago(1)),
        ];
        let reviews = resolve_reviews(&events, &[], now());
        assert_eq!(reviews["alice"].state, ReviewState::Commented);
    }

    #[test]
    fn test_requested_reviewer_reviews_are_invalidated() {
        let events = vec![
            review("alice", ReviewState::Approved, hours_ago(5)),
            review("bob", ReviewState::Approved, hours_ago(4)),
        ];
        let reviews = resolve_reviews(&events, &["alice".to_string()], now());

        assert!(!reviews.contains_key("alice"));
        assert!(reviews.contains_key("bob"));
    }

    #[test]
    fn test_non_verdict_states_are_excluded() {
        let events = vec![
            review("alice", ReviewState::Dismissed, hours_ago(1)),
            review("bob", ReviewState::Pending, hours_ago(1)),
            review("carol", ReviewState::Commented, hours_ago(1)),
            review("erin", ReviewState::Unknown, hours_ago(1)),
        ];
        let reviews = resolve_reviews(&events, &[], now());

        assert_eq!(reviews.len(), 1);
        assert!(reviews.contains_key("carol"));
    }

    #[test]
    fn test_dismissed_newer_review_does_not_override() {
        let events = vec![
            review("alice", ReviewState::Approved, hours_ago(5)),
            review("alice", ReviewState::Dismissed, hours_ago(1)),
        ];
        let reviews = resolve_reviews(&events, &[], now());
        assert_eq!(reviews["alice"].state, ReviewState::Approved);
    }

    #[test]
    fn test_events_without_reviewer_or_time_are_skipped() {
        let events = vec![
            ReviewEvent {
                reviewer: None,
                state: ReviewState::Approved,
                submitted_at: Some(hours_ago(1)),
            },
            ReviewEvent {
                reviewer: Some("alice".to_string()),
                state: ReviewState::Approved,
                submitted_at: None,
            },
        ];
        assert!(resolve_reviews(&events, &[], now()).is_empty());
    }

    #[test]
    fn test_empty_history() {
        let reviews = resolve_reviews(&[], &[], now());
        let report = ReviewReport::resolved(Vec::new(), reviews, 0);
        let verdict = report.verdict().unwrap();
        assert_eq!(verdict.approvals, 0);
        assert_eq!(verdict.approvals_remaining, 0);
    }

    #[test]
    fn test_tally_counts_states() {
        let events = vec![
            review("alice", ReviewState::Approved, hours_ago(3)),
            review("bob", ReviewState::ChangesRequested, hours_ago(3)),
            review("carol", ReviewState::Approved, hours_ago(3)),
            review("dave", ReviewState::Commented, hours_ago(3)),
        ];
        let reviews = resolve_reviews(&events, &[], now());
        assert_eq!(tally(&reviews), (2, 1));
    }

    #[test]
    fn test_approvals_remaining_never_negative() {
        let cases = [(0, 2, 2), (1, 2, 1), (2, 2, 0), (5, 1, 0), (3, 0, 0)];
        for (approvals, required, remaining) in cases {
            let verdict = ReviewVerdict::new(approvals, 0, required);
            assert_eq!(verdict.approvals_remaining, remaining);
        }
    }

    #[test]
    fn test_raw_only_report_has_no_verdict() {
        let raw = vec![
            review("alice", ReviewState::Approved, hours_ago(3)),
            review("bob", ReviewState::Dismissed, hours_ago(7)),
        ];
        let report = ReviewReport::raw_only(raw);

        assert!(report.verdict().is_none());
        assert_eq!(report.reviews().count(), 0);
        assert_eq!(report.first_submitted_at(), Some(hours_ago(7)));
    }
}
