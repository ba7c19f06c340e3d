use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::paginate::Paginator;
use crate::platform::types::{PullRequest, PullState, Repository, UserProfile};
use crate::platform::Platform;
use crate::required::required_reviewers;
use crate::review::{resolve_reviews, ReviewReport};
use crate::session::Session;
use crate::timeutil::{hours_between, months_ago_snapped, relative_age};

/// Files whose changes are generated and left out of a pull's size.
pub const IGNORED_CHANGE_FILENAMES: &[&str] =
    &["package-lock.json", "Cargo.lock", "yarn.lock", "pnpm-lock.yaml"];

/// Months of history kept by default for non-open listings.
pub const DEFAULT_HISTORY_MONTHS: u32 = 6;

/// What to fetch and how to filter it.
#[derive(Debug, Clone)]
pub struct PullQuery {
    pub state: PullState,
    /// Pulls created before this are dropped from non-open listings.
    pub oldest: DateTime<Utc>,
    pub with_drafts: bool,
    pub with_files_and_changes: bool,
    pub with_commits: bool,
    pub with_user: bool,
    pub only_raw_reviews: bool,
    /// Reference instant for ages.
    pub now: DateTime<Utc>,
}

impl PullQuery {
    /// Fully enriched open pulls, as shown in a digest.
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            state: PullState::Open,
            oldest: months_ago_snapped(now, DEFAULT_HISTORY_MONTHS),
            with_drafts: false,
            with_files_and_changes: true,
            with_commits: true,
            with_user: true,
            only_raw_reviews: false,
            now,
        }
    }

    /// Open and closed pulls of the last `months` months with raw reviews
    /// only, as used for statistics.
    pub fn history(now: DateTime<Utc>, months: u32) -> Self {
        Self {
            state: PullState::All,
            oldest: months_ago_snapped(now, months),
            with_drafts: false,
            with_files_and_changes: false,
            with_commits: false,
            with_user: false,
            only_raw_reviews: true,
            now,
        }
    }

    pub fn with_drafts(mut self, with_drafts: bool) -> Self {
        self.with_drafts = with_drafts;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilesAndChanges {
    pub files: usize,
    pub changes: u64,
}

/// A pull with everything a digest needs to describe it.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPull {
    pub org: String,
    pub repo: String,
    pub repo_url: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub age: String,
    pub age_in_hours: u64,
    pub files_and_changes: Option<FilesAndChanges>,
    pub commits: Option<usize>,
    pub requested_reviewers: Vec<String>,
    pub review_report: ReviewReport,
    pub user: Option<UserProfile>,
}

impl EnrichedPull {
    /// Identity of the pull across credentials.
    pub fn key(&self) -> (&str, &str, u64) {
        (&self.org, &self.repo, self.number)
    }
}

impl Session {
    /// Enriched pulls of `repositories`, in repository then listing order.
    ///
    /// A failure to list a repository's pulls aborts the call. A failure while
    /// enriching one pull is logged and only that pull is skipped.
    pub async fn get_pulls(
        &mut self,
        repositories: &[Repository],
        query: &PullQuery,
    ) -> Result<Vec<EnrichedPull>> {
        if query.state == PullState::Open {
            tracing::info!(org = %self.org, state = %query.state, "Getting pulls");
        } else {
            tracing::info!(
                org = %self.org,
                state = %query.state,
                oldest = %query.oldest,
                "Getting pulls newer than cutoff"
            );
        }

        let mut enriched = Vec::new();
        for repo in repositories {
            let pulls = self.list_pulls(repo, query).await?;
            tracing::info!(repo = %repo.name, count = pulls.len(), "Found pulls in repository");

            for pull in pulls {
                if pull.draft && !query.with_drafts {
                    tracing::debug!(repo = %repo.name, pull = pull.number, "Skipping draft pull");
                    continue;
                }

                let number = pull.number;
                match self.enrich(repo, pull, query).await {
                    Ok(pull) => {
                        tracing::debug!(repo = %repo.name, pull = number, "Added pull");
                        enriched.push(pull);
                    }
                    Err(e) => {
                        tracing::warn!(
                            repo = %repo.name,
                            pull = number,
                            error = %e,
                            "Skipping pull that could not be enriched"
                        );
                    }
                }
            }
        }

        Ok(enriched)
    }

    /// Fetch and enrich a single pull, ignoring the draft and age filters.
    pub async fn get_pull(
        &mut self,
        repo: &Repository,
        number: u64,
        query: &PullQuery,
    ) -> Result<EnrichedPull> {
        let pull = self.platform.get_pull(&self.org, &repo.name, number).await?;
        self.enrich(repo, pull, query).await
    }

    async fn list_pulls(&self, repo: &Repository, query: &PullQuery) -> Result<Vec<PullRequest>> {
        let platform = self.platform.as_ref();
        let org = self.org.as_str();
        let name = repo.name.as_str();
        let state = query.state;
        let oldest = query.oldest;

        let pages = Paginator::new(move |cursor| platform.list_pulls(org, name, state, cursor));

        // Open pulls are wanted whatever their age.
        if state == PullState::Open {
            return pages.collect_all().await;
        }

        let pulls = pages
            .collect_until(|page| match page.iter().find(|p| p.created_at < oldest) {
                Some(stale) => {
                    tracing::debug!(
                        repo = name,
                        pull = stale.number,
                        "Stopping pagination at pull older than cutoff"
                    );
                    true
                }
                None => false,
            })
            .await?;

        Ok(pulls
            .into_iter()
            .filter(|p| p.created_at > oldest)
            .collect())
    }

    async fn enrich(
        &mut self,
        repo: &Repository,
        pull: PullRequest,
        query: &PullQuery,
    ) -> Result<EnrichedPull> {
        let handle = Arc::clone(&self.platform);
        let platform = handle.as_ref();
        let org = self.org.clone();
        let org_name = org.as_str();
        let name = repo.name.as_str();
        let number = pull.number;

        tracing::info!(repo = name, pull = number, "Processing pull");

        let age_in_hours = hours_between(pull.created_at, query.now);

        let files_and_changes = if query.with_files_and_changes {
            Some(files_and_changes(platform, org_name, name, number).await?)
        } else {
            None
        };

        let commits = if query.with_commits {
            let commits =
                Paginator::new(move |cursor| platform.list_commits(org_name, name, number, cursor))
                    .collect_all()
                    .await?;
            Some(commits.len())
        } else {
            None
        };

        let requested_reviewers = platform
            .list_requested_reviewers(org_name, name, number)
            .await?;

        let raw =
            Paginator::new(move |cursor| platform.list_reviews(org_name, name, number, cursor))
                .collect_all()
                .await?;

        let review_report = if query.only_raw_reviews {
            ReviewReport::raw_only(raw)
        } else {
            let mut reviews = resolve_reviews(&raw, &requested_reviewers, query.now);
            for review in reviews.values_mut() {
                review.email = self.users.email(platform, &review.login).await?;
            }
            let required = required_reviewers(platform, org_name, name, &pull.base_ref).await;
            ReviewReport::resolved(raw, reviews, required)
        };

        let user = if query.with_user {
            Some(self.users.get_or_fetch(platform, &pull.author).await?)
        } else {
            None
        };

        Ok(EnrichedPull {
            org,
            repo: repo.name.clone(),
            repo_url: repo.html_url.clone(),
            number,
            title: pull.title,
            url: pull.html_url,
            author: pull.author,
            draft: pull.draft,
            created_at: pull.created_at,
            closed_at: pull.closed_at,
            merged_at: pull.merged_at,
            age: relative_age(age_in_hours),
            age_in_hours,
            files_and_changes,
            commits,
            requested_reviewers,
            review_report,
            user,
        })
    }
}

async fn files_and_changes(
    platform: &dyn Platform,
    org: &str,
    repo: &str,
    number: u64,
) -> Result<FilesAndChanges> {
    let files = Paginator::new(move |cursor| platform.list_files(org, repo, number, cursor))
        .collect_all()
        .await?;

    Ok(files
        .iter()
        .filter(|f| !IGNORED_CHANGE_FILENAMES.contains(&f.filename.as_str()))
        .fold(FilesAndChanges::default(), |acc, f| FilesAndChanges {
            files: acc.files + 1,
            changes: acc.changes + f.changes,
        }))
}
