use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::platform::types;

/// Wire shapes of the GitHub REST responses this crate reads.
///
/// Only the fields that are mapped are declared; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct UserRef {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct OrgMembership {
    pub organization: UserRef,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryWire {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub archived: bool,
    pub visibility: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub owner: UserRef,
}

#[derive(Debug, Deserialize)]
pub struct BaseRef {
    #[serde(rename = "ref")]
    pub ref_field: String,
}

#[derive(Debug, Deserialize)]
pub struct PullWire {
    pub number: u64,
    pub title: Option<String>,
    pub user: Option<UserRef>,
    pub base: BaseRef,
    pub draft: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewWire {
    pub user: Option<UserRef>,
    pub state: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RequestedReviewersWire {
    #[serde(default)]
    pub users: Vec<UserRef>,
}

#[derive(Debug, Deserialize)]
pub struct RuleWire {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Option<RuleParametersWire>,
}

#[derive(Debug, Deserialize)]
pub struct RuleParametersWire {
    pub required_approving_review_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BranchWire {
    #[serde(default)]
    pub protected: bool,
    pub protection: Option<ProtectionSummaryWire>,
}

#[derive(Debug, Deserialize)]
pub struct ProtectionSummaryWire {
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ProtectionWire {
    pub required_pull_request_reviews: Option<RequiredReviewsWire>,
}

#[derive(Debug, Deserialize)]
pub struct RequiredReviewsWire {
    pub required_approving_review_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FileWire {
    pub filename: String,
    #[serde(default)]
    pub changes: u64,
}

#[derive(Debug, Deserialize)]
pub struct CommitWire {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct UserWire {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub html_url: String,
    pub avatar_url: String,
}

pub fn map_repository(repo: RepositoryWire) -> types::Repository {
    let visibility = match repo.visibility.as_deref() {
        Some("public") => types::Visibility::Public,
        Some("internal") => types::Visibility::Internal,
        Some("private") => types::Visibility::Private,
        _ if repo.private => types::Visibility::Private,
        _ => types::Visibility::Public,
    };

    types::Repository {
        name: repo.name,
        html_url: repo.html_url,
        archived: repo.archived,
        visibility,
        fork: repo.fork,
        owner: repo.owner.login,
    }
}

pub fn map_pull_request(pr: PullWire) -> types::PullRequest {
    types::PullRequest {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        author: pr
            .user
            .map(|u| u.login)
            .unwrap_or_else(|| "ghost".to_string()),
        base_ref: pr.base.ref_field,
        draft: pr.draft.unwrap_or(false),
        created_at: pr.created_at,
        closed_at: pr.closed_at,
        merged_at: pr.merged_at,
        html_url: pr.html_url,
    }
}

/// Map a review. States this client does not know map to `Unknown`.
pub fn map_review(review: ReviewWire) -> types::ReviewEvent {
    let state = match review.state.as_str() {
        "APPROVED" => types::ReviewState::Approved,
        "COMMENTED" => types::ReviewState::Commented,
        "CHANGES_REQUESTED" => types::ReviewState::ChangesRequested,
        "DISMISSED" => types::ReviewState::Dismissed,
        "PENDING" => types::ReviewState::Pending,
        _ => types::ReviewState::Unknown,
    };

    types::ReviewEvent {
        reviewer: review.user.map(|u| u.login),
        state,
        submitted_at: review.submitted_at,
    }
}

pub fn map_rule(rule: RuleWire) -> types::BranchRule {
    match rule.kind.as_str() {
        "pull_request" => types::BranchRule::PullRequest {
            required_approving_review_count: rule
                .parameters
                .and_then(|p| p.required_approving_review_count),
        },
        "required_status_checks" => types::BranchRule::RequiredStatusChecks,
        _ => types::BranchRule::Other(rule.kind),
    }
}

/// Whether the branch summary reports protection as enabled.
pub fn protection_enabled(branch: &BranchWire) -> bool {
    branch
        .protection
        .as_ref()
        .and_then(|p| p.enabled)
        .unwrap_or(branch.protected)
}

pub fn map_protection(protection: ProtectionWire) -> types::BranchProtection {
    types::BranchProtection {
        enabled: true,
        required_approving_review_count: protection
            .required_pull_request_reviews
            .and_then(|r| r.required_approving_review_count),
    }
}

pub fn map_file(file: FileWire) -> types::PullFile {
    types::PullFile {
        filename: file.filename,
        changes: file.changes,
    }
}

pub fn map_commit(commit: CommitWire) -> types::Commit {
    types::Commit { sha: commit.sha }
}

pub fn map_user(user: UserWire) -> types::UserProfile {
    types::UserProfile {
        login: user.login,
        name: user.name,
        email: user.email.filter(|e| !e.is_empty()),
        html_url: user.html_url,
        avatar_url: user.avatar_url,
    }
}
