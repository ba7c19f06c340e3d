use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Continuation token for page-numbered listings.
pub type Cursor = u32;

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryType {
    #[default]
    All,
    Forks,
    Member,
    #[serde(rename = "sources")]
    NonForks,
    Owner,
    Private,
    Public,
}

impl RepositoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryType::All => "all",
            RepositoryType::Forks => "forks",
            RepositoryType::Member => "member",
            RepositoryType::NonForks => "sources",
            RepositoryType::Owner => "owner",
            RepositoryType::Private => "private",
            RepositoryType::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

/// A repository snapshot taken once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    pub archived: bool,
    pub visibility: Visibility,
    pub fork: bool,
    pub owner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
    Closed,
    All,
}

impl PullState {
    pub fn as_str(self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
            PullState::All => "all",
        }
    }
}

impl std::fmt::Display for PullState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request as reported by the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub base_ref: String,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    /// A state this client does not know; never a verdict.
    #[serde(other)]
    Unknown,
}

impl ReviewState {
    /// Whether a review in this state counts towards a pull's verdict.
    pub fn is_verdict(self) -> bool {
        matches!(
            self,
            ReviewState::Approved | ReviewState::ChangesRequested | ReviewState::Commented
        )
    }

    pub fn context(self) -> &'static str {
        match self {
            ReviewState::Approved => "approved this",
            ReviewState::ChangesRequested => "requested changes",
            ReviewState::Commented => "commented on this",
            ReviewState::Dismissed => "had a review dismissed",
            ReviewState::Pending => "has a pending review",
            ReviewState::Unknown => "reviewed this",
        }
    }
}

/// One reviewer action on a pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEvent {
    /// Absent when the reviewer account no longer exists.
    pub reviewer: Option<String>,
    pub state: ReviewState,
    /// Absent for pending reviews.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A branch rule returned by the rulesets API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchRule {
    PullRequest {
        required_approving_review_count: Option<u32>,
    },
    RequiredStatusChecks,
    Other(String),
}

impl BranchRule {
    /// Number of approvals this rule demands, if it is a review rule.
    pub fn required_approvals(&self) -> Option<u32> {
        match self {
            BranchRule::PullRequest {
                required_approving_review_count,
            } => *required_approving_review_count,
            BranchRule::RequiredStatusChecks | BranchRule::Other(_) => None,
        }
    }
}

/// Repository-level branch protection for one branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchProtection {
    pub enabled: bool,
    pub required_approving_review_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullFile {
    pub filename: String,
    pub changes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub html_url: String,
    pub avatar_url: String,
}
