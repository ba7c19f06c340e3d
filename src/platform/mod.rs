#[cfg(test)]
pub mod fake;
pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Read-only view of a code host, scoped to one credential.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List the organizations the credential is a member of.
    async fn list_organizations(&self) -> Result<Vec<String>>;

    /// List one page of an organization's repositories.
    async fn list_repositories(
        &self,
        org: &str,
        kind: RepositoryType,
        cursor: Option<Cursor>,
    ) -> Result<Page<Repository>>;

    /// List one page of pulls in the given state.
    async fn list_pulls(
        &self,
        org: &str,
        repo: &str,
        state: PullState,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullRequest>>;

    /// Fetch a single pull.
    async fn get_pull(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest>;

    /// List one page of review events on a pull.
    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<ReviewEvent>>;

    /// Logins of users whose review is currently requested.
    async fn list_requested_reviewers(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>>;

    /// List one page of rules that apply to a branch.
    async fn list_branch_rules(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<BranchRule>>;

    /// Fetch repository-level protection for a branch.
    async fn get_branch_protection(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection>;

    /// List one page of files changed by a pull.
    async fn list_files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullFile>>;

    /// List one page of commits on a pull.
    async fn list_commits(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<Commit>>;

    /// Fetch a user's public profile.
    async fn get_user(&self, login: &str) -> Result<UserProfile>;
}
