//! In-memory [`Platform`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

#[derive(Default)]
pub struct FakePlatform {
    pub organizations: Vec<String>,
    pub repositories: Vec<Repository>,
    pub pulls: HashMap<String, Vec<PullRequest>>,
    pub reviews: HashMap<(String, u64), Vec<ReviewEvent>>,
    pub requested: HashMap<(String, u64), Vec<String>>,
    pub rules: HashMap<(String, String), Vec<BranchRule>>,
    pub protection: HashMap<(String, String), BranchProtection>,
    pub files: HashMap<(String, u64), Vec<PullFile>>,
    pub commits: HashMap<(String, u64), Vec<Commit>>,
    pub users: HashMap<String, UserProfile>,
    /// Page size for every paginated listing; 0 means a single page.
    pub page_size: usize,
    /// Operation names that fail, e.g. `"list_files"` or `"list_pulls:demo"`.
    pub failing: HashSet<String>,
    pub pull_pages_fetched: AtomicUsize,
    pub user_lookups: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new(org: &str) -> Self {
        Self {
            organizations: vec![org.to_string()],
            ..Self::default()
        }
    }

    pub fn with_repository(mut self, name: &str) -> Self {
        self.repositories.push(repository(name));
        self
    }

    pub fn with_pull(mut self, repo: &str, pull: PullRequest) -> Self {
        self.pulls.entry(repo.to_string()).or_default().push(pull);
        self
    }

    pub fn with_reviews(mut self, repo: &str, number: u64, reviews: Vec<ReviewEvent>) -> Self {
        self.reviews.insert((repo.to_string(), number), reviews);
        self
    }

    pub fn with_requested(mut self, repo: &str, number: u64, logins: &[&str]) -> Self {
        self.requested.insert(
            (repo.to_string(), number),
            logins.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn with_rules(mut self, repo: &str, branch: &str, rules: Vec<BranchRule>) -> Self {
        self.rules.insert((repo.to_string(), branch.to_string()), rules);
        self
    }

    pub fn with_protection(mut self, repo: &str, branch: &str, required: u32) -> Self {
        self.protection.insert(
            (repo.to_string(), branch.to_string()),
            BranchProtection {
                enabled: true,
                required_approving_review_count: Some(required),
            },
        );
        self
    }

    pub fn with_files(mut self, repo: &str, number: u64, files: &[(&str, u64)]) -> Self {
        self.files.insert(
            (repo.to_string(), number),
            files
                .iter()
                .map(|(filename, changes)| PullFile {
                    filename: filename.to_string(),
                    changes: *changes,
                })
                .collect(),
        );
        self
    }

    pub fn with_commits(mut self, repo: &str, number: u64, count: usize) -> Self {
        self.commits.insert(
            (repo.to_string(), number),
            (0..count)
                .map(|i| Commit {
                    sha: format!("{i:040x}"),
                })
                .collect(),
        );
        self
    }

    pub fn with_user(mut self, login: &str, email: Option<&str>) -> Self {
        self.users.insert(login.to_string(), user(login, email));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    fn check(&self, operation: &str, scope: &str) -> Result<()> {
        if self.failing.contains(operation)
            || self.failing.contains(&format!("{operation}:{scope}"))
        {
            return Err(AppError::GitHubApi(format!("{operation} failed for {scope}")));
        }
        Ok(())
    }
}

fn page_of<T: Clone>(items: &[T], page_size: usize, cursor: Option<Cursor>) -> Page<T> {
    if page_size == 0 {
        return Page::last(items.to_vec());
    }
    let page = cursor.unwrap_or(1) as usize;
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    let next = (end < items.len()).then_some(page as Cursor + 1);
    Page {
        items: items[start..end].to_vec(),
        next,
    }
}

pub fn repository(name: &str) -> Repository {
    Repository {
        name: name.to_string(),
        html_url: format!("https://github.com/acme/{name}"),
        archived: false,
        visibility: Visibility::Private,
        fork: false,
        owner: "acme".to_string(),
    }
}

pub fn pull(number: u64, created_at: DateTime<Utc>) -> PullRequest {
    PullRequest {
        number,
        title: format!("Pull {number}"),
        author: "octocat".to_string(),
        base_ref: "main".to_string(),
        draft: false,
        created_at,
        closed_at: None,
        merged_at: None,
        html_url: format!("https://github.com/acme/demo/pull/{number}"),
    }
}

pub fn review(reviewer: &str, state: ReviewState, submitted_at: DateTime<Utc>) -> ReviewEvent {
    ReviewEvent {
        reviewer: Some(reviewer.to_string()),
        state,
        submitted_at: Some(submitted_at),
    }
}

pub fn user(login: &str, email: Option<&str>) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        name: None,
        email: email.map(str::to_string),
        html_url: format!("https://github.com/{login}"),
        avatar_url: format!("https://avatars.example/{login}"),
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn list_organizations(&self) -> Result<Vec<String>> {
        self.check("list_organizations", "token")?;
        Ok(self.organizations.clone())
    }

    async fn list_repositories(
        &self,
        org: &str,
        _kind: RepositoryType,
        cursor: Option<Cursor>,
    ) -> Result<Page<Repository>> {
        self.check("list_repositories", org)?;
        Ok(page_of(&self.repositories, self.page_size, cursor))
    }

    async fn list_pulls(
        &self,
        _org: &str,
        repo: &str,
        _state: PullState,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullRequest>> {
        self.check("list_pulls", repo)?;
        self.pull_pages_fetched.fetch_add(1, Ordering::SeqCst);
        let pulls = self.pulls.get(repo).cloned().unwrap_or_default();
        Ok(page_of(&pulls, self.page_size, cursor))
    }

    async fn get_pull(&self, _org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        self.check("get_pull", repo)?;
        self.pulls
            .get(repo)
            .and_then(|pulls| pulls.iter().find(|p| p.number == number))
            .cloned()
            .ok_or_else(|| AppError::GitHubApi(format!("pull {repo}#{number} not found")))
    }

    async fn list_reviews(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<ReviewEvent>> {
        self.check("list_reviews", repo)?;
        let reviews = self
            .reviews
            .get(&(repo.to_string(), number))
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&reviews, self.page_size, cursor))
    }

    async fn list_requested_reviewers(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>> {
        self.check("list_requested_reviewers", repo)?;
        Ok(self
            .requested
            .get(&(repo.to_string(), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_branch_rules(
        &self,
        _org: &str,
        repo: &str,
        branch: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<BranchRule>> {
        self.check("list_branch_rules", repo)?;
        let rules = self
            .rules
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&rules, self.page_size, cursor))
    }

    async fn get_branch_protection(
        &self,
        _org: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection> {
        self.check("get_branch_protection", repo)?;
        Ok(self
            .protection
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_files(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullFile>> {
        self.check("list_files", repo)?;
        let files = self
            .files
            .get(&(repo.to_string(), number))
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&files, self.page_size, cursor))
    }

    async fn list_commits(
        &self,
        _org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<Commit>> {
        self.check("list_commits", repo)?;
        let commits = self
            .commits
            .get(&(repo.to_string(), number))
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&commits, self.page_size, cursor))
    }

    async fn get_user(&self, login: &str) -> Result<UserProfile> {
        self.check("get_user", login)?;
        self.user_lookups
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?
            .push(login.to_string());
        Ok(self
            .users
            .get(login)
            .cloned()
            .unwrap_or_else(|| user(login, None)))
    }
}
