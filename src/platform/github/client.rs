use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

const PER_PAGE: u32 = 100;

#[derive(Debug, Serialize)]
struct ListParams<'a> {
    per_page: u32,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a str>,
}

impl<'a> ListParams<'a> {
    fn page(cursor: Option<Cursor>) -> Self {
        Self {
            per_page: PER_PAGE,
            page: cursor.unwrap_or(1),
            state: None,
            kind: None,
        }
    }
}

/// GitHub REST implementation of [`Platform`], bound to a single token.
pub struct GitHubPlatform {
    client: Octocrab,
}

impl GitHubPlatform {
    pub fn new(token: &str, base_url: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(base_url) = base_url {
            builder = builder
                .base_uri(base_url)
                .map_err(|e| AppError::Config(format!("Invalid GitHub base URL {base_url}: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch one page of `route` and map every item.
    async fn get_page<W, T>(
        &self,
        route: &str,
        params: &ListParams<'_>,
        map: impl Fn(W) -> T,
    ) -> Result<Page<T>>
    where
        W: serde::de::DeserializeOwned,
    {
        let items: Vec<W> = self
            .client
            .get(route, Some(params))
            .await
            .map_err(|e| AppError::GitHubApi(format!("GET {route} failed: {e}")))?;

        let next = if items.len() as u32 >= params.per_page {
            Some(params.page + 1)
        } else {
            None
        };

        Ok(Page {
            items: items.into_iter().map(map).collect(),
            next,
        })
    }
}

fn branch_path(branch: &str) -> String {
    urlencoding::encode(branch).into_owned()
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn list_organizations(&self) -> Result<Vec<String>> {
        let memberships: Vec<mapper::OrgMembership> = self
            .client
            .get("/user/memberships/orgs", None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to list org memberships: {e}")))?;

        Ok(memberships
            .into_iter()
            .map(|m| m.organization.login)
            .collect())
    }

    async fn list_repositories(
        &self,
        org: &str,
        kind: RepositoryType,
        cursor: Option<Cursor>,
    ) -> Result<Page<Repository>> {
        let route = format!("/orgs/{org}/repos");
        let params = ListParams {
            kind: Some(kind.as_str()),
            ..ListParams::page(cursor)
        };
        self.get_page(&route, &params, mapper::map_repository).await
    }

    async fn list_pulls(
        &self,
        org: &str,
        repo: &str,
        state: PullState,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullRequest>> {
        let route = format!("/repos/{org}/{repo}/pulls");
        let params = ListParams {
            state: Some(state.as_str()),
            ..ListParams::page(cursor)
        };
        self.get_page(&route, &params, mapper::map_pull_request)
            .await
    }

    async fn get_pull(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}");
        let pull: mapper::PullWire = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| {
                AppError::GitHubApi(format!("Failed to fetch pull {repo}#{number}: {e}"))
            })?;

        Ok(mapper::map_pull_request(pull))
    }

    async fn list_reviews(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<ReviewEvent>> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/reviews");
        self.get_page(&route, &ListParams::page(cursor), mapper::map_review)
            .await
    }

    async fn list_requested_reviewers(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/requested_reviewers");
        let requested: mapper::RequestedReviewersWire = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| {
                AppError::GitHubApi(format!("Failed to fetch requested reviewers: {e}"))
            })?;

        Ok(requested.users.into_iter().map(|u| u.login).collect())
    }

    async fn list_branch_rules(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
        cursor: Option<Cursor>,
    ) -> Result<Page<BranchRule>> {
        let route = format!("/repos/{org}/{repo}/rules/branches/{}", branch_path(branch));
        self.get_page(&route, &ListParams::page(cursor), mapper::map_rule)
            .await
    }

    async fn get_branch_protection(
        &self,
        org: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection> {
        let branch = branch_path(branch);
        let route = format!("/repos/{org}/{repo}/branches/{branch}");
        let summary: mapper::BranchWire = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch branch: {e}")))?;

        if !mapper::protection_enabled(&summary) {
            return Ok(BranchProtection::default());
        }

        // The rules endpoint does not reliably report repository-level
        // protection, so the protection policy is read separately.
        let route = format!("{route}/protection");
        let protection: mapper::ProtectionWire = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch branch protection: {e}")))?;

        Ok(mapper::map_protection(protection))
    }

    async fn list_files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<PullFile>> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/files");
        self.get_page(&route, &ListParams::page(cursor), mapper::map_file)
            .await
    }

    async fn list_commits(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        cursor: Option<Cursor>,
    ) -> Result<Page<Commit>> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/commits");
        self.get_page(&route, &ListParams::page(cursor), mapper::map_commit)
            .await
    }

    async fn get_user(&self, login: &str) -> Result<UserProfile> {
        let route = format!("/users/{login}");
        let user: mapper::UserWire = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch user: {e}")))?;

        Ok(mapper::map_user(user))
    }
}
