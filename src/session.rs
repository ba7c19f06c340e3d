use std::sync::Arc;

use serde::Deserialize;

use crate::cache::UserCache;
use crate::error::{AppError, Result};
use crate::paginate::Paginator;
use crate::platform::types::{Repository, RepositoryType, Visibility};
use crate::platform::Platform;

/// Which repositories of an organization take part in a run.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryFilter {
    #[serde(default, rename = "type")]
    pub kind: RepositoryType,
    /// Repository names to keep; empty keeps all.
    #[serde(default, rename = "filter")]
    pub names: Vec<String>,
    #[serde(default)]
    pub with_archived: bool,
    #[serde(default = "default_with_public")]
    pub with_public: bool,
}

fn default_with_public() -> bool {
    true
}

impl Default for RepositoryFilter {
    fn default() -> Self {
        Self {
            kind: RepositoryType::All,
            names: Vec::new(),
            with_archived: false,
            with_public: default_with_public(),
        }
    }
}

impl RepositoryFilter {
    pub fn matches(&self, repo: &Repository) -> bool {
        if !self.names.is_empty() && !self.names.iter().any(|n| n == &repo.name) {
            return false;
        }
        if !self.with_archived && repo.archived {
            return false;
        }
        if !self.with_public && repo.visibility == Visibility::Public {
            return false;
        }
        true
    }
}

/// One credential's view of a run: its platform, its organization and the
/// user profiles fetched so far.
pub struct Session {
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) org: String,
    pub(crate) users: UserCache,
}

impl Session {
    /// Resolve the single organization the credential belongs to.
    pub async fn connect(platform: Arc<dyn Platform>) -> Result<Self> {
        tracing::info!("Getting organization associated with current token...");
        let orgs = platform.list_organizations().await?;

        let org = match orgs.as_slice() {
            [only] => only.clone(),
            [] => {
                return Err(AppError::Organization(
                    "No organization permissions on token".to_string(),
                ))
            }
            many => {
                return Err(AppError::Organization(format!(
                    "More than one organization associated with current token: {}",
                    many.join(", ")
                )))
            }
        };

        tracing::info!(org = %org, "Token is associated with organization");

        Ok(Self {
            platform,
            org,
            users: UserCache::new(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// List the organization's repositories that pass `filter`, in listing order.
    pub async fn get_repositories(&self, filter: &RepositoryFilter) -> Result<Vec<Repository>> {
        let platform = self.platform.as_ref();
        let org = self.org.as_str();
        let kind = filter.kind;

        tracing::info!(org, kind = kind.as_str(), "Getting repositories");
        let repos = Paginator::new(move |cursor| platform.list_repositories(org, kind, cursor))
            .collect_all()
            .await?;

        let repos: Vec<Repository> = repos.into_iter().filter(|r| filter.matches(r)).collect();

        tracing::info!(
            org,
            count = repos.len(),
            repositories = ?repos.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "Found repositories"
        );

        Ok(repos)
    }

    /// Find a repository by name, regardless of filters.
    pub async fn find_repository(&self, name: &str) -> Result<Repository> {
        let filter = RepositoryFilter {
            names: vec![name.to_string()],
            with_archived: true,
            with_public: true,
            ..RepositoryFilter::default()
        };

        self.get_repositories(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::GitHubApi(format!("Repository {name} not found in {}", self.org))
            })
    }
}
