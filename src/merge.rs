use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::aggregate::{EnrichedPull, PullQuery};
use crate::error::{AppError, Result};
use crate::platform::Platform;
use crate::session::{RepositoryFilter, Session};

/// Pulls gathered with one credential.
#[derive(Debug)]
pub struct CredentialResult {
    pub org: String,
    pub pulls: Vec<EnrichedPull>,
}

/// Pulls of every credential, deduplicated, with the organizations seen.
#[derive(Debug, Default, Serialize)]
pub struct RunResult {
    pub pulls: Vec<EnrichedPull>,
    pub organizations: Vec<String>,
}

/// Run discovery and aggregation once per credential and merge the results.
///
/// A credential that fails is logged and dropped. The run only fails when no
/// credential produced a result.
pub async fn collect(
    platforms: Vec<Arc<dyn Platform>>,
    filter: &RepositoryFilter,
    query: &PullQuery,
) -> Result<RunResult> {
    let attempted = platforms.len();
    let mut results = Vec::with_capacity(attempted);

    for (index, platform) in platforms.into_iter().enumerate() {
        match run_credential(platform, filter, query).await {
            Ok(result) => {
                tracing::info!(
                    credential = index + 1,
                    org = %result.org,
                    pulls = result.pulls.len(),
                    "Credential finished"
                );
                results.push(result);
            }
            Err(e) => {
                tracing::error!(credential = index + 1, error = %e, "Credential failed");
            }
        }
    }

    tracing::info!(
        succeeded = results.len(),
        attempted,
        "Collected pulls from {} of {} credentials",
        results.len(),
        attempted
    );

    if results.is_empty() {
        return Err(AppError::AllCredentialsFailed { attempted });
    }

    Ok(merge_results(results))
}

async fn run_credential(
    platform: Arc<dyn Platform>,
    filter: &RepositoryFilter,
    query: &PullQuery,
) -> Result<CredentialResult> {
    let mut session = Session::connect(platform).await?;
    let repositories = session.get_repositories(filter).await?;
    let pulls = session.get_pulls(&repositories, query).await?;

    Ok(CredentialResult {
        org: session.org().to_string(),
        pulls,
    })
}

/// Flatten per-credential results, keeping the first pull for each
/// (organization, repository, number).
pub fn merge_results(results: Vec<CredentialResult>) -> RunResult {
    let mut seen: HashSet<(String, String, u64)> = HashSet::new();
    let mut merged = RunResult::default();

    for result in results {
        if !merged.organizations.contains(&result.org) {
            merged.organizations.push(result.org.clone());
        }

        for pull in result.pulls {
            let key = (pull.org.clone(), pull.repo.clone(), pull.number);
            if seen.insert(key) {
                merged.pulls.push(pull);
            } else {
                tracing::debug!(
                    org = %pull.org,
                    repo = %pull.repo,
                    pull = pull.number,
                    "Dropping duplicate pull from another credential"
                );
            }
        }
    }

    merged
}
