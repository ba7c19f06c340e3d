use crate::error::Result;
use crate::paginate::Paginator;
use crate::platform::Platform;

/// Number of approvals needed to merge into `branch`.
///
/// Combines branch rules and repository-level branch protection. Any failure
/// while reading either source is logged and yields 0: an unreadable policy
/// never blocks aggregation.
pub async fn required_reviewers(
    platform: &dyn Platform,
    org: &str,
    repo: &str,
    branch: &str,
) -> u32 {
    match try_required_reviewers(platform, org, repo, branch).await {
        Ok(required) => {
            tracing::debug!(repo, branch, required, "Resolved required reviewers");
            required
        }
        Err(e) => {
            tracing::warn!(
                repo,
                branch,
                error = %e,
                "Non-blocking error getting required reviewers"
            );
            0
        }
    }
}

async fn try_required_reviewers(
    platform: &dyn Platform,
    org: &str,
    repo: &str,
    branch: &str,
) -> Result<u32> {
    let rules = Paginator::new(move |cursor| platform.list_branch_rules(org, repo, branch, cursor))
        .collect_all()
        .await?;

    let candidates: Vec<u32> = rules
        .iter()
        .filter_map(|rule| rule.required_approvals())
        .filter(|count| *count > 0)
        .collect();

    let protection = platform.get_branch_protection(org, repo, branch).await?;
    let protected = if protection.enabled {
        protection.required_approving_review_count.unwrap_or(0)
    } else {
        0
    };

    Ok(merge_required(&candidates, protected))
}

/// The strictest of the rule candidates and the protection requirement.
///
/// The sources describe the same constraint, so they are not summed.
pub fn merge_required(rule_candidates: &[u32], protection: u32) -> u32 {
    rule_candidates
        .iter()
        .copied()
        .chain([protection, 0])
        .max()
        .unwrap_or(0)
}
