use std::fmt::Write as _;

use crate::aggregate::EnrichedPull;
use crate::merge::RunResult;
use crate::timeutil::{format_list, plural};

/// Pulls open longer than this get flagged in the digest.
pub const STALE_AFTER_HOURS: u64 = 8;

#[derive(Debug, Clone, Default)]
pub struct DigestOptions {
    /// Repository names the run was limited to, shown as a note.
    pub repository_filter: Vec<String>,
}

/// Most pulls posted in one Slack message.
pub const MAX_PULLS_PER_MESSAGE: usize = 50;

/// Character budget of one Slack message, under the API's 40k text limit.
pub const MAX_MESSAGE_CHARS: usize = 39_000;

/// Slack-flavoured markdown summary of the open pulls of a run.
pub fn render(result: &RunResult, options: &DigestOptions) -> String {
    let mut out = preamble(result, options);
    for pull in &result.pulls {
        out.push('\n');
        out.push_str(&pull_block(pull));
    }
    out
}

/// The digest split into messages small enough to post one by one.
///
/// The first message carries the header; every message holds at most
/// [`MAX_PULLS_PER_MESSAGE`] pulls and stays within [`MAX_MESSAGE_CHARS`]
/// unless a single pull block is longer than that.
pub fn render_batches(result: &RunResult, options: &DigestOptions) -> Vec<String> {
    split_batches(
        preamble(result, options),
        result.pulls.iter().map(pull_block),
        MAX_PULLS_PER_MESSAGE,
        MAX_MESSAGE_CHARS,
    )
}

fn split_batches(
    preamble: String,
    blocks: impl IntoIterator<Item = String>,
    max_pulls: usize,
    max_chars: usize,
) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = preamble;
    let mut pulls = 0;

    for block in blocks {
        let full = pulls >= max_pulls || current.len() + block.len() + 1 > max_chars;
        if pulls > 0 && full {
            batches.push(std::mem::take(&mut current));
            pulls = 0;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&block);
        pulls += 1;
    }

    batches.push(current);
    batches
}

fn preamble(result: &RunResult, options: &DigestOptions) -> String {
    let mut out = header(result.pulls.len());
    out.push('\n');

    if !result.organizations.is_empty() {
        let _ = writeln!(out, "Organizations: {}", format_list(&result.organizations));
    }
    if !options.repository_filter.is_empty() {
        let _ = writeln!(
            out,
            "_Repository filter: {}_",
            format_list(&options.repository_filter)
        );
    }

    out
}

pub fn header(total: usize) -> String {
    if total == 0 {
        return "There are no open pull requests! :tada:".to_string();
    }
    format!(
        "You've got {total} open pull {}.",
        plural("request", total as u64)
    )
}

fn pull_block(pull: &EnrichedPull) -> String {
    let verdict = pull.review_report.verdict();
    let approved = verdict.is_some_and(|v| v.approvals > 0 && v.approvals_remaining == 0);

    let mut title = String::new();
    if approved {
        title.push_str(":white_check_mark: ");
    }
    if pull.draft {
        title.push_str(":footprints: ");
    }
    let _ = write!(title, "*<{}|#{} {}>*", pull.url, pull.number, pull.title);

    let mut age = format!("created {}", pull.age);
    if !approved && pull.age_in_hours > STALE_AFTER_HOURS {
        age.push_str(" :hourglass_flowing_sand:");
    }

    let mut context = vec![
        format!("<{}|{}>", pull.repo_url, pull.repo),
        format!("by {}", pull.author),
        age,
    ];
    if let Some(commits) = pull.commits.filter(|c| *c > 0) {
        context.push(format!("{commits} {}", plural("commit", commits as u64)));
    }
    if let Some(size) = pull.files_and_changes {
        context.push(format!("{} {}", size.files, plural("file", size.files as u64)));
        context.push(format!("{} {}", size.changes, plural("change", size.changes)));
    }
    if let Some(v) = verdict.filter(|v| v.required_reviewers > 0) {
        context.push(format!(
            "{} required {}",
            v.required_reviewers,
            plural("reviewer", v.required_reviewers as u64)
        ));
    }

    let mut block = format!("{title}\n{}\n", context.join(" | "));

    if let Some(v) = verdict {
        let _ = writeln!(
            block,
            "Approvals: {}/{} ({} remaining)",
            v.approvals, v.required_reviewers, v.approvals_remaining
        );
    }

    if !pull.requested_reviewers.is_empty() {
        let count = pull.requested_reviewers.len();
        let _ = writeln!(
            block,
            "    {} {} been requested to review.",
            format_list(&pull.requested_reviewers),
            if count == 1 { "has" } else { "have" }
        );
    }

    for review in pull.review_report.reviews() {
        let _ = writeln!(
            block,
            "    *{}* {} _{}_.",
            review.login, review.context, review.relative_age
        );
    }

    block
}
