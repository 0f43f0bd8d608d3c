//! Parsers for git's machine-readable output

use super::backend::{CommitInfo, GitStatus, GitStatusEntry};

/// Field separator used in the log format string
pub(crate) const LOG_FIELD_SEP: char = '\x1f';

/// `--format` argument matching [`parse_log`]
pub(crate) const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%aI%x1f%s";

/// Parse `git status --porcelain=v1 --branch`
pub(crate) fn parse_status(stdout: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in stdout.lines().filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix("## ") {
            status.branch = parse_branch_header(header);
            continue;
        }
        if line.len() < 4 {
            continue;
        }
        let code = line[..2].trim().to_string();
        let path = &line[3..];
        // Renames are reported as "old -> new"
        let path = path.rsplit(" -> ").next().unwrap_or(path);
        status.entries.push(GitStatusEntry {
            status: code,
            path: path.trim_matches('"').to_string(),
        });
    }
    status
}

fn parse_branch_header(header: &str) -> Option<String> {
    if header.starts_with("HEAD (no branch)") {
        return None;
    }
    let header = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
        .unwrap_or(header);
    let name = header
        .split("...")
        .next()
        .unwrap_or(header)
        .split_whitespace()
        .next()?;
    Some(name.to_string())
}

/// Parse `git log` output produced with [`LOG_FORMAT`]
pub(crate) fn parse_log(stdout: &str) -> Vec<CommitInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, LOG_FIELD_SEP);
            Some(CommitInfo {
                sha: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                message: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Parse `git branch --format=%(refname:short)`
pub(crate) fn parse_branches(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
