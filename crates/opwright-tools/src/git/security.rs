//! Git Security Utilities
//!
//! Argument validation for values that reach the git command line.

const DANGEROUS_CHARS: [char; 10] = ['`', '$', '|', ';', '&', '>', '<', '\n', '\r', '\0'];

/// Validate branch name for security (prevent command injection)
pub fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 {
        return false;
    }

    // Could be read as a flag
    if name.starts_with('-') {
        return false;
    }

    if name.chars().any(|c| DANGEROUS_CHARS.contains(&c) || c.is_whitespace()) {
        return false;
    }

    !name.contains("..")
}

/// Validate a remote name (`origin`, `upstream`, ...)
pub fn is_valid_remote_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 100
        && !name.starts_with('-')
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Validate a repository-relative path passed after `--`
pub fn is_valid_pathspec(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= 4096
        && !path.contains("..")
        && !path.chars().any(|c| DANGEROUS_CHARS.contains(&c))
}

/// Hide git error text that may echo remote URLs or credentials
pub fn sanitize_remote_error(operation: &str, stderr: &str) -> String {
    if stderr.contains("http") || stderr.contains('@') {
        format!("git {} failed: authentication or remote error", operation)
    } else {
        format!("git {} failed: {}", operation, stderr.trim())
    }
}
