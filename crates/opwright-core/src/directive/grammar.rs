//! Directive tag grammar
//!
//! One row per tag: its kind, required and optional attributes, and whether
//! it carries a body. The extractor and sanitizer both scan against this
//! table.

use super::types::DirectiveKind;

/// Whether a tag carries a body between open and close tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    /// Self-closing only
    None,
    /// Block form only
    Required,
    /// Either form
    Optional,
}

/// Grammar row for one tag.
#[derive(Debug, Clone, Copy)]
pub struct TagSpec {
    /// Tag name as written in text
    pub tag: &'static str,
    /// Directive kind produced
    pub kind: DirectiveKind,
    /// Attributes that must be present and non-blank
    pub required: &'static [&'static str],
    /// Attributes that may be present
    pub optional: &'static [&'static str],
    /// Body rule
    pub body: BodyRule,
}

const fn spec(
    tag: &'static str,
    kind: DirectiveKind,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    body: BodyRule,
) -> TagSpec {
    TagSpec {
        tag,
        kind,
        required,
        optional,
        body,
    }
}

/// Nested child tag of `deploy`
pub const ENV_TAG: &str = "env";

/// The grammar table
pub const GRAMMAR: &[TagSpec] = &[
    spec("terminal_run", DirectiveKind::TerminalRun, &["command"], &[], BodyRule::None),
    spec("terminal_sequence", DirectiveKind::TerminalSequence, &[], &[], BodyRule::Required),
    spec("terminal_start", DirectiveKind::TerminalStart, &["name", "command"], &[], BodyRule::None),
    spec("terminal_stop", DirectiveKind::TerminalStop, &["name"], &[], BodyRule::None),
    spec("file_create", DirectiveKind::FileCreate, &["path"], &[], BodyRule::Required),
    spec("file_edit", DirectiveKind::FileEdit, &["path"], &[], BodyRule::Required),
    spec("file_delete", DirectiveKind::FileDelete, &["path"], &[], BodyRule::None),
    spec("file_rename", DirectiveKind::FileRename, &["from", "to"], &[], BodyRule::None),
    spec("folder_create", DirectiveKind::FolderCreate, &["path"], &[], BodyRule::None),
    spec("folder_delete", DirectiveKind::FolderDelete, &["path"], &[], BodyRule::None),
    spec("build", DirectiveKind::Build, &[], &["command"], BodyRule::None),
    spec("test", DirectiveKind::Test, &[], &["command", "pattern"], BodyRule::None),
    spec("run", DirectiveKind::Run, &[], &["command"], BodyRule::None),
    spec("dev", DirectiveKind::Dev, &[], &["command", "name"], BodyRule::None),
    spec("deploy", DirectiveKind::Deploy, &[], &["platform", "project"], BodyRule::Optional),
    spec("git_init", DirectiveKind::GitInit, &[], &[], BodyRule::None),
    spec("git_status", DirectiveKind::GitStatus, &[], &[], BodyRule::None),
    spec("git_add", DirectiveKind::GitAdd, &[], &["path"], BodyRule::None),
    spec("git_commit", DirectiveKind::GitCommit, &["message"], &[], BodyRule::None),
    spec("git_branch", DirectiveKind::GitBranch, &["name"], &["checkout"], BodyRule::None),
    spec("git_checkout", DirectiveKind::GitCheckout, &["branch"], &[], BodyRule::None),
    spec("git_push", DirectiveKind::GitPush, &[], &["remote", "branch"], BodyRule::None),
    spec("git_pull", DirectiveKind::GitPull, &[], &["remote", "branch"], BodyRule::None),
    spec("git_log", DirectiveKind::GitLog, &[], &["depth"], BodyRule::None),
    spec("git_diff", DirectiveKind::GitDiff, &[], &["file"], BodyRule::None),
];

/// Look up a tag by name
#[must_use]
pub fn lookup(tag: &str) -> Option<&'static TagSpec> {
    GRAMMAR.iter().find(|s| s.tag == tag)
}

/// `a|b|c` alternation of every tag name, for building patterns
pub(crate) fn tag_alternation() -> String {
    GRAMMAR
        .iter()
        .map(|s| s.tag)
        .collect::<Vec<_>>()
        .join("|")
}
