//! Directive extraction
//!
//! A single left-to-right pass over the text. Each opening tag found is
//! checked against its grammar row; malformed occurrences are skipped and
//! scanning resumes right after the opening tag. A block tag pairs with the
//! first following close tag of the same name, so same-kind tags inside a
//! body are body text.

use super::grammar::{lookup, tag_alternation, BodyRule, TagSpec, ENV_TAG};
use super::types::{Directive, DirectiveKind, EnvVar};
use crate::batch::OperationBatch;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

/// Commits shown by `git_log` without a depth
pub const DEFAULT_LOG_DEPTH: usize = 10;

/// Attribute values are quoted, unquoted, or absent (a bare name reads as
/// `"true"`). An unquoted value never ends in `/`, so `a=b/>` self-closes.
const ATTRS_PATTERN: &str = r#"((?:\s+[A-Za-z_][A-Za-z0-9_-]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>=/]+(?:/[^\s"'<>=/]+)*))?)*)"#;

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"<({})\b{}\s*(/?)>", tag_alternation(), ATTRS_PATTERN);
        Regex::new(&pattern).expect("open tag pattern is valid")
    })
}

fn attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"([A-Za-z_][A-Za-z0-9_-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>=/]+(?:/[^\s"'<>=/]+)*)))?"#,
        )
            .expect("attribute pattern is valid")
    })
}

fn env_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(r"<{}\b{}\s*/?>", ENV_TAG, ATTRS_PATTERN);
        Regex::new(&pattern).expect("env tag pattern is valid")
    })
}

/// A well-formed directive and the text it was parsed from.
#[derive(Debug, Clone)]
pub(crate) struct Found {
    pub span: Range<usize>,
    pub directive: Directive,
}

/// Extract every well-formed directive from `text`, grouped by domain.
///
/// Never fails: malformed occurrences are skipped.
#[must_use]
pub fn extract(text: &str) -> OperationBatch {
    let mut batch = OperationBatch::default();
    for found in scan(text) {
        batch.push(found.directive);
    }
    debug!(directives = batch.len(), "Directives extracted");
    batch
}

/// Find every well-formed directive in textual order
pub(crate) fn scan(text: &str) -> Vec<Found> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(caps) = open_tag_re().captures_at(text, pos) {
        let Some(whole) = caps.get(0) else { break };
        let tag = caps.get(1).map_or("", |m| m.as_str());
        let open_end = whole.end();
        pos = open_end;

        let Some(spec) = lookup(tag) else { continue };
        let attrs = parse_attrs(caps.get(2).map_or("", |m| m.as_str()));
        let self_closed = caps.get(3).is_some_and(|m| !m.as_str().is_empty());

        if let Some(missing) = spec
            .required
            .iter()
            .find(|name| attrs.get(**name).map_or(true, |v| v.trim().is_empty()))
        {
            debug!(tag, attr = %missing, offset = whole.start(), "Skipping directive without required attribute");
            continue;
        }

        let (body, end) = match (spec.body, self_closed) {
            (BodyRule::None | BodyRule::Optional, true) => (None, open_end),
            (BodyRule::None, false) => {
                debug!(tag, offset = whole.start(), "Skipping directive that must be self-closing");
                continue;
            }
            (BodyRule::Required, true) => {
                debug!(tag, offset = whole.start(), "Skipping self-closed directive that needs a body");
                continue;
            }
            (BodyRule::Required | BodyRule::Optional, false) => {
                match find_close(text, open_end, tag) {
                    Some(close) => (Some(&text[open_end..close.start]), close.end),
                    None => {
                        debug!(tag, offset = whole.start(), "Skipping directive without closing tag");
                        continue;
                    }
                }
            }
        };

        match build(spec, &attrs, body) {
            Some(directive) => {
                found.push(Found {
                    span: whole.start()..end,
                    directive,
                });
                pos = end;
            }
            None => {
                debug!(tag, offset = whole.start(), "Skipping empty directive");
            }
        }
    }
    found
}

/// Locate `</tag>` (whitespace allowed before `>`) at or after `from`
fn find_close(text: &str, from: usize, tag: &str) -> Option<Range<usize>> {
    let needle = format!("</{}", tag);
    let mut search = from;
    while let Some(rel) = text[search..].find(&needle) {
        let start = search + rel;
        let after = start + needle.len();
        let rest = &text[after..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with('>') {
            let end = after + (rest.len() - trimmed.len()) + 1;
            return Some(start..end);
        }
        search = after;
    }
    None
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in attr_re().captures_iter(raw) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("true", |m| m.as_str());
        // First occurrence wins
        attrs
            .entry(name.as_str().to_string())
            .or_insert_with(|| decode_entities(value));
    }
    attrs
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Drop one leading line break and trailing spaces/tabs
fn normalize_body(body: &str) -> String {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    body.trim_end_matches([' ', '\t']).to_string()
}

fn build(spec: &TagSpec, attrs: &HashMap<String, String>, body: Option<&str>) -> Option<Directive> {
    let required = |name: &str| attrs.get(name).cloned().unwrap_or_default();
    let optional = |name: &str| {
        attrs
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let content = || normalize_body(body.unwrap_or_default());

    let directive = match spec.kind {
        DirectiveKind::TerminalRun => Directive::TerminalRun {
            command: required("command"),
        },
        DirectiveKind::TerminalSequence => {
            let commands: Vec<String> = body
                .unwrap_or_default()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect();
            if commands.is_empty() {
                return None;
            }
            Directive::TerminalSequence { commands }
        }
        DirectiveKind::TerminalStart => Directive::TerminalStart {
            name: required("name"),
            command: required("command"),
        },
        DirectiveKind::TerminalStop => Directive::TerminalStop {
            name: required("name"),
        },
        DirectiveKind::FileCreate => Directive::FileCreate {
            path: required("path"),
            content: content(),
        },
        DirectiveKind::FileEdit => Directive::FileEdit {
            path: required("path"),
            content: content(),
        },
        DirectiveKind::FileDelete => Directive::FileDelete {
            path: required("path"),
        },
        DirectiveKind::FileRename => Directive::FileRename {
            from: required("from"),
            to: required("to"),
        },
        DirectiveKind::FolderCreate => Directive::FolderCreate {
            path: required("path"),
        },
        DirectiveKind::FolderDelete => Directive::FolderDelete {
            path: required("path"),
        },
        DirectiveKind::Build => Directive::Build {
            command: optional("command"),
        },
        DirectiveKind::Test => Directive::Test {
            command: optional("command"),
            pattern: optional("pattern"),
        },
        DirectiveKind::Run => Directive::Run {
            command: optional("command"),
        },
        DirectiveKind::Dev => Directive::Dev {
            command: optional("command"),
            name: optional("name"),
        },
        DirectiveKind::Deploy => Directive::Deploy {
            platform: optional("platform"),
            project: optional("project"),
            env: body.map(parse_env).unwrap_or_default(),
        },
        DirectiveKind::GitInit => Directive::GitInit,
        DirectiveKind::GitStatus => Directive::GitStatus,
        DirectiveKind::GitAdd => Directive::GitAdd {
            path: optional("path").filter(|p| p != "."),
        },
        DirectiveKind::GitCommit => Directive::GitCommit {
            message: required("message"),
        },
        DirectiveKind::GitBranch => Directive::GitBranch {
            name: required("name"),
            checkout: optional("checkout").is_some_and(|v| parse_bool(&v)),
        },
        DirectiveKind::GitCheckout => Directive::GitCheckout {
            branch: required("branch"),
        },
        DirectiveKind::GitPush => Directive::GitPush {
            remote: optional("remote"),
            branch: optional("branch"),
        },
        DirectiveKind::GitPull => Directive::GitPull {
            remote: optional("remote"),
            branch: optional("branch"),
        },
        DirectiveKind::GitLog => Directive::GitLog {
            depth: optional("depth")
                .and_then(|d| d.parse::<usize>().ok())
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_LOG_DEPTH),
        },
        DirectiveKind::GitDiff => Directive::GitDiff {
            file: optional("file"),
        },
    };
    Some(directive)
}

fn parse_env(body: &str) -> Vec<EnvVar> {
    env_tag_re()
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = parse_attrs(caps.get(1).map_or("", |m| m.as_str()));
            let name = attrs.get("name").map(|n| n.trim()).filter(|n| !n.is_empty())?;
            Some(EnvVar {
                name: name.to_string(),
                value: attrs.get("value").cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}
