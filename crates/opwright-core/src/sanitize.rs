//! Response sanitization
//!
//! Produces display text from a raw response: every well-formed directive
//! is replaced by a short bracketed label, then any leftover directive tag
//! syntax (malformed or stray open/close tags) is removed. Labels contain no
//! `<`, so the output never re-parses as a directive.

use crate::directive::{grammar::tag_alternation, grammar::ENV_TAG, scan};
use regex::Regex;
use std::sync::OnceLock;

fn stray_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // A whole tag (quoted values may hold `<` or `>`), else a bare
        // `<tag` prefix with no closing `>`.
        let pattern = format!(
            r#"</?(?:{tags}|{env})\b(?:"[^"]*"|'[^']*'|[^<>"'])*>|</?(?:{tags}|{env})\b"#,
            tags = tag_alternation(),
            env = ENV_TAG
        );
        Regex::new(&pattern).expect("stray tag pattern is valid")
    })
}

/// Replace directives with display labels.
///
/// Deterministic and idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_pass(text);
    // Removing a stray tag can join fragments into a new tag; repeat until
    // stable. Every changing pass removes at least one '<', so this ends.
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_pass(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in scan(text) {
        out.push_str(&text[last..found.span.start]);
        out.push_str(found.directive.kind().label());
        last = found.span.end;
    }
    out.push_str(&text[last..]);
    stray_tag_re().replace_all(&out, "").into_owned()
}
