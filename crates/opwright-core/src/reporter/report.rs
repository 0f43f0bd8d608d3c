//! Text report of a batch's results

use crate::directive::Domain;
use crate::results::ExecutionResults;
use std::fmt::Write;

/// User-facing log of a batch's results.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionReport<'a> {
    results: &'a ExecutionResults,
}

struct Line {
    success: bool,
    text: String,
    error: Option<String>,
}

impl<'a> ExecutionReport<'a> {
    /// Report over `results`
    #[must_use]
    pub fn new(results: &'a ExecutionResults) -> Self {
        Self { results }
    }

    /// Render one line per result, grouped by domain.
    ///
    /// Failed entries carry their domain label and captured error.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for domain in Domain::ALL {
            let lines = self.lines(domain);
            if lines.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}", domain.label());
            for line in lines {
                if line.success {
                    let _ = writeln!(out, "  ok      {}", line.text);
                } else {
                    let error = line.error.unwrap_or_else(|| "failed".to_string());
                    let _ = writeln!(out, "  FAILED  {} [{}]: {}", line.text, domain.label(), error);
                }
            }
        }
        if out.is_empty() {
            out.push_str("No operations\n");
        }
        out
    }

    fn lines(&self, domain: Domain) -> Vec<Line> {
        let r = self.results;
        match domain {
            Domain::Terminal => r
                .terminal
                .iter()
                .map(|t| Line {
                    success: t.success,
                    text: t.command.clone(),
                    error: (!t.success).then(|| last_line(&t.output, t.exit_code)),
                })
                .collect(),
            Domain::File => r
                .file
                .iter()
                .map(|f| Line {
                    success: f.success,
                    text: format!("{} {}", f.operation.label(), f.path),
                    error: f.error.clone(),
                })
                .collect(),
            Domain::Build => r
                .build
                .iter()
                .map(|b| Line {
                    success: b.success,
                    text: b.command.clone(),
                    error: (!b.errors.is_empty()).then(|| b.errors.join("; ")),
                })
                .collect(),
            Domain::Deploy => r
                .deploy
                .iter()
                .map(|d| Line {
                    success: d.success,
                    text: match &d.url {
                        Some(url) => format!("deploy {}", url),
                        None => "deploy".to_string(),
                    },
                    error: d.error.clone(),
                })
                .collect(),
            Domain::Git => r
                .git
                .iter()
                .map(|g| Line {
                    success: g.success,
                    text: g.operation.clone(),
                    error: g.error.clone(),
                })
                .collect(),
        }
    }
}

fn last_line(output: &str, exit_code: Option<i32>) -> String {
    let tail = output.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    match exit_code {
        Some(code) if tail.is_empty() => format!("exited with code {}", code),
        Some(code) => format!("exited with code {}: {}", code, tail.trim()),
        None => tail.trim().to_string(),
    }
}
