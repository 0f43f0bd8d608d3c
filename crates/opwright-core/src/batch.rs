//! Operation batch

use crate::directive::{Directive, Domain};
use serde::{Deserialize, Serialize};

/// Directives extracted from one response, grouped by domain.
///
/// Within a domain, directives keep the order in which they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBatch {
    /// Terminal directives
    pub terminal: Vec<Directive>,
    /// File and folder directives
    pub file: Vec<Directive>,
    /// Build, test, run and dev directives
    pub build: Vec<Directive>,
    /// Deploy directives
    pub deploy: Vec<Directive>,
    /// Git directives
    pub git: Vec<Directive>,
}

impl OperationBatch {
    /// Append a directive to its domain
    pub fn push(&mut self, directive: Directive) {
        match directive.domain() {
            Domain::Terminal => self.terminal.push(directive),
            Domain::File => self.file.push(directive),
            Domain::Build => self.build.push(directive),
            Domain::Deploy => self.deploy.push(directive),
            Domain::Git => self.git.push(directive),
        }
    }

    /// Directives of one domain
    #[must_use]
    pub fn domain(&self, domain: Domain) -> &[Directive] {
        match domain {
            Domain::Terminal => &self.terminal,
            Domain::File => &self.file,
            Domain::Build => &self.build,
            Domain::Deploy => &self.deploy,
            Domain::Git => &self.git,
        }
    }

    /// Total number of directives
    #[must_use]
    pub fn len(&self) -> usize {
        Domain::ALL.iter().map(|d| self.domain(*d).len()).sum()
    }

    /// Whether nothing was extracted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
