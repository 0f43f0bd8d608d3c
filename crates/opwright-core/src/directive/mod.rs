//! Directive protocol
//!
//! - `types`: the [`Directive`] sum type and its [`Domain`]s
//! - `grammar`: the tag table the scanner runs against
//! - `extract`: text to [`OperationBatch`](crate::batch::OperationBatch)

mod extract;
pub mod grammar;
mod types;


pub(crate) use extract::scan;
pub use extract::{extract, DEFAULT_LOG_DEPTH};
pub use types::{Directive, DirectiveKind, Domain, EnvVar};
