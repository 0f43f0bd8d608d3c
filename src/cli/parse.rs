//! `opwright parse` - show extracted directives without executing them

use super::read_input;
use anyhow::Result;
use std::path::Path;

pub fn run(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let batch = opwright_core::extract(&text);
    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
