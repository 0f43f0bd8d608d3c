use super::read_input;
use anyhow::Result;
use std::path::Path;

pub fn run(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    print!("{}", opwright_core::sanitize(&text));
    Ok(())
}
