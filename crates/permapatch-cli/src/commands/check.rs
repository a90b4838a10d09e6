//! Check command implementation.

use std::path::Path;

use anyhow::Result;
use permapatch::profile_for;

use super::{open_image, patcher};
use crate::cli::Cli;
use crate::output::print_inspection;

/// Run the check command
pub fn run(cli: &Cli, image: &Path, json: bool) -> Result<()> {
    let mut file = open_image(image, false)?;
    let patcher = patcher(cli, false);
    let inspection = patcher.inspect(&mut file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let profile = profile_for(patcher.profiles(), inspection.version);
    print_inspection(&inspection, profile);
    Ok(())
}
