//! Interactive toggle command.

use std::path::Path;

use anyhow::Result;
use permapatch::{Direction, Inspection, PatchProfile, PatchRequest, PatchStatus, profile_for};

use super::{open_image, patch::print_outcome, patcher};
use crate::cli::Cli;
use crate::output::{print_inspection, status_label};
use crate::prompter::{CliPrompter, Prompter};

/// Direction that flips a group; partial groups are offered a full install
pub fn toggle_direction(status: PatchStatus) -> Direction {
    match status {
        PatchStatus::Installed => Direction::Remove,
        PatchStatus::NotInstalled | PatchStatus::Partial => Direction::Install,
    }
}

/// Ask about each group in turn and collect the accepted flips
pub fn plan_toggle(
    inspection: &Inspection,
    profile: Option<&PatchProfile>,
    prompter: &impl Prompter,
) -> PatchRequest {
    let mut request = PatchRequest::check();

    for state in &inspection.groups {
        let group = profile.and_then(|p| p.group(&state.id));
        let direction = toggle_direction(state.status);
        let target = match (group, direction) {
            (Some(group), Direction::Install) => group.modded_label.clone(),
            (Some(group), Direction::Remove) => group.vanilla_label.clone(),
            (None, Direction::Install) => PatchStatus::Installed.to_string(),
            (None, Direction::Remove) => PatchStatus::NotInstalled.to_string(),
        };

        let question = format!(
            "{} is {}. Change to {}?",
            state.display_name,
            status_label(group, state),
            target
        );
        if prompter.confirm(&question) {
            request = request.with(state.id.as_str(), direction);
        }
    }

    request
}

/// Run the toggle command
pub fn run(cli: &Cli, image: &Path, force: bool) -> Result<()> {
    let prompter = CliPrompter;
    let mut file = open_image(image, true)?;
    let patcher = patcher(cli, force);
    let inspection = patcher.inspect(&mut file)?;
    let profile = profile_for(patcher.profiles(), inspection.version);
    print_inspection(&inspection, profile);

    let request = plan_toggle(&inspection, profile, &prompter);
    if !request.is_mutating() {
        prompter.display_message("Nothing to change.");
        return Ok(());
    }

    let outcome = patcher.run(&mut file, &request)?;
    print_outcome(&outcome, profile);
    Ok(())
}
