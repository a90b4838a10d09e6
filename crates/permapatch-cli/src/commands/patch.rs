//! Install, remove and set command implementations.

use std::path::Path;

use anyhow::Result;
use permapatch::{
    Direction, NO_SAVING, PERMADEATH, PatchProfile, PatchRequest, RunOutcome, profile_for,
};

use super::{open_image, patcher};
use crate::cli::{Cli, PatchArgs};
use crate::output::{print_inspection, print_report};

/// Request for `direction` on the named groups, or on every group if none are named
pub fn group_request(direction: Direction, groups: &[String]) -> PatchRequest {
    if groups.is_empty() {
        return PatchRequest::all(direction);
    }
    groups
        .iter()
        .fold(PatchRequest::check(), |request, group| {
            request.with(group.as_str(), direction)
        })
}

/// Request for the `<image> 1|0 1|0` form
pub fn set_request(permadeath: bool, no_saving: bool) -> PatchRequest {
    PatchRequest::check()
        .with(PERMADEATH, Direction::from_enabled(permadeath))
        .with(NO_SAVING, Direction::from_enabled(no_saving))
}

/// Run the install or remove command
pub fn run(cli: &Cli, args: &PatchArgs, direction: Direction) -> Result<()> {
    let request = group_request(direction, &args.groups);
    execute(cli, &args.image, &request, args.force, args.json)
}

/// Run the set command
pub fn run_set(cli: &Cli, image: &Path, permadeath: u8, no_saving: u8, force: bool) -> Result<()> {
    let request = set_request(permadeath == 1, no_saving == 1);
    execute(cli, image, &request, force, false)
}

fn execute(cli: &Cli, image: &Path, request: &PatchRequest, force: bool, json: bool) -> Result<()> {
    let mut file = open_image(image, true)?;
    let patcher = patcher(cli, force);
    let outcome = patcher.run(&mut file, request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let profile = profile_for(patcher.profiles(), outcome.before.version);
    print_outcome(&outcome, profile);
    Ok(())
}

pub fn print_outcome(outcome: &RunOutcome, profile: Option<&PatchProfile>) {
    if let Some(report) = &outcome.report {
        print_report(report);
    }
    print_inspection(outcome.current(), profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use permapatch::Operation;

    #[test]
    fn test_group_request_defaults_to_all_groups() {
        let request = group_request(Direction::Remove, &[]);
        assert_eq!(request.operation(PERMADEATH), Operation::Remove);
        assert_eq!(request.operation(NO_SAVING), Operation::Remove);
    }

    #[test]
    fn test_group_request_named_groups_only() {
        let request = group_request(Direction::Install, &[PERMADEATH.to_string()]);
        assert_eq!(request.operation(PERMADEATH), Operation::Install);
        assert_eq!(request.operation(NO_SAVING), Operation::Check);
    }

    #[test]
    fn test_set_request() {
        let request = set_request(true, false);
        assert_eq!(request.operation(PERMADEATH), Operation::Install);
        assert_eq!(request.operation(NO_SAVING), Operation::Remove);
    }
}
