//! Human-readable rendering of inspections and patch reports.

use owo_colors::OwoColorize;
use permapatch::{GroupState, Inspection, PatchGroup, PatchProfile, PatchReport, PatchStatus};

use crate::commands::hex_utils::format_hex_address;

/// Label describing what a group's state means in game
pub fn status_label(group: Option<&PatchGroup>, state: &GroupState) -> String {
    match (state.status, group) {
        (PatchStatus::Installed, Some(group)) => group.modded_label.clone(),
        (PatchStatus::NotInstalled, Some(group)) => group.vanilla_label.clone(),
        (PatchStatus::Partial, _) => "Partial (mixed or invalid)".to_string(),
        (status, None) => status.to_string(),
    }
}

pub fn print_inspection(inspection: &Inspection, profile: Option<&PatchProfile>) {
    println!("Version Detected: {}", inspection.version);
    println!("ISO STATUS:");

    let width = inspection
        .groups
        .iter()
        .map(|g| g.display_name.len())
        .max()
        .unwrap_or(0);

    for state in &inspection.groups {
        let group = profile.and_then(|p| p.group(&state.id));
        let label = status_label(group, state);
        let label = match state.status {
            PatchStatus::Installed => label.green().to_string(),
            PatchStatus::NotInstalled => label,
            PatchStatus::Partial => label.yellow().to_string(),
        };
        println!(
            "  {:<width$}  =  {}",
            state.display_name,
            label,
            width = width
        );

        for record in state.unrecognized() {
            println!(
                "  {} unrecognized bytes at {}",
                "!".red(),
                format_hex_address(record.site)
            );
        }
    }

    let overall = format!("Patch is {}.", inspection.overall);
    match inspection.overall {
        PatchStatus::Partial => println!("{}", overall.yellow()),
        _ => println!("{}", overall),
    }
}

pub fn print_report(report: &PatchReport) {
    for group in &report.groups {
        println!(
            "  {} {}: {} site(s) written, {} already up to date",
            group.direction,
            group.id,
            group.written.len(),
            group.skipped.len()
        );
    }
    println!("{}", "Operation Complete".green());
}
