//! Human-readable checkout report.
//!
//! Renders an [`ApplyVersionResults`] into the summary the user sees:
//! a failure section first, then the success section, with wording that
//! distinguishes reset, explicit-version, and latest checkouts.

use console::style;

use compvc_core::checkout::{ApplyVersionResults, CheckoutStatus, ComponentCheckoutResult};
use compvc_core::component::TargetDirective;
use compvc_core::merge::MergeAction;

/// Render the full report for one batch.
pub fn render(results: &ApplyVersionResults, directive: &TargetDirective, verbose: bool) -> String {
    let mut out = String::new();
    out.push_str(&failure_section(results));
    out.push_str(&success_section(results, directive, verbose));
    out
}

fn failure_section(results: &ApplyVersionResults) -> String {
    if results.failed_components.is_empty() {
        return String::new();
    }
    let mut out = String::from("the checkout has been canceled on the following component(s)\n");
    for failed in &results.failed_components {
        out.push_str(&format!(
            "{} - {}\n",
            style(&failed.id).bold(),
            style(&failed.failure_message).red()
        ));
    }
    out.push('\n');
    out
}

fn success_section(
    results: &ApplyVersionResults,
    directive: &TargetDirective,
    verbose: bool,
) -> String {
    let components = &results.components;
    if components.is_empty() {
        return String::new();
    }
    let is_reset = *directive == TargetDirective::Reset;

    if components.len() == 1 {
        let component = &components[0];
        if is_reset {
            return format!(
                "successfully reset {}\n",
                style(component.id.to_string_without_version()).bold()
            );
        }
        let mut out = format!(
            "successfully switched {} to version {}\n",
            style(component.id.to_string_without_version()).bold(),
            style(&component.applied_version).bold()
        );
        out.push_str(&file_detail(component, verbose));
        return out;
    }

    if is_reset {
        let mut out = String::from("successfully reset the following components\n\n");
        for component in components {
            out.push_str(&format!(
                "{}\n",
                style(component.id.to_string_without_version()).bold()
            ));
        }
        return out;
    }

    let version_output = match directive {
        TargetDirective::Latest => "their latest version".to_string(),
        other => format!("version {}", style(other).bold()),
    };
    let mut out = format!(
        "successfully switched the following components to {}\n\n",
        version_output
    );
    for component in components {
        out.push_str(&format!(
            "{}@{}\n",
            style(component.id.to_string_without_version()).bold(),
            component.applied_version
        ));
        out.push_str(&file_detail(component, verbose));
    }
    out
}

/// Per-file outcome lines. Conflicted files are always listed; the rest
/// only under `--verbose`.
fn file_detail(component: &ComponentCheckoutResult, verbose: bool) -> String {
    let mut out = String::new();
    for file in &component.files {
        let label = match &file.action {
            MergeAction::Unchanged => {
                if !verbose {
                    continue;
                }
                style("unchanged").dim().to_string()
            }
            MergeAction::FastForwarded => {
                if !verbose {
                    continue;
                }
                style("updated").green().to_string()
            }
            MergeAction::AutoMerged => {
                if !verbose {
                    continue;
                }
                style("auto-merged").green().to_string()
            }
            MergeAction::Conflicted { .. } => {
                style("CONFLICT (resolve manually)").red().bold().to_string()
            }
            MergeAction::ResolvedByStrategy(strategy) => {
                if !verbose {
                    continue;
                }
                style(format!("resolved ({})", strategy)).yellow().to_string()
            }
        };
        out.push_str(&format!("  {} {}\n", file.path.display(), label));
    }
    if component.status == CheckoutStatus::SucceededWithConflicts {
        out.push_str(&format!(
            "{}\n",
            style("conflicts were left in the files above; edit them to resolve").yellow()
        ));
    }
    out
}
