//! Display formatting for CLI output

use console::style;
use hmc_core::ManagementStatus;
use hmc_kube::PassOutcome;

/// Print the result of a convergence pass
pub fn print_outcome(outcome: &PassOutcome) {
    match outcome {
        PassOutcome::Gone => println!("{}", style("Management not found, nothing to do").dim()),
        PassOutcome::Registered => println!(
            "{} finalizer attached, run again to converge",
            style("✓").green().bold()
        ),
        PassOutcome::Defaulted => println!(
            "{} default core components written, run again to converge",
            style("✓").green().bold()
        ),
        PassOutcome::Deleting => println!(
            "{}",
            style("Management is being deleted, no action taken").yellow()
        ),
        PassOutcome::Conflict => println!(
            "{}",
            style("Management changed during the pass, run again").yellow()
        ),
        PassOutcome::Converged(summary) => {
            println!(
                "{} {} component(s) applied, {} changed",
                style("✓").green().bold(),
                summary.applied,
                summary.changed
            );
            print_status(&summary.status);
        }
    }
}

/// Print a Management status as a component table
pub fn print_status(status: &ManagementStatus) {
    println!();
    println!("{}", style("COMPONENTS").bold().underlined());
    for line in status_lines(status) {
        println!("{}", line);
    }

    let providers = &status.available_providers;
    if !providers.is_empty() {
        println!();
        println!("{}", style("AVAILABLE PROVIDERS").bold().underlined());
        print_providers("Infrastructure", &providers.infrastructure);
        print_providers("Bootstrap", &providers.bootstrap);
        print_providers("Control plane", &providers.control_plane);
    }
}

/// One unstyled line per component, in name order
fn status_lines(status: &ManagementStatus) -> Vec<String> {
    status
        .components
        .iter()
        .map(|(name, component)| {
            if component.success {
                format!("  {:<24} ok", name)
            } else {
                format!("  {:<24} failed: {}", name, component.error)
            }
        })
        .collect()
}

fn print_providers(label: &str, names: &[String]) {
    if !names.is_empty() {
        println!("  {:<16} {}", format!("{}:", label), style(names.join(", ")).cyan());
    }
}
