//! Subcommand handlers. Results go to stdout, logs to stderr.

use crate::args::FlagArgs;
use anyhow::{Context, Result};
use carve::domain::ComponentPath;
use carve::{BuildOverrides, Project};
use std::path::PathBuf;

fn overrides(flags: FlagArgs, out_dir: Option<PathBuf>) -> BuildOverrides {
    BuildOverrides { enable: flags.enable, disable: flags.disable, out_dir }
}

/// Builds the requested distributions concurrently and prints one line per distribution.
///
/// # Errors
/// Returns the first failed build; nothing is reported for the others.
pub async fn build(
    project: &Project,
    distributions: &[String],
    out: Option<PathBuf>,
    flags: FlagArgs,
) -> Result<()> {
    let overrides = overrides(flags, out);
    let reports = project.build_all(distributions, &overrides).await?;
    let root = project.output_dir(&overrides);

    for report in &reports {
        println!(
            "✅ {}: {} components, {} artifacts in {}",
            report.distribution,
            report.components,
            report.artifacts.len(),
            root.display()
        );
    }
    Ok(())
}

/// Composes the requested distributions and discards the results.
///
/// # Errors
/// Returns the first composition failure.
pub fn check(project: &Project, distributions: &[String], flags: FlagArgs) -> Result<()> {
    for (name, components) in project.check_all(distributions, &overrides(flags, None))? {
        println!("✅ {name}: {components} components");
    }
    Ok(())
}

/// Prints the composed namespace of one distribution as pretty JSON.
///
/// # Errors
/// Returns composition or serialization failures.
pub fn inspect(project: &Project, distribution: &str, flags: FlagArgs) -> Result<()> {
    let composed = project.compose(distribution, &overrides(flags, None))?;
    let json = serde_json::to_string_pretty(&composed).context("Failed to render namespace")?;
    println!("{json}");
    Ok(())
}

/// Lists catalog leaves as `path<TAB>module`, with the gating flag where one applies.
///
/// # Errors
/// Returns an error if `prefix` is not a valid dotted path.
pub fn catalog(project: &Project, prefix: Option<&str>) -> Result<()> {
    let prefix = prefix.map(ComponentPath::parse).transpose().context("Invalid catalog prefix")?;
    let registry = project.registry();
    let leaves = registry.leaves_under(prefix.as_ref());

    if leaves.is_empty() {
        println!("ℹ️ No components found.");
        return Ok(());
    }

    for entry in leaves {
        match registry.optional().owner_of(entry.path()) {
            Some(gated) => println!("{}\t{}\t[{}]", entry.path(), entry.module(), gated.flag()),
            None => println!("{}\t{}", entry.path(), entry.module()),
        }
    }
    Ok(())
}
