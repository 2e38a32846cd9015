//! `export` subcommand: snapshot a cluster's Crossplane-managed resources into an archive.

use std::path::{Path, PathBuf};

use console::{style, Term};

use migrator_core::manifest::ExportOptions;
use migrator_kube::progress::TerminalProgress;
use migrator_kube::{exporter, DiscoveryClient};

use crate::config::{connect, ConnectionOptions};
use crate::error::Result;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    output: &Path,
    include_extra_resources: &[String],
    exclude_resources: &[String],
    include_namespaces: &[String],
    exclude_namespaces: &[String],
    pause_before_export: bool,
    yes: bool,
) -> Result<()> {
    let options = ExportOptions {
        included_namespaces: include_namespaces.to_vec(),
        excluded_namespaces: exclude_namespaces.to_vec(),
        included_extra_resources: include_extra_resources.to_vec(),
        excluded_resources: exclude_resources.to_vec(),
        paused_before_export: pause_before_export,
    };

    if options.included_extra_resources.iter().any(|r| r == "secrets") {
        println!(
            "{} this export will include Secret objects; make sure {} is the intended destination",
            style("!").yellow(),
            style(output.display()).cyan()
        );
    }

    if !yes && !confirm(&format!("export cluster resources to {}?", output.display()))? {
        println!("{} export cancelled", style("✗").red());
        return Ok(());
    }

    let client = connect(&ConnectionOptions {
        kubeconfig,
        context,
        skip_target_check: true,
    })
    .await?;
    let discovery = DiscoveryClient::new(client).await?;
    let progress = TerminalProgress::new();

    let file = std::fs::File::create(output)?;
    let manifest = exporter::export(&discovery, options, &progress, file).await?;

    println!(
        "{} exported {} resource(s) ({} native, {} custom) to {}",
        style("✓").green().bold(),
        manifest.stats.total,
        manifest.stats.native_resources.values().sum::<u64>(),
        manifest.stats.custom_resources.values().sum::<u64>(),
        style(output.display()).cyan()
    );

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} {prompt} [y/N] ", style("?").blue()))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
