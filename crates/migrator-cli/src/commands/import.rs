//! `import` subcommand: restore an archive into a target cluster.

use std::path::PathBuf;

use console::{style, Term};

use migrator_core::manifest::ImportOptions;
use migrator_kube::importer;
use migrator_kube::progress::TerminalProgress;
use migrator_kube::DiscoveryClient;

use crate::config::{connect, ConnectionOptions};
use crate::error::{CliError, Result};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    input: &std::path::Path,
    unpause_after_import: bool,
    mcp_connector_cluster_id: Option<String>,
    mcp_connector_claim_namespace: Option<String>,
    import_claims_only: bool,
    skip_target_check: bool,
    yes: bool,
) -> Result<()> {
    let options = ImportOptions {
        unpause_after_import,
        mcp_connector_cluster_id,
        mcp_connector_claim_namespace,
        import_claims_only,
        skip_target_check,
    };

    let client = connect(&ConnectionOptions {
        kubeconfig,
        context,
        skip_target_check,
    })
    .await?;
    let mut discovery = DiscoveryClient::new(client).await?;
    let progress = TerminalProgress::new();

    let file = std::fs::File::open(input)?;
    let preflight = importer::read_and_preflight(&discovery, file).await?;

    if !preflight.warnings.is_empty() {
        println!("{} preflight warnings:", style("!").yellow());
        for warning in &preflight.warnings {
            println!("  - {warning}");
        }
    }

    if !yes && !confirm("proceed with import?")? {
        if preflight.warnings.is_empty() {
            println!("{} import cancelled", style("✗").red());
            return Ok(());
        }
        return Err(CliError::PreflightDeclined);
    }

    importer::run(&mut discovery, preflight, options, &progress).await?;

    println!("{} import completed", style("✓").green().bold());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} {prompt} [y/N] ", style("?").blue()))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
