//! `pause-toggle` subcommand: pause or unpause every managed/claim/composite resource.

use std::path::PathBuf;

use console::{style, Term};

use migrator_kube::pause::{pause_category, unpause_category};
use migrator_kube::DiscoveryClient;

use crate::config::{connect, ConnectionOptions};
use crate::error::Result;

const CATEGORIES: [&str; 3] = ["managed", "claim", "composite"];

pub async fn run(
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    pause: bool,
    yes: bool,
) -> Result<()> {
    let verb = if pause { "pause" } else { "unpause" };
    if !yes && !confirm(&format!("{verb} every managed/claim/composite resource in the target cluster?"))? {
        println!("{} cancelled", style("✗").red());
        return Ok(());
    }

    let client = connect(&ConnectionOptions {
        kubeconfig,
        context,
        skip_target_check: true,
    })
    .await?;
    let discovery = DiscoveryClient::new(client).await?;

    for category in CATEGORIES {
        let count = if pause {
            pause_category(&discovery, category).await?
        } else {
            unpause_category(&discovery, category).await?
        };
        println!(
            "{} {verb}d {count} {category} resource(s)",
            style("✓").green(),
        );
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} {prompt} [y/N] ", style("?").blue()))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
