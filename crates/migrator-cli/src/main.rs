//! ctp-migrate - export and import Crossplane-managed resources across control planes

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "ctp-migrate")]
#[command(author = "Upbound")]
#[command(version)]
#[command(about = "Export and import Crossplane-managed resources across control planes", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export Crossplane-managed resources from the current cluster into an archive
    Export {
        /// Archive output path
        #[arg(short, long)]
        output: PathBuf,

        /// Extra (non-Crossplane-defined) group-resources to include, e.g. "secrets"
        #[arg(long = "include-extra-resources")]
        include_extra_resources: Vec<String>,

        /// Group-resources to exclude even if otherwise in scope
        #[arg(long = "exclude-resources")]
        exclude_resources: Vec<String>,

        /// Restrict the export to these namespaces
        #[arg(long = "include-namespaces")]
        include_namespaces: Vec<String>,

        /// Exclude these namespaces from the export
        #[arg(long = "exclude-namespaces")]
        exclude_namespaces: Vec<String>,

        /// Pause managed/claim/composite resources before exporting them
        #[arg(long)]
        pause_before_export: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Import an archive produced by `export` into the current cluster
    Import {
        /// Archive input path
        #[arg(short, long)]
        input: PathBuf,

        /// Unpause managed resources once the import completes
        #[arg(long)]
        unpause_after_import: bool,

        /// Connector cluster ID used to derive renamed claim names
        #[arg(long)]
        mcp_connector_cluster_id: Option<String>,

        /// Shared namespace renamed claims are imported into
        #[arg(long)]
        mcp_connector_claim_namespace: Option<String>,

        /// Only import group-resources carrying the "claim" category
        #[arg(long)]
        import_claims_only: bool,

        /// Skip the target host gate check
        #[arg(long)]
        skip_target_check: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Pause or unpause every managed/claim/composite resource in the current cluster
    PauseToggle {
        /// Pause (true) or unpause (false) the resources
        #[arg(long)]
        pause: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match cli.command {
        Commands::Export {
            output,
            include_extra_resources,
            exclude_resources,
            include_namespaces,
            exclude_namespaces,
            pause_before_export,
            yes,
        } => {
            commands::export::run(
                cli.kubeconfig,
                cli.context,
                &output,
                &include_extra_resources,
                &exclude_resources,
                &include_namespaces,
                &exclude_namespaces,
                pause_before_export,
                yes,
            )
            .await
        }

        Commands::Import {
            input,
            unpause_after_import,
            mcp_connector_cluster_id,
            mcp_connector_claim_namespace,
            import_claims_only,
            skip_target_check,
            yes,
        } => {
            commands::import::run(
                cli.kubeconfig,
                cli.context,
                &input,
                unpause_after_import,
                mcp_connector_cluster_id,
                mcp_connector_claim_namespace,
                import_claims_only,
                skip_target_check,
                yes,
            )
            .await
        }

        Commands::PauseToggle { pause, yes } => {
            commands::pause_toggle::run(cli.kubeconfig, cli.context, pause, yes).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn report(err: &CliError) {
    eprintln!("{} {err}", console::style("✗").red().bold());
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn init_logging(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
