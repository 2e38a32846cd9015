//! Kubeconfig/context resolution and the target host gate (§6 "Target host gate").

use kube::Client;

use migrator_core::hostgate::is_allowed_target_host;

use crate::error::{CliError, Result};

pub struct ConnectionOptions {
    pub kubeconfig: Option<std::path::PathBuf>,
    pub context: Option<String>,
    pub skip_target_check: bool,
}

/// Build a `kube::Client` from the resolved kubeconfig/context, then enforce the
/// host gate unless the caller explicitly opted out.
pub async fn connect(options: &ConnectionOptions) -> Result<Client> {
    let kubeconfig = load_kubeconfig(options.kubeconfig.as_deref()).await?;
    let mut kube_options = kube::config::KubeConfigOptions::default();
    kube_options.context = options.context.clone();

    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &kube_options).await?;
    let cluster_url = config.cluster_url.to_string();

    if !options.skip_target_check && !is_allowed_target_host(&cluster_url) {
        return Err(CliError::validation(format!(
            "target cluster {cluster_url} is not an allowed migration target"
        )));
    }

    let client = Client::try_from(config)?;
    Ok(client)
}

async fn load_kubeconfig(path: Option<&std::path::Path>) -> Result<kube::config::Kubeconfig> {
    match path {
        Some(path) => Ok(kube::config::Kubeconfig::read_from(path)?),
        None => Ok(kube::config::Kubeconfig::read()?),
    }
}
