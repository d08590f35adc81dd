use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::{Api, DeleteParams, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;

use crate::error::Error;
use crate::pod::PodRecord;

/// Cluster access configuration
#[derive(Clone, Debug, clap::Args)]
pub struct Config {
    /// Authenticate with the in-cluster service account instead of a
    /// kubeconfig file.
    #[clap(long, env = "IN_CLUSTER")]
    pub in_cluster: bool,

    /// Comma separated list of kubeconfig file paths, one cluster context
    /// each.  If unspecified, `~/.kube/config` is used.
    #[clap(long, value_parser, value_delimiter = ',', env = "KUBE_CONFIG_PATHS")]
    pub kube_config_paths: Vec<PathBuf>,

    /// Timeout (in seconds) for calls to the cluster API
    #[clap(
        long,
        value_parser = |secs: &str| secs.parse().map(Duration::from_secs),
        default_value = "60",
        env = "API_TIMEOUT"
    )]
    pub api_timeout: Duration,
}

impl Config {
    /// One credential source per configured cluster context.  In-cluster
    /// identity is a single context and takes precedence over any
    /// kubeconfig paths.
    pub fn credential_sources(&self) -> Vec<CredentialSource> {
        if self.in_cluster {
            vec![CredentialSource::InCluster]
        } else if self.kube_config_paths.is_empty() {
            vec![CredentialSource::Kubeconfig(default_kubeconfig_path())]
        } else {
            self.kube_config_paths
                .iter()
                .cloned()
                .map(CredentialSource::Kubeconfig)
                .collect()
        }
    }
}

/// Where the credentials for one cluster context come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    InCluster,
    Kubeconfig(PathBuf),
}

impl CredentialSource {
    /// Obtain an authenticated client for this credential source.  Called
    /// once per context; does not retry.
    pub async fn connect(&self, timeout: Duration) -> Result<Cluster, Error> {
        tracing::info!(source = %self, "generating cluster client");

        let config = match self {
            Self::InCluster => kube::Config::incluster()?,
            Self::Kubeconfig(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await?
            }
        };

        let api_server = config.cluster_url.to_string();
        let client = Client::try_from(config)?;

        Ok(Cluster {
            client,
            api_server,
            timeout,
        })
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InCluster => write!(f, "in-cluster"),
            Self::Kubeconfig(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The kubeconfig path used when none is configured.
pub fn default_kubeconfig_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".kube")
        .join("config")
}

/// The slice of the cluster API the termination engine needs.  Kept narrow
/// so tests can substitute an in-memory cluster.
#[async_trait]
pub trait ClusterApi {
    /// Names of every namespace in the cluster.
    async fn list_namespaces(&self) -> Result<Vec<String>, Error>;

    /// Resolve a single namespace by name.
    async fn get_namespace(&self, name: &str) -> Result<String, Error>;

    /// Every pod in the given namespace.
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, Error>;

    /// Delete one pod, passing the grace period through to the API server.
    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_seconds: u32,
    ) -> Result<(), Error>;
}

/// An authenticated handle to one cluster, owned exclusively by its
/// context.  Every call is bounded by the configured timeout so an
/// unresponsive API server cannot stall the context indefinitely.
#[derive(Clone)]
pub struct Cluster {
    client: Client,
    /// API server URL, used only for observability.
    pub api_server: String,
    timeout: Duration,
}

impl Cluster {
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, kube::Error>> + Send,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(Error::from),
            Err(elapsed) => Err(Error::from(elapsed)),
        }
    }
}

#[async_trait]
impl ClusterApi for Cluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = self.bounded(api.list(&ListParams::default())).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    async fn get_namespace(&self, name: &str) -> Result<String, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());

        match self.bounded(api.get(name)).await {
            Ok(ns) => Ok(ns.metadata.name.unwrap_or_else(|| name.to_owned())),
            Err(Error::Api(kube::Error::Api(response))) if response.code == 404 => {
                Err(Error::NamespaceNotFound(name.to_owned()))
            }
            Err(error) => Err(error),
        }
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>, Error> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = self.bounded(api.list(&ListParams::default())).await?;

        Ok(list.items.into_iter().map(PodRecord::from).collect())
    }

    async fn delete_pod(
        &self,
        namespace: &str,
        name: &str,
        grace_period_seconds: u32,
    ) -> Result<(), Error> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = DeleteParams::default().grace_period(grace_period_seconds);

        let _ = self.bounded(api.delete(name, &params)).await?;
        Ok(())
    }
}
