use std::fmt;

/// Generic error type
#[derive(Debug)]
pub enum Error {
    Kubeconfig(kube::config::KubeconfigError),
    InCluster(kube::config::InClusterError),
    Api(kube::Error),
    NamespaceNotFound(String),
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kubeconfig(s) => write!(f, "kubeconfig: {s}"),
            Self::InCluster(s) => write!(f, "in-cluster config: {s}"),
            Self::Api(s) => write!(f, "cluster api: {s}"),
            Self::NamespaceNotFound(s) => write!(f, "namespace not found: {s}"),
            Self::Timeout => write!(f, "cluster api: request timed out"),
        }
    }
}

impl std::error::Error for Error {}

impl From<kube::config::KubeconfigError> for Error {
    fn from(error: kube::config::KubeconfigError) -> Self {
        Self::Kubeconfig(error)
    }
}

impl From<kube::config::InClusterError> for Error {
    fn from(error: kube::config::InClusterError) -> Self {
        Self::InCluster(error)
    }
}

impl From<kube::Error> for Error {
    fn from(error: kube::Error) -> Self {
        Self::Api(error)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::Timeout
    }
}
