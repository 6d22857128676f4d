// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddonError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: String,
        name: String,
        namespace: String,
    },

    #[error("Failed to {operation} {kind} {name}: {source}")]
    Store {
        operation: &'static str,
        kind: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("Unable to resolve image: {0}")]
    ImageResolution(String),

    #[error("BOM error: {0}")]
    Bom(String),

    #[error("Addon config not found in BOM: {0}")]
    AddonConfigNotFound(String),

    #[error("Unresolved addon routing: {0}")]
    UnresolvedRouting(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Finalizer error: {0}")]
    Finalizer(String),
}

impl AddonError {
    pub fn is_not_found(&self) -> bool {
        match self {
            AddonError::NotFound { .. } => true,
            AddonError::KubeError(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, AddonError::AlreadyExists { .. })
    }
}

impl From<serde_json::Error> for AddonError {
    fn from(e: serde_json::Error) -> Self {
        AddonError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for AddonError {
    fn from(e: serde_yaml::Error) -> Self {
        AddonError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AddonError>;
