// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! `ObjectStore` backed by the Kubernetes API.

use super::{kind_of, not_found, ObjectStore, StoreObject};
use crate::error::{AddonError, Result};
use async_trait::async_trait;
use kube::{
    api::{DeleteParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K: StoreObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map API errors onto the store's error taxonomy
fn classify<K: StoreObject>(
    operation: &'static str,
    name: &str,
    namespace: &str,
    err: kube::Error,
) -> AddonError {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => not_found::<K>(name, namespace),
        kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
            AddonError::AlreadyExists {
                kind: kind_of::<K>(),
                name: name.to_string(),
                namespace: namespace.to_string(),
            }
        }
        kube::Error::Api(resp) if resp.code == 409 => AddonError::Conflict {
            kind: kind_of::<K>(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        _ => AddonError::Store {
            operation,
            kind: kind_of::<K>(),
            name: format!("{}/{}", namespace, name),
            source: err,
        },
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    #[instrument(skip(self), fields(kind = %kind_of::<K>()))]
    async fn get<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<Option<K>> {
        self.api::<K>(namespace)
            .get_opt(name)
            .await
            .map_err(|e| classify::<K>("get", name, namespace, e))
    }

    #[instrument(skip(self, obj), fields(kind = %kind_of::<K>(), name = %obj.name_any()))]
    async fn create<K: StoreObject>(&self, obj: &K) -> Result<K> {
        let name = obj.name_any();
        let namespace = obj.namespace().unwrap_or_default();
        debug!("Creating {}/{}", namespace, name);

        self.api::<K>(&namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| classify::<K>("create", &name, &namespace, e))
    }

    #[instrument(skip(self, obj), fields(kind = %kind_of::<K>(), name = %obj.name_any()))]
    async fn update<K: StoreObject>(&self, obj: &K) -> Result<K> {
        let name = obj.name_any();
        let namespace = obj.namespace().unwrap_or_default();
        debug!(
            "Updating {}/{} at resourceVersion {:?}",
            namespace,
            name,
            obj.resource_version()
        );

        // PUT carries metadata.resourceVersion, so the API server rejects stale writes
        self.api::<K>(&namespace)
            .replace(&name, &PostParams::default(), obj)
            .await
            .map_err(|e| classify::<K>("update", &name, &namespace, e))
    }

    #[instrument(skip(self), fields(kind = %kind_of::<K>()))]
    async fn delete<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<()> {
        self.api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| classify::<K>("delete", name, namespace, e))
    }
}
