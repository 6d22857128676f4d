// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declarative object store abstraction and idempotent create-or-update.

pub mod kubernetes;

pub use kubernetes::KubeStore;

use crate::error::{AddonError, Result};
use kube::core::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fmt::Debug;
use tracing::{debug, info};

/// A namespaced, typed object the store can hold
pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Kind of `K`, used in logs and errors
pub fn kind_of<K: StoreObject>() -> String {
    K::kind(&()).to_string()
}

/// Objects keyed by kind, name and namespace.
///
/// `update` writes the whole object and must only succeed while the object's
/// `resourceVersion` still matches the stored one.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<Option<K>>;

    /// Create an object, failing with `AlreadyExists` when it is present
    async fn create<K: StoreObject>(&self, obj: &K) -> Result<K>;

    /// Replace an object, failing with `Conflict` on a stale `resourceVersion`
    async fn update<K: StoreObject>(&self, obj: &K) -> Result<K>;

    /// Delete an object, failing with `NotFound` when it does not exist
    async fn delete<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<()>;
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Created => write!(f, "created"),
            OperationResult::Updated => write!(f, "updated"),
            OperationResult::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Log the outcome of an upsert for the given object type
pub fn log_operation_result(object: &str, name: &str, result: OperationResult) {
    match result {
        OperationResult::Created | OperationResult::Updated => {
            info!("{} {} {}", object, name, result)
        }
        OperationResult::Unchanged => debug!("{} {} {}", object, name, result),
    }
}

/// Create `obj` or bring the stored copy in line with it.
///
/// `mutate` is applied to the stored object (or to `obj` when absent); the result is
/// only written when it differs from what is stored. A create that loses a race
/// against another writer falls back to the update path once, and an object deleted
/// between fetch and update is created again.
pub async fn create_or_update<K, S, F>(store: &S, obj: K, mutate: F) -> Result<OperationResult>
where
    K: StoreObject,
    S: ObjectStore + ?Sized,
    F: Fn(&mut K) + Send + Sync,
{
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    if let Some(current) = store.get::<K>(&name, &namespace).await? {
        return update_if_changed(store, current, &mutate).await;
    }

    let mut desired = obj;
    mutate(&mut desired);

    match store.create(&desired).await {
        Ok(_) => Ok(OperationResult::Created),
        Err(e) if e.is_already_exists() => {
            debug!(
                "{} {}/{} appeared concurrently, updating instead",
                kind_of::<K>(),
                namespace,
                name
            );
            let Some(current) = store.get::<K>(&name, &namespace).await? else {
                return Err(e);
            };
            update_if_changed(store, current, &mutate).await
        }
        Err(e) => Err(e),
    }
}

async fn update_if_changed<K, S, F>(store: &S, current: K, mutate: &F) -> Result<OperationResult>
where
    K: StoreObject,
    S: ObjectStore + ?Sized,
    F: Fn(&mut K) + Send + Sync,
{
    let mut desired = current.clone();
    mutate(&mut desired);

    if serde_json::to_value(&desired)? == serde_json::to_value(&current)? {
        return Ok(OperationResult::Unchanged);
    }

    match store.update(&desired).await {
        Ok(_) => Ok(OperationResult::Updated),
        Err(e) if e.is_not_found() => {
            debug!(
                "{} {}/{} disappeared before update, creating it again",
                kind_of::<K>(),
                desired.namespace().unwrap_or_default(),
                desired.name_any()
            );
            let meta = desired.meta_mut();
            meta.resource_version = None;
            meta.uid = None;
            meta.creation_timestamp = None;
            store.create(&desired).await?;
            Ok(OperationResult::Created)
        }
        Err(e) => Err(e),
    }
}

/// Delete an object, treating an absent one as deleted.
///
/// Returns whether an object was actually removed.
pub async fn delete_if_exists<K, S>(store: &S, name: &str, namespace: &str) -> Result<bool>
where
    K: StoreObject,
    S: ObjectStore + ?Sized,
{
    match store.delete::<K>(name, namespace).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

pub(crate) fn not_found<K: StoreObject>(name: &str, namespace: &str) -> AddonError {
    AddonError::NotFound {
        kind: kind_of::<K>(),
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}
