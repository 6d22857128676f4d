// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API, an in-memory object store and fixtures.

use crate::constants::{labels, ADDON_SECRET_TYPE};
use crate::error::{AddonError, Result};
use crate::store::{kind_of, not_found, ObjectStore, StoreObject};
use crate::types::cluster::{Cluster, ClusterSpec};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, Resource, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "https://kubernetes.default.svc")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Try prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) =
                response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Status response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": if code >= 400 { "Failure" } else { "Success" },
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// A store call as recorded by `MemoryStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub operation: &'static str,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl StoreCall {
    pub fn new(operation: &'static str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            operation,
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

type ObjectKey = (String, String, String);

/// In-memory `ObjectStore` recording every call.
///
/// Objects are kept as JSON. Every write bumps `resourceVersion`, and updates carrying
/// a stale version are rejected with `Conflict`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<ObjectKey, serde_json::Value>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<Vec<(&'static str, String)>>,
    version: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `operation` on `kind` fail with a server error
    pub fn fail_on(&self, operation: &'static str, kind: &str) {
        self.failures
            .lock()
            .unwrap()
            .push((operation, kind.to_string()));
    }

    /// Seed an object without recording a call
    pub fn insert<K: StoreObject>(&self, obj: &K) {
        let mut obj = obj.clone();
        obj.meta_mut().resource_version = Some(self.next_version());
        let key = key_of::<K>(&obj.name_any(), &obj.namespace().unwrap_or_default());
        self.objects
            .lock()
            .unwrap()
            .insert(key, serde_json::to_value(&obj).unwrap());
    }

    /// Read an object without recording a call
    pub fn object<K: StoreObject>(&self, name: &str, namespace: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&key_of::<K>(name, namespace))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Drop an object without recording a call
    pub fn remove<K: StoreObject>(&self, name: &str, namespace: &str) {
        self.objects
            .lock()
            .unwrap()
            .remove(&key_of::<K>(name, namespace));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls of one operation
    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Recorded mutating calls (create/update/delete)
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation != "get")
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn next_version(&self) -> String {
        let mut version = self.version.lock().unwrap();
        *version += 1;
        version.to_string()
    }

    fn record<K: StoreObject>(&self, operation: &'static str, name: &str, namespace: &str) -> Result<()> {
        let kind = kind_of::<K>();
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::new(operation, &kind, namespace, name));

        let failing = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|(op, k)| *op == operation && *k == kind);
        if failing {
            return Err(AddonError::Store {
                operation,
                kind,
                name: format!("{}/{}", namespace, name),
                source: kube::Error::Api(ErrorResponse {
                    status: "Failure".to_string(),
                    message: "injected failure".to_string(),
                    reason: "InternalError".to_string(),
                    code: 500,
                }),
            });
        }
        Ok(())
    }
}

fn key_of<K: StoreObject>(name: &str, namespace: &str) -> ObjectKey {
    (kind_of::<K>(), namespace.to_string(), name.to_string())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<Option<K>> {
        self.record::<K>("get", name, namespace)?;
        Ok(self.object(name, namespace))
    }

    async fn create<K: StoreObject>(&self, obj: &K) -> Result<K> {
        let name = obj.name_any();
        let namespace = obj.namespace().unwrap_or_default();
        self.record::<K>("create", &name, &namespace)?;

        let key = key_of::<K>(&name, &namespace);
        if self.objects.lock().unwrap().contains_key(&key) {
            return Err(AddonError::AlreadyExists {
                kind: kind_of::<K>(),
                name,
                namespace,
            });
        }

        let mut created = obj.clone();
        created.meta_mut().resource_version = Some(self.next_version());
        self.objects
            .lock()
            .unwrap()
            .insert(key, serde_json::to_value(&created)?);
        Ok(created)
    }

    async fn update<K: StoreObject>(&self, obj: &K) -> Result<K> {
        let name = obj.name_any();
        let namespace = obj.namespace().unwrap_or_default();
        self.record::<K>("update", &name, &namespace)?;

        let Some(current) = self.object::<K>(&name, &namespace) else {
            return Err(not_found::<K>(&name, &namespace));
        };
        if current.resource_version() != obj.resource_version() {
            return Err(AddonError::Conflict {
                kind: kind_of::<K>(),
                name,
                namespace,
            });
        }

        let mut updated = obj.clone();
        updated.meta_mut().resource_version = Some(self.next_version());
        self.objects.lock().unwrap().insert(
            key_of::<K>(&name, &namespace),
            serde_json::to_value(&updated)?,
        );
        Ok(updated)
    }

    async fn delete<K: StoreObject>(&self, name: &str, namespace: &str) -> Result<()> {
        self.record::<K>("delete", name, namespace)?;

        match self
            .objects
            .lock()
            .unwrap()
            .remove(&key_of::<K>(name, namespace))
        {
            Some(_) => Ok(()),
            None => Err(not_found::<K>(name, namespace)),
        }
    }
}

/// An addon request secret for `addon` owned by `cluster`
pub fn addon_request(name: &str, namespace: &str, addon: &str, cluster: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([
                (labels::ADDON_NAME.to_string(), addon.to_string()),
                (labels::CLUSTER_NAME.to_string(), cluster.to_string()),
            ])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "values.yaml".to_string(),
            ByteString(
                b"#@data/values\n#@overlay/match-child-defaults missing_ok=True\n---\nantrea:\n  config:\n    serviceCidr: 100.64.0.0/13\n"
                    .to_vec(),
            ),
        )])),
        type_: Some(ADDON_SECRET_TYPE.to_string()),
        ..Default::default()
    }
}

pub fn cluster(name: &str, namespace: &str) -> Cluster {
    Cluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: ClusterSpec::default(),
        status: None,
    }
}

/// BOM with a legacy antrea entry, a templates image reference and core packages
pub const TEST_BOM: &str = r#"
imageConfig:
  imageRepository: projects.registry.vmware.com/tkg
components:
  tkg-core-packages:
  - version: v1.4.0
    images:
      antrea.tanzu.vmware.com:
        imagePath: packages/core/antrea
        tag: v0.13.3
      tanzuCorePackageRepositoryImage:
        imagePath: packages/core/repo
        tag: v1.4.0
  tanzu_core_addons:
  - version: v1.3.1
    images:
      calicoTemplatesImage:
        imagePath: tanzu_core/addons/calico-templates
        tag: v1.3.1
  antrea:
  - version: v0.11.3
    images:
      antreaImage:
        imagePath: antrea/antrea-debian
        tag: v0.11.3_vmware.2
addons:
  antrea:
    category: cni
    templatesImagePath: addons/antrea-templates
    templatesImageTag: 98adbf4
    addonContainerImages:
    - componentRef: antrea
      imageRefs: [antreaImage]
  antrea-package:
    category: cni
    packageName: antrea.tanzu.vmware.com
  calico:
    category: cni
    addonTemplatesImage:
    - componentRef: tanzu_core_addons
      imageRefs: [calicoTemplatesImage]
"#;
