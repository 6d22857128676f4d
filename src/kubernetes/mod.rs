// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, workload client creation and addon RBAC bootstrap.

pub mod bootstrap;
pub mod client;
pub mod crd;

pub use bootstrap::{ensure_addon_rbac, ensure_namespace_exists};
pub use client::create_workload_client;
pub use crd::wait_for_cluster_crd;
