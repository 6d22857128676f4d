// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed Kubernetes resources managed or read by the addons manager.

pub mod app;
pub mod cluster;
pub mod package;

pub use app::{App, AppSpec};
pub use cluster::{Cluster, KubeconfigSecretRef};
pub use package::{PackageInstall, PackageInstallSpec, PackageRepository, PackageRepositorySpec};
