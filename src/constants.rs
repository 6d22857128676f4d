// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Labels identifying an addon request secret
pub mod labels {
    /// Name of the addon, e.g. "antrea"
    pub const ADDON_NAME: &str = "tkg.tanzu.vmware.com/addon-name";
    /// Name of the cluster owning the addon
    pub const CLUSTER_NAME: &str = "tkg.tanzu.vmware.com/cluster-name";
}

/// Annotation keys read from requests and written on derived objects
pub mod annotations {
    /// Boolean flag, "true" routes the addon through a remote App on the management cluster
    pub const REMOTE_APP: &str = "tkg.tanzu.vmware.com/remote-app";
    /// Presence pauses reconciliation of the addon
    pub const PAUSED: &str = "tkg.tanzu.vmware.com/addon-paused";
    /// "{category}/{addon}" on derived objects
    pub const ADDON_TYPE: &str = "tkg.tanzu.vmware.com/addon-type";
    /// Name of the originating addon request
    pub const ADDON_NAME: &str = "tkg.tanzu.vmware.com/addon-name";
    /// Namespace of the originating addon request
    pub const ADDON_NAMESPACE: &str = "tkg.tanzu.vmware.com/addon-namespace";
}

/// Secret type carried by addon requests
pub const ADDON_SECRET_TYPE: &str = "tkg.tanzu.vmware.com/addon";

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "addons-manager";

/// Finalizer holding addon requests until their derived objects are removed
pub const FINALIZER: &str = "addon.tkg.tanzu.vmware.com";

/// Suffix of the data values secret paired with each App/PackageInstall
pub const DATA_VALUES_SUFFIX: &str = "-data-values";

/// Key of the synthesized image info document in the data values secret
pub const IMAGE_INFO_KEY: &str = "imageInfo.yaml";

/// Header marking a document as ytt data values
pub const DATA_VALUE_HEADER: &str =
    "#@data/values\n#@overlay/match-child-defaults missing_ok=True\n---\n";

/// ytt annotation lines rejected by the packaging values schema
pub const DATA_VALUE_ANNOTATIONS: &[&str] = &[
    "#@data/values",
    "#@overlay/match-child-defaults missing_ok=True",
];

/// YAML document separator closing the data values header
pub const DOCUMENT_SEPARATOR: &str = "---";

/// BOM entries for the core package repository bundle
pub mod bom {
    pub const CORE_PACKAGE_REPOSITORY_COMPONENT: &str = "tkg-core-packages";
    pub const CORE_PACKAGE_REPOSITORY_IMAGE: &str = "tanzuCorePackageRepositoryImage";
    /// Key holding the BOM document in its ConfigMap
    pub const CONFIG_MAP_KEY: &str = "bomContent";
}

/// Cluster API kubeconfig secret conventions
pub mod kubeconfig {
    pub const SECRET_SUFFIX: &str = "-kubeconfig";
    pub const SECRET_KEY: &str = "value";
}

/// Fixed kapp/ytt options
pub mod templating {
    /// Sub-path of an imgpkg bundle holding the ytt configuration
    pub const BUNDLE_CONFIG_PATH: &str = "config";
    /// Inputs of the kbld pass: rendered stdin plus the bundle's image lock
    pub const KBLD_PATHS: &[&str] = &["-", ".imgpkg/images.yml"];
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
