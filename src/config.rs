// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// How often kapp-controller re-syncs an App
    pub app_sync_period: Duration,
    /// Maximum time kapp waits for an App deployment
    pub app_wait_timeout: Duration,
    /// Namespace hosting local Apps/PackageInstalls
    pub addon_namespace: String,
    /// Service account local Apps/PackageInstalls deploy with
    pub service_account: String,
    pub cluster_role: String,
    pub cluster_role_binding: String,
    pub image_pull_policy: String,
    /// Name of the core PackageRepository in the addon namespace
    pub core_package_repository_name: String,
    /// ConfigMap holding the BOM
    pub bom_config_map: String,
    pub bom_namespace: String,
    pub testing_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_sync_period: Duration::from_secs(300),
            app_wait_timeout: Duration::from_secs(300),
            addon_namespace: "tkg-system".to_string(),
            service_account: "tkg-addons-app-sa".to_string(),
            cluster_role: "tkg-addons-app-cluster-role".to_string(),
            cluster_role_binding: "tkg-addons-app-cluster-role-binding".to_string(),
            image_pull_policy: "IfNotPresent".to_string(),
            core_package_repository_name: "core".to_string(),
            bom_config_map: "tkg-bom".to_string(),
            bom_namespace: "tkg-system".to_string(),
            testing_mode: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let app_sync_period = duration_var("APP_SYNC_PERIOD_SECS")?.unwrap_or(defaults.app_sync_period);
        let app_wait_timeout =
            duration_var("APP_WAIT_TIMEOUT_SECS")?.unwrap_or(defaults.app_wait_timeout);
        // For testing, uses the KUBECONFIG env var to create workload clients instead of fetching kubeconfig from secrets
        let testing_mode: bool = env::var("TESTING_MODE").unwrap_or("false".to_string()).parse().unwrap_or(false);

        Ok(Config {
            app_sync_period,
            app_wait_timeout,
            addon_namespace: env::var("ADDON_NAMESPACE").unwrap_or(defaults.addon_namespace),
            service_account: env::var("ADDON_SERVICE_ACCOUNT").unwrap_or(defaults.service_account),
            cluster_role: env::var("ADDON_CLUSTER_ROLE").unwrap_or(defaults.cluster_role),
            cluster_role_binding: env::var("ADDON_CLUSTER_ROLE_BINDING")
                .unwrap_or(defaults.cluster_role_binding),
            image_pull_policy: env::var("ADDON_IMAGE_PULL_POLICY")
                .unwrap_or(defaults.image_pull_policy),
            core_package_repository_name: env::var("CORE_PACKAGE_REPOSITORY_NAME")
                .unwrap_or(defaults.core_package_repository_name),
            bom_config_map: env::var("BOM_CONFIG_MAP").unwrap_or(defaults.bom_config_map),
            bom_namespace: env::var("BOM_NAMESPACE").unwrap_or(defaults.bom_namespace),
            testing_mode,
        })
    }
}

fn duration_var(name: &str) -> Result<Option<Duration>> {
    match env::var(name) {
        Ok(v) => {
            let secs: u64 = v
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", name, v))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

/// Render a duration the way kapp and the Kubernetes API parse it, e.g. "300s"
pub fn format_duration(d: Duration) -> String {
    format!("{}s", d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_whole_seconds() {
        assert_eq!(format_duration(Duration::from_secs(300)), "300s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.addon_namespace, "tkg-system");
        assert_eq!(config.service_account, "tkg-addons-app-sa");
        assert_eq!(config.image_pull_policy, "IfNotPresent");
    }
}
