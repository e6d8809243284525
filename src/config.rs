//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use crate::cache::{Namespace, NamespaceSettings};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL policy per namespace
    pub namespaces: BTreeMap<Namespace, NamespaceSettings>,
    /// Seconds between cache hit-rate log lines
    pub stats_report_interval: u64,
    /// Whether the reporter zeroes the operation counters after logging
    pub stats_reset_on_report: bool,
    /// Seconds between process memory/CPU samples
    pub resource_sample_interval: u64,
    /// Bearer token for the admin endpoints; `None` disables them
    pub admin_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_<NAMESPACE>_TTL` - Default TTL in seconds for a namespace
    ///   (e.g. `CACHE_USER_TTL`)
    /// - `CACHE_<NAMESPACE>_CHECK_PERIOD` - Sweep interval in seconds
    /// - `STATS_REPORT_INTERVAL` - Hit-rate log interval in seconds (default: 3600)
    /// - `STATS_RESET_ON_REPORT` - Reset counters after each report (default: false)
    /// - `RESOURCE_SAMPLE_INTERVAL` - Memory/CPU sample interval in seconds (default: 30)
    /// - `ADMIN_TOKEN` - Admin bearer token (default: unset, admin routes disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let namespaces = Namespace::ALL
            .into_iter()
            .map(|ns| {
                let builtin = NamespaceSettings::defaults_for(ns);
                let prefix = format!("CACHE_{}", ns.as_str().to_uppercase());
                let settings = NamespaceSettings::new(
                    env_or(&format!("{prefix}_TTL"), builtin.default_ttl),
                    env_or(&format!("{prefix}_CHECK_PERIOD"), builtin.check_period),
                );
                (ns, settings)
            })
            .collect();

        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            namespaces,
            stats_report_interval: env_or("STATS_REPORT_INTERVAL", defaults.stats_report_interval),
            stats_reset_on_report: env_or("STATS_RESET_ON_REPORT", defaults.stats_reset_on_report),
            resource_sample_interval: env_or(
                "RESOURCE_SAMPLE_INTERVAL",
                defaults.resource_sample_interval,
            ),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|token| !token.is_empty()),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            namespaces: Namespace::ALL
                .into_iter()
                .map(|ns| (ns, NamespaceSettings::defaults_for(ns)))
                .collect(),
            stats_report_interval: 3600,
            stats_reset_on_report: false,
            resource_sample_interval: 30,
            admin_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.stats_report_interval, 3600);
        assert!(!config.stats_reset_on_report);
        assert_eq!(config.resource_sample_interval, 30);
        assert!(config.admin_token.is_none());
        assert_eq!(config.namespaces.len(), Namespace::COUNT);
        assert_eq!(
            config.namespaces[&Namespace::Content],
            NamespaceSettings::defaults_for(Namespace::Content)
        );
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the process environment to avoid races.
        env::remove_var("SERVER_PORT");
        env::remove_var("STATS_RESET_ON_REPORT");
        env::remove_var("ADMIN_TOKEN");
        env::remove_var("CACHE_USER_TTL");
        env::remove_var("CACHE_USER_CHECK_PERIOD");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(!config.stats_reset_on_report);
        assert!(config.admin_token.is_none());

        env::set_var("CACHE_USER_TTL", "45");
        env::set_var("CACHE_USER_CHECK_PERIOD", "not-a-number");
        env::set_var("STATS_RESET_ON_REPORT", "true");
        env::set_var("ADMIN_TOKEN", "");

        let config = Config::from_env();
        let user = config.namespaces[&Namespace::User];
        assert_eq!(user.default_ttl, 45);
        assert_eq!(
            user.check_period,
            NamespaceSettings::defaults_for(Namespace::User).check_period
        );
        assert!(config.stats_reset_on_report);
        assert!(config.admin_token.is_none());

        env::remove_var("CACHE_USER_TTL");
        env::remove_var("CACHE_USER_CHECK_PERIOD");
        env::remove_var("STATS_RESET_ON_REPORT");
        env::remove_var("ADMIN_TOKEN");
    }
}
