//! Namespace Module
//!
//! The closed set of cache partitions and their per-namespace settings.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

// == Namespace ==
/// Logical partition of the cache keyspace.
///
/// Each namespace owns an independent backing store; the same key in two
/// namespaces addresses two unrelated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Default,
    User,
    Content,
    Api,
    System,
}

impl Namespace {
    /// Number of namespaces.
    pub const COUNT: usize = 5;

    /// Every namespace, in a stable order.
    pub const ALL: [Namespace; Self::COUNT] = [
        Namespace::Default,
        Namespace::User,
        Namespace::Content,
        Namespace::Api,
        Namespace::System,
    ];

    /// Returns the wire name of the namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Default => "default",
            Namespace::User => "user",
            Namespace::Content => "content",
            Namespace::Api => "api",
            Namespace::System => "system",
        }
    }

    /// Position of the namespace in `Namespace::ALL`.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Looks up a namespace by exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == name)
    }

    // == Resolve ==
    /// Maps a caller-supplied name to a namespace, falling back to
    /// `Namespace::Default` for unknown names.
    pub fn resolve(name: &str) -> Self {
        match Self::from_name(name) {
            Some(ns) => ns,
            None => {
                debug!(namespace = name, "Unknown cache namespace, using default");
                Namespace::Default
            }
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::resolve(name)
    }
}

// == Namespace Settings ==
/// TTL policy and sweep cadence for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceSettings {
    /// TTL in seconds applied when `set` is called without one
    pub default_ttl: u64,
    /// Interval in seconds between expiry sweeps
    pub check_period: u64,
}

impl NamespaceSettings {
    pub fn new(default_ttl: u64, check_period: u64) -> Self {
        Self {
            default_ttl,
            check_period,
        }
    }

    /// Built-in settings: short TTLs with frequent sweeps for per-user data,
    /// long TTLs with lazy sweeps for near-static content.
    pub fn defaults_for(namespace: Namespace) -> Self {
        match namespace {
            Namespace::Default => Self::new(300, 60),
            Namespace::User => Self::new(60, 15),
            Namespace::Content => Self::new(3600, 600),
            Namespace::Api => Self::new(600, 120),
            Namespace::System => Self::new(86_400, 3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_names() {
        for ns in Namespace::ALL {
            assert_eq!(Namespace::resolve(ns.as_str()), ns);
        }
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_default() {
        assert_eq!(Namespace::resolve("sessions"), Namespace::Default);
        assert_eq!(Namespace::resolve(""), Namespace::Default);
        assert_eq!(Namespace::resolve("USER"), Namespace::Default);
    }

    #[test]
    fn test_from_name_is_strict() {
        assert_eq!(Namespace::from_name("content"), Some(Namespace::Content));
        assert_eq!(Namespace::from_name("contents"), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Namespace::Api).unwrap();
        assert_eq!(json, "\"api\"");
    }

    #[test]
    fn test_user_namespace_sweeps_more_often_than_content() {
        let user = NamespaceSettings::defaults_for(Namespace::User);
        let content = NamespaceSettings::defaults_for(Namespace::Content);
        assert!(user.check_period < content.check_period);
        assert!(user.default_ttl < content.default_ttl);
    }
}
