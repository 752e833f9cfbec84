//! Process-wide outbound network defaults.
//!
//! The worker applies a minimum TLS version and an advisory outbound connection
//! ceiling once at startup. Applying them builds the shared outbound HTTP client that
//! collaborators (for example a future queue consumer) obtain through
//! [`outbound_client`]. The defaults are advisory: nothing in this crate checks
//! that collaborators actually use the shared client.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum TLS protocol version for outbound connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinTlsVersion {
    #[default]
    Tls12,
    Tls13,
}

impl MinTlsVersion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MinTlsVersion::Tls12 => "1.2",
            MinTlsVersion::Tls13 => "1.3",
        }
    }

    fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            MinTlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
            MinTlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

impl fmt::Display for MinTlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinTlsVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(MinTlsVersion::Tls12),
            "1.3" => Ok(MinTlsVersion::Tls13),
            other => Err(format!("unsupported TLS version '{other}', expected 1.2 or 1.3")),
        }
    }
}

/// Default outbound connection ceiling.
pub const DEFAULT_MAX_OUTBOUND_CONNECTIONS: usize = 12;

/// Network defaults applied once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkDefaults {
    /// Lowest TLS version outbound connections may negotiate (default: 1.2).
    pub min_tls_version: MinTlsVersion,
    /// Advisory outbound connection ceiling (default: 12).
    ///
    /// Applied as the client's idle pool cap per host. It bounds how many
    /// idle connections are kept for reuse, not how many may be open at once.
    pub max_outbound_connections: usize,
}

impl Default for NetworkDefaults {
    fn default() -> Self {
        Self {
            min_tls_version: MinTlsVersion::Tls12,
            max_outbound_connections: DEFAULT_MAX_OUTBOUND_CONNECTIONS,
        }
    }
}

#[derive(Debug, Error)]
pub enum NetworkDefaultsError {
    #[error("Network defaults already applied for this process")]
    AlreadyApplied,

    #[error("Outbound connection limit must be greater than zero")]
    InvalidConnectionLimit,

    #[error("Failed to build outbound HTTP client: {0}")]
    ClientBuild(String),
}

/// State installed by [`NetworkDefaults::apply`].
#[derive(Debug)]
pub struct AppliedNetwork {
    pub defaults: NetworkDefaults,
    pub client: reqwest::Client,
}

static APPLIED: OnceLock<AppliedNetwork> = OnceLock::new();

impl NetworkDefaults {
    /// Build an outbound client honoring these defaults.
    pub fn build_client(&self) -> Result<reqwest::Client, NetworkDefaultsError> {
        if self.max_outbound_connections == 0 {
            return Err(NetworkDefaultsError::InvalidConnectionLimit);
        }

        reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(self.min_tls_version.to_reqwest())
            .pool_max_idle_per_host(self.max_outbound_connections)
            .build()
            .map_err(|e| NetworkDefaultsError::ClientBuild(e.to_string()))
    }

    /// Install these defaults for the whole process.
    ///
    /// Succeeds at most once per process; later calls return
    /// [`NetworkDefaultsError::AlreadyApplied`] and leave the installed
    /// defaults untouched.
    pub fn apply(&self) -> Result<&'static AppliedNetwork, NetworkDefaultsError> {
        if APPLIED.get().is_some() {
            return Err(NetworkDefaultsError::AlreadyApplied);
        }

        let client = self.build_client()?;
        let mut installed = false;
        let applied = APPLIED.get_or_init(|| {
            installed = true;
            AppliedNetwork {
                defaults: *self,
                client,
            }
        });

        if installed {
            Ok(applied)
        } else {
            Err(NetworkDefaultsError::AlreadyApplied)
        }
    }
}

/// Defaults installed for this process, if any.
#[must_use]
pub fn applied_defaults() -> Option<NetworkDefaults> {
    APPLIED.get().map(|applied| applied.defaults)
}

/// Shared outbound client configured by the process network defaults.
#[must_use]
pub fn outbound_client() -> Option<&'static reqwest::Client> {
    APPLIED.get().map(|applied| &applied.client)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_worker_policy() {
        let defaults = NetworkDefaults::default();
        assert_eq!(defaults.min_tls_version, MinTlsVersion::Tls12);
        assert_eq!(defaults.max_outbound_connections, 12);
    }

    #[test]
    fn test_min_tls_version_parsing() {
        assert_eq!("1.2".parse::<MinTlsVersion>(), Ok(MinTlsVersion::Tls12));
        assert_eq!(" 1.3 ".parse::<MinTlsVersion>(), Ok(MinTlsVersion::Tls13));
        assert!("1.1".parse::<MinTlsVersion>().is_err());
        assert!("tls12".parse::<MinTlsVersion>().is_err());
    }

    #[test]
    fn test_build_client_rejects_zero_connection_limit() {
        let defaults = NetworkDefaults {
            max_outbound_connections: 0,
            ..NetworkDefaults::default()
        };

        assert!(matches!(
            defaults.build_client(),
            Err(NetworkDefaultsError::InvalidConnectionLimit)
        ));
    }

    #[test]
    fn test_connection_ceiling_is_an_idle_cap_not_a_hard_limit() {
        // Any positive ceiling builds; it only bounds the idle pool
        let defaults = NetworkDefaults {
            max_outbound_connections: 1,
            ..NetworkDefaults::default()
        };
        assert!(defaults.build_client().is_ok());
    }

    #[test]
    fn test_build_client_succeeds_for_both_tls_floors() {
        for version in [MinTlsVersion::Tls12, MinTlsVersion::Tls13] {
            let defaults = NetworkDefaults {
                min_tls_version: version,
                ..NetworkDefaults::default()
            };
            assert!(defaults.build_client().is_ok(), "TLS {version} should build");
        }
    }

    #[test]
    fn test_apply_installs_once() {
        // Other tests in this binary may have applied defaults first, so only
        // the second call's outcome is deterministic.
        let _ = NetworkDefaults::default().apply();

        assert!(outbound_client().is_some());
        assert!(applied_defaults().is_some());
        assert!(matches!(
            NetworkDefaults::default().apply(),
            Err(NetworkDefaultsError::AlreadyApplied)
        ));
    }
}
