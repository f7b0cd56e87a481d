//! Configuration for the composition resolver.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `COMPOSITION_RESOLVER__EDGE__ORIGIN_PORT`.
pub const ENV_PREFIX: &str = "COMPOSITION_RESOLVER__";

/// Configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionResolverConfig {
    /// Edge network facts used for load-balanced origins.
    pub edge: EdgeNetworkConfig,
}

/// The edge network as seen from a private origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeNetworkConfig {
    /// Managed prefix list of the edge's origin-facing addresses.
    pub origin_facing_prefix_list: String,
    /// Port opened on load-balanced origins.
    pub origin_port: u16,
    /// Protocol of the inbound rule.
    pub protocol: String,
}

impl Default for EdgeNetworkConfig {
    fn default() -> Self {
        Self {
            origin_facing_prefix_list: "com.amazonaws.global.cloudfront.origin-facing".to_owned(),
            origin_port: 80,
            protocol: "tcp".to_owned(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load composition resolver config: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl CompositionResolverConfig {
    /// Layer defaults, the optional YAML file at `path` and
    /// [`ENV_PREFIX`]-prefixed environment variables, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a layer cannot be read or a key is
    /// unknown or mistyped.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = CompositionResolverConfig::load(None).unwrap();
            assert_eq!(config, CompositionResolverConfig::default());
            assert_eq!(config.edge.origin_port, 80);
            assert_eq!(config.edge.protocol, "tcp");
            Ok(())
        });
    }

    #[test]
    fn yaml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "resolver.yaml",
                "edge:\n  origin_port: 8080\n  protocol: udp\n",
            )?;
            jail.set_env("COMPOSITION_RESOLVER__EDGE__PROTOCOL", "tcp");

            let config = CompositionResolverConfig::load(Some(Path::new("resolver.yaml"))).unwrap();
            assert_eq!(config.edge.origin_port, 8080);
            assert_eq!(config.edge.protocol, "tcp");
            assert_eq!(
                config.edge.origin_facing_prefix_list,
                EdgeNetworkConfig::default().origin_facing_prefix_list
            );
            Ok(())
        });
    }

    #[test]
    fn missing_file_keeps_defaults() {
        Jail::expect_with(|_jail| {
            let config = CompositionResolverConfig::load(Some(Path::new("absent.yaml"))).unwrap();
            assert_eq!(config, CompositionResolverConfig::default());
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("resolver.yaml", "edge:\n  port: 443\n")?;
            let err = CompositionResolverConfig::load(Some(Path::new("resolver.yaml"))).unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
