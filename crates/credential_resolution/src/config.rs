//! Resolution configuration
//!
//! Loaded from an optional TOML file overlaid with `NAMECRED_*` environment
//! variables; nested keys use `__` (`NAMECRED_REGISTRY__MIN_COMMITMENT_AGE_SECS`).

use crate::client::DEFAULT_MAX_ROUND_TRIPS;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use namecred_dns_wire::{IdentifierExtractor, MAX_LABEL_LEN};
use namecred_namespace_registry::RegistryConfig;
use namecred_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "NAMECRED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Label separating the identifier from the rest of the name
    pub marker_label: String,
    /// Terminal label of every resolvable name
    pub suffix_label: String,
    pub router_address: Address,
    pub gateway_urls: Vec<String>,
    pub max_round_trips: usize,
    /// Per-fetch timeout; unset waits indefinitely
    pub gateway_timeout_ms: Option<u64>,
    pub registry: RegistryConfig,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            marker_label: "name".to_string(),
            suffix_label: "eth".to_string(),
            router_address: Address::ZERO,
            gateway_urls: Vec::new(),
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            gateway_timeout_ms: None,
            registry: RegistryConfig::default(),
        }
    }
}

impl ResolutionConfig {
    /// Load from `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`ResolutionConfig::load`], reading environment variables from
    /// `env` instead of the process when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("gateway_urls")
                .try_parsing(true)
                .source(env),
        );

        let config: ResolutionConfig = builder
            .build()
            .context("failed to read resolution configuration")?
            .try_deserialize()
            .context("invalid resolution configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, label) in [("marker_label", &self.marker_label), ("suffix_label", &self.suffix_label)] {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                bail!("{field} must be 1..={MAX_LABEL_LEN} bytes, got {:?}", label);
            }
        }
        if self.max_round_trips == 0 {
            bail!("max_round_trips must be at least 1");
        }
        if self.gateway_timeout_ms == Some(0) {
            bail!("gateway_timeout_ms must be positive when set");
        }
        self.registry
            .validate()
            .context("invalid registry configuration")?;
        Ok(())
    }

    pub fn extractor(&self) -> Result<IdentifierExtractor> {
        IdentifierExtractor::new(self.marker_label.as_bytes(), self.suffix_label.as_bytes())
            .context("invalid marker or suffix label")
    }
}
