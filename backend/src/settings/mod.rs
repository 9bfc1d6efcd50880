//! Gateway configuration.
//!
//! Listener, routing and policy values load through OrthoConfig under the
//! `DDX` prefix. Vendor credentials and endpoints are read separately through
//! [`mockable::Env`] in [`vendor`]. Both are read once at startup.
//!
//! Earlier deployments configured the listener with unprefixed names
//! (`PORT`, `DEFAULT_PROVIDER`, `PROVIDERS_ENABLED`, `BATCH_CONCURRENCY`,
//! `ALLOW_PHI`) and the Isabel path with `ISABEL_DDX_PATH`. These are still
//! honoured when the current name is unset; see
//! [`GatewaySettings::with_legacy_env`]. A warning is logged for each one.

mod vendor;

use std::time::Duration;

use mockable::Env;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::domain::{DEFAULT_BATCH_CONCURRENCY, RegistryConfig};
use crate::outbound::VendorClientError;
use crate::outbound::local_rules::LOCAL_RULES;

pub use vendor::{ProviderSettings, VendorDefaults, VendorSettings, parse_bool};

const DEFAULT_PORT: u16 = 8888;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

const LEGACY_PORT: &str = "PORT";
const LEGACY_DEFAULT_PROVIDER: &str = "DEFAULT_PROVIDER";
const LEGACY_PROVIDERS_ENABLED: &str = "PROVIDERS_ENABLED";
const LEGACY_BATCH_CONCURRENCY: &str = "BATCH_CONCURRENCY";
const LEGACY_ALLOW_PHI: &str = "ALLOW_PHI";

/// Errors raised while turning configuration into runtime objects.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A URL-valued variable does not parse.
    #[error("invalid value for {name}='{value}': {reason}")]
    InvalidUrl {
        name: String,
        value: String,
        reason: String,
    },
    /// A vendor client could not be built from its settings.
    #[error("failed to configure {provider} client: {source}")]
    Client {
        provider: &'static str,
        #[source]
        source: VendorClientError,
    },
}

/// Listener and routing settings.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DDX")]
pub struct GatewaySettings {
    /// TCP port to listen on.
    pub port: Option<u16>,
    /// Interface to bind.
    pub bind_host: Option<String>,
    /// Provider used when a request names none.
    pub default_provider: Option<String>,
    /// Provider allow-list, given as a comma-separated value in the
    /// environment; empty enables every provider.
    #[serde(default, deserialize_with = "name_or_names")]
    pub providers_enabled: Option<Vec<String>>,
    /// Worker count for batch requests.
    pub batch_concurrency: Option<usize>,
    /// Accept cases not flagged as de-identified.
    #[ortho_config(default = false)]
    pub allow_phi: bool,
    /// Per-request vendor timeout in seconds.
    pub upstream_timeout_secs: Option<u64>,
}

impl GatewaySettings {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn bind_host(&self) -> &str {
        self.bind_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .unwrap_or(DEFAULT_BIND_HOST)
    }

    pub fn default_provider(&self) -> &str {
        self.default_provider
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(LOCAL_RULES)
    }

    /// Parsed allow-list with blanks dropped.
    pub fn providers_enabled(&self) -> Vec<String> {
        self.providers_enabled
            .iter()
            .flatten()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Batch worker count, never below one.
    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY)
            .max(1)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            enabled: self.providers_enabled(),
            default: self.default_provider().to_owned(),
        }
    }

    /// Fill unset values from the unprefixed variable names used by older
    /// deployments.
    ///
    /// `DDX_*` values always win. Unparseable legacy values are ignored with
    /// a warning.
    #[must_use]
    pub fn with_legacy_env<E: Env>(mut self, env: &E) -> Self {
        if self.port.is_none() {
            self.port =
                legacy_value(env, LEGACY_PORT).and_then(|raw| parse_legacy(LEGACY_PORT, &raw));
        }
        if self.default_provider.is_none() {
            self.default_provider = legacy_value(env, LEGACY_DEFAULT_PROVIDER);
        }
        if self.providers_enabled.is_none() {
            self.providers_enabled =
                legacy_value(env, LEGACY_PROVIDERS_ENABLED).map(|raw| vec![raw]);
        }
        if self.batch_concurrency.is_none() {
            self.batch_concurrency = legacy_value(env, LEGACY_BATCH_CONCURRENCY)
                .and_then(|raw| parse_legacy(LEGACY_BATCH_CONCURRENCY, &raw));
        }
        if !self.allow_phi {
            self.allow_phi = legacy_value(env, LEGACY_ALLOW_PHI)
                .and_then(|raw| parse_bool(&raw))
                .unwrap_or(false);
        }
        self
    }
}

/// A single name arrives as a string, several as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum NameList {
    One(String),
    Many(Vec<String>),
}

fn name_or_names<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<NameList>::deserialize(deserializer)?.map(|names| match names {
            NameList::One(name) => vec![name],
            NameList::Many(names) => names,
        }),
    )
}

fn legacy_value<E: Env>(env: &E, name: &'static str) -> Option<String> {
    let value = env
        .string(name)
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())?;
    warn!(variable = name, replacement = %format!("DDX_{name}"), "deprecated variable in use");
    Some(value)
}

fn parse_legacy<T: std::str::FromStr>(name: &'static str, raw: &str) -> Option<T> {
    raw.parse().ok().or_else(|| {
        warn!(variable = name, value = raw, "ignoring unparseable value");
        None
    })
}
