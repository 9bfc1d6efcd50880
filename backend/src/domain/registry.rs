//! Immutable table of diagnostic providers.
//!
//! The registry is built once at startup from explicit registrations and an
//! allow-list, then shared read-only. Unknown and disabled names are terminal
//! input errors; the registry never substitutes another provider.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use super::Error;
use super::ports::DiagnosisProvider;

/// One named provider offered to the registry.
#[derive(Clone)]
pub struct ProviderRegistration {
    pub name: String,
    pub provider: Arc<dyn DiagnosisProvider>,
}

impl ProviderRegistration {
    pub fn new(name: impl Into<String>, provider: Arc<dyn DiagnosisProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }
}

/// Enablement and default selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Allow-list of provider names; empty enables every registration.
    pub enabled: Vec<String>,
    /// Provider used when a request names none.
    pub default: String,
}

/// Errors raised while building a [`ProviderRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("provider '{name}' is registered more than once")]
    DuplicateProvider { name: String },
    #[error("default provider '{name}' is not registered")]
    UnknownDefault { name: String },
}

struct Entry {
    name: String,
    provider: Arc<dyn DiagnosisProvider>,
    enabled: bool,
}

/// Name → provider table with enablement.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use ddx_gateway::domain::{ProviderRegistration, ProviderRegistry, RegistryConfig};
/// use ddx_gateway::outbound::local_rules::LocalRulesProvider;
///
/// let registry = ProviderRegistry::new(
///     vec![ProviderRegistration::new("local_rules", Arc::new(LocalRulesProvider::default()))],
///     RegistryConfig { enabled: Vec::new(), default: "local_rules".into() },
/// )
/// .expect("valid registry");
/// assert_eq!(registry.list_enabled(), vec!["local_rules"]);
/// assert!(registry.select("isabel").is_err());
/// ```
pub struct ProviderRegistry {
    entries: Vec<Entry>,
    default: String,
}

impl ProviderRegistry {
    /// Build the registry.
    ///
    /// Allow-list names that match no registration are logged and ignored.
    ///
    /// # Errors
    /// Returns [`RegistryError`] for duplicate names or an unregistered
    /// default.
    pub fn new(
        registrations: Vec<ProviderRegistration>,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for registration in &registrations {
            if !seen.insert(registration.name.as_str()) {
                return Err(RegistryError::DuplicateProvider {
                    name: registration.name.clone(),
                });
            }
        }
        if !seen.contains(config.default.as_str()) {
            return Err(RegistryError::UnknownDefault {
                name: config.default,
            });
        }
        for name in &config.enabled {
            if !seen.contains(name.as_str()) {
                warn!(provider = %name, "ignoring unregistered provider in allow-list");
            }
        }

        let allow_all = config.enabled.is_empty();
        let entries = registrations
            .into_iter()
            .map(|registration| Entry {
                enabled: allow_all || config.enabled.contains(&registration.name),
                name: registration.name,
                provider: registration.provider,
            })
            .collect::<Vec<_>>();

        let registry = Self {
            entries,
            default: config.default,
        };
        if !registry.is_enabled(&registry.default) {
            warn!(provider = %registry.default, "default provider is not enabled");
        }
        Ok(registry)
    }

    /// Look up a provider regardless of enablement.
    ///
    /// # Errors
    /// Returns `unknown_provider` when `name` is not registered.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn DiagnosisProvider>, Error> {
        self.entry(name)
            .map(|entry| Arc::clone(&entry.provider))
            .ok_or_else(|| Error::unknown_provider(format!("unknown provider '{name}'")))
    }

    /// Whether `name` is registered and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|entry| entry.enabled)
    }

    /// Enabled provider names in registration order.
    pub fn list_enabled(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Resolve `name` and enforce enablement.
    ///
    /// # Errors
    /// Returns `unknown_provider` or `provider_disabled`.
    pub fn select(&self, name: &str) -> Result<Arc<dyn DiagnosisProvider>, Error> {
        let provider = self.resolve(name)?;
        if !self.is_enabled(name) {
            return Err(Error::provider_disabled(format!(
                "provider '{name}' is disabled"
            )));
        }
        Ok(provider)
    }

    pub fn default_name(&self) -> &str {
        self.default.as_str()
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}
