//! Vendor endpoint and credential settings read from the environment.
//!
//! Each vendor reads `<P>_API_KEY`, `<P>_BASE`, `<P>_PATH`, `<P>_AUTH_HEADER`,
//! `<P>_AUTH_PREFIX`, `<P>_MOCK` and `<P>_DEBUG`. Infermedica additionally
//! needs `INFERMEDICA_APP_ID`; OpenAI honours `OPENAI_MODEL`. Isabel also
//! accepts the older `ISABEL_DDX_PATH` when `ISABEL_PATH` is unset.

use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;

use super::SettingsError;
use crate::outbound::{VendorConnection, VendorHttpClient, VendorMode, infermedica, isabel, openai};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const INFERMEDICA_APP_ID_ENV: &str = "INFERMEDICA_APP_ID";
const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";

/// Per-vendor fallbacks applied when a variable is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorDefaults {
    /// Variable prefix, e.g. `ISABEL`.
    pub prefix: &'static str,
    pub base: &'static str,
    pub path: &'static str,
    pub auth_header: &'static str,
    pub auth_prefix: &'static str,
    /// Older name for `<P>_PATH`, consulted when that is unset.
    pub legacy_path_var: Option<&'static str>,
}

impl VendorDefaults {
    pub const ISABEL: Self = Self {
        prefix: "ISABEL",
        base: isabel::DEFAULT_BASE,
        path: isabel::DEFAULT_PATH,
        auth_header: "Authorization",
        auth_prefix: "Bearer",
        legacy_path_var: Some("ISABEL_DDX_PATH"),
    };

    pub const INFERMEDICA: Self = Self {
        prefix: "INFERMEDICA",
        base: infermedica::DEFAULT_BASE,
        path: infermedica::DEFAULT_PATH,
        auth_header: "App-Key",
        auth_prefix: "",
        legacy_path_var: None,
    };

    pub const OPENAI: Self = Self {
        prefix: "OPENAI",
        base: openai::DEFAULT_BASE,
        path: openai::DEFAULT_PATH,
        auth_header: "Authorization",
        auth_prefix: "Bearer",
        legacy_path_var: None,
    };
}

/// Resolved settings for one vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorSettings {
    pub prefix: &'static str,
    pub api_key: Option<String>,
    pub endpoint: Url,
    pub auth_header: String,
    pub auth_prefix: String,
    pub mock: bool,
    pub debug: bool,
}

impl VendorSettings {
    /// Read one vendor's variables, falling back to `defaults`.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidUrl`] when `<P>_BASE` joined with
    /// `<P>_PATH` is not a valid URL.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ddx_gateway::settings::{VendorDefaults, VendorSettings};
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "ISABEL_API_KEY" => Some("secret".to_string()),
    ///     "ISABEL_MOCK" => Some("no".to_string()),
    ///     _ => None,
    /// });
    ///
    /// let settings = VendorSettings::from_env(&env, &VendorDefaults::ISABEL).expect("valid");
    /// assert_eq!(settings.endpoint.as_str(), "https://api.isabelhealthcare.com/ddx/companion");
    /// assert!(!settings.mock);
    /// ```
    pub fn from_env<E: Env>(env: &E, defaults: &VendorDefaults) -> Result<Self, SettingsError> {
        let var = |suffix: &str| format!("{}_{suffix}", defaults.prefix);

        let base = non_empty(env.string(&var("BASE"))).unwrap_or_else(|| defaults.base.to_owned());
        let path = non_empty(env.string(&var("PATH")))
            .or_else(|| legacy_path(env, defaults))
            .unwrap_or_else(|| defaults.path.to_owned());
        let endpoint = join_endpoint(&base, &path).map_err(|reason| SettingsError::InvalidUrl {
            name: var("BASE"),
            value: base.clone(),
            reason,
        })?;

        Ok(Self {
            prefix: defaults.prefix,
            api_key: non_empty(env.string(&var("API_KEY"))),
            endpoint,
            auth_header: non_empty(env.string(&var("AUTH_HEADER")))
                .unwrap_or_else(|| defaults.auth_header.to_owned()),
            auth_prefix: env
                .string(&var("AUTH_PREFIX"))
                .unwrap_or_else(|| defaults.auth_prefix.to_owned()),
            mock: bool_from_env(env, &var("MOCK")),
            debug: bool_from_env(env, &var("DEBUG")),
        })
    }

    /// Decide how the adapter answers: canned, live or failing.
    ///
    /// # Errors
    /// Returns [`SettingsError::Client`] when live headers are unusable.
    pub fn mode(
        &self,
        provider: &'static str,
        timeout: Duration,
        extra_headers: Vec<(String, String)>,
    ) -> Result<VendorMode, SettingsError> {
        if self.mock {
            return Ok(VendorMode::Mock);
        }
        let Some(api_key) = self.api_key.clone() else {
            return Ok(VendorMode::unconfigured(format!(
                "{}_API_KEY is not set",
                self.prefix
            )));
        };

        let connection = VendorConnection {
            endpoint: self.endpoint.clone(),
            auth_header: self.auth_header.clone(),
            auth_prefix: self.auth_prefix.clone(),
            api_key,
            extra_headers,
            timeout,
            debug: self.debug,
        };
        VendorHttpClient::new(provider, connection)
            .map(VendorMode::Live)
            .map_err(|source| SettingsError::Client { provider, source })
    }
}

/// Settings for every network-backed provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub isabel: VendorSettings,
    pub infermedica: VendorSettings,
    pub infermedica_app_id: Option<String>,
    pub openai: VendorSettings,
    pub openai_model: String,
}

impl ProviderSettings {
    /// Read all vendor settings.
    ///
    /// # Errors
    /// Propagates [`SettingsError`] from any vendor.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, SettingsError> {
        Ok(Self {
            isabel: VendorSettings::from_env(env, &VendorDefaults::ISABEL)?,
            infermedica: VendorSettings::from_env(env, &VendorDefaults::INFERMEDICA)?,
            infermedica_app_id: non_empty(env.string(INFERMEDICA_APP_ID_ENV)),
            openai: VendorSettings::from_env(env, &VendorDefaults::OPENAI)?,
            openai_model: non_empty(env.string(OPENAI_MODEL_ENV))
                .unwrap_or_else(|| openai::DEFAULT_MODEL.to_owned()),
        })
    }

    /// Infermedica mode; live calls also need an application id.
    ///
    /// # Errors
    /// Propagates [`SettingsError::Client`].
    pub fn infermedica_mode(&self, timeout: Duration) -> Result<VendorMode, SettingsError> {
        match (&self.infermedica_app_id, self.infermedica.mock) {
            (_, true) => Ok(VendorMode::Mock),
            (None, false) => Ok(VendorMode::unconfigured(format!(
                "{INFERMEDICA_APP_ID_ENV} is not set"
            ))),
            (Some(app_id), false) => self.infermedica.mode(
                infermedica::INFERMEDICA,
                timeout,
                vec![(infermedica::APP_ID_HEADER.to_owned(), app_id.clone())],
            ),
        }
    }
}

/// Parse the boolean spellings accepted in vendor toggles.
///
/// # Examples
/// ```
/// use ddx_gateway::settings::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("0"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn bool_from_env<E: Env>(env: &E, name: &str) -> bool {
    let Some(value) = env.string(name) else {
        return false;
    };
    parse_bool(&value).unwrap_or_else(|| {
        warn!(
            value = %value,
            expected = BOOL_EXPECTED,
            "invalid {name}; defaulting to disabled"
        );
        false
    })
}

fn legacy_path<E: Env>(env: &E, defaults: &VendorDefaults) -> Option<String> {
    let name = defaults.legacy_path_var?;
    let path = non_empty(env.string(name))?;
    warn!(
        variable = name,
        replacement = %format!("{}_PATH", defaults.prefix),
        "deprecated variable in use"
    );
    Some(path)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn join_endpoint(base: &str, path: &str) -> Result<Url, String> {
    let path = path.trim_start_matches('/');
    let joined = format!("{}/{path}", base.trim_end_matches('/'));
    let url = Url::parse(&joined).map_err(|error| error.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}
