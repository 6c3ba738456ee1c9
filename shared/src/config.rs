//! Backend configuration.
//!
//! The core cannot read the process environment, so the shell forwards the
//! relevant variables in [`Event::Start`](crate::Event::Start). A complete and
//! valid pair selects remote mode; anything else leaves the board in fallback
//! mode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::error::ConfigError;
use crate::event::Secret;

pub const URL_VARS: [&str; 2] = ["VITE_SUPABASE_URL", "SUPABASE_URL"];
pub const KEY_VARS: [&str; 3] = [
    "VITE_SUPABASE_PUBLISHABLE_KEY",
    "VITE_SUPABASE_ANON_KEY",
    "SUPABASE_ANON_KEY",
];

/// Raw variables as the shell saw them.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// First non-blank value among `names`, in order.
    fn first(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|n| self.vars.get(*n))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    url: Url,
    anon_key: Secret,
}

impl BackendConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let parsed = Url::parse(url.trim()).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if parsed.host_str().is_none() {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: "missing host".to_string(),
            });
        }

        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ConfigError::Incomplete { missing: KEY_VARS[0] });
        }

        Ok(Self {
            url: parsed,
            anon_key: Secret::new(anon_key.trim()),
        })
    }

    /// `Ok(None)` when nothing is configured; an error when only half is.
    pub fn from_env(env: &Environment) -> Result<Option<Self>, ConfigError> {
        match (env.first(&URL_VARS), env.first(&KEY_VARS)) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Incomplete { missing: KEY_VARS[0] }),
            (None, Some(_)) => Err(ConfigError::Incomplete { missing: URL_VARS[0] }),
            (Some(url), Some(key)) => Self::new(url, key).map(Some),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn anon_key(&self) -> &Secret {
        &self.anon_key
    }
}
