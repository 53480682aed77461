//! Connection state the clients are bound to.

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Environment variable selecting the project mode.
pub const PROJECT_ENV_VAR: &str = "SEVA_PROJECT_ENV";

pub const DEV_SERVER_URL: &str = "http://192.168.1.2:5900";
pub const DEV_MAIN_URL: &str = "http://192.168.1.2:3000";
pub const PROD_MAIN_URL: &str = "https://g-seva.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectMode {
    Development,
    Production,
}

impl ProjectMode {
    /// `PROD` selects production; anything else, or nothing, development.
    pub fn from_env() -> Self {
        Self::from_value(env::var(PROJECT_ENV_VAR).ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("PROD") => ProjectMode::Production,
            _ => ProjectMode::Development,
        }
    }
}

/// The two base URLs the application talks to.
///
/// `server_url` is chosen by the user at run time; `main_url` points at the
/// central service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub main_url: Option<String>,
}

impl ConnectionState {
    pub fn new(server_url: Option<String>, main_url: Option<String>) -> Self {
        Self {
            server_url,
            main_url,
        }
    }

    pub fn for_mode(mode: ProjectMode) -> Self {
        match mode {
            ProjectMode::Development => Self::new(
                Some(DEV_SERVER_URL.to_string()),
                Some(DEV_MAIN_URL.to_string()),
            ),
            ProjectMode::Production => Self::new(None, Some(PROD_MAIN_URL.to_string())),
        }
    }

    pub fn from_env() -> Self {
        Self::for_mode(ProjectMode::from_env())
    }

    pub fn set_server_url(&mut self, url: impl Into<String>) {
        self.server_url = Some(url.into());
    }

    pub fn set_main_url(&mut self, url: impl Into<String>) {
        self.main_url = Some(url.into());
    }

    /// Check that every non-empty URL is an http(s) origin with a host.
    pub fn validate(&self) -> Result<()> {
        validate_origin("server_url", self.server_url.as_deref())?;
        validate_origin("main_url", self.main_url.as_deref())
    }
}

fn validate_origin(field: &'static str, value: Option<&str>) -> Result<()> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(());
    };

    let url = Url::parse(value).map_err(|e| Error::InvalidUrl {
        field,
        message: format!("{value}: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            field,
            message: format!("{value}: unsupported scheme {}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl {
            field,
            message: format!("{value}: missing host"),
        });
    }
    Ok(())
}
