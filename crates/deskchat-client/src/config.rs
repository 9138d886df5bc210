//! Client configuration.
//!
//! The base URL is the single source for every endpoint: HTTP paths are
//! joined onto it and the socket URL is derived from it by swapping the
//! scheme.

use std::{path::PathBuf, time::Duration};

use deskchat_core::{RECONNECT_DELAY, Roster};
use deskchat_proto::{RosterRecord, endpoints};
use url::Url;

use crate::ConfigError;

/// Default HTTP request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default preference file name.
pub const PREFERENCES_FILE: &str = "deskchat-prefs.json";

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (`http` or `https`).
    pub base_url: Url,
    /// Current user.
    pub username: String,
    /// Delay between an unclean close and the next attempt.
    pub reconnect_delay: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// JSON file backing the preference store.
    pub preferences_path: PathBuf,
    /// JSON roster file, if any.
    pub roster_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Config with default timings for `username` against `base_url`.
    pub fn new(base_url: Url, username: impl Into<String>) -> Self {
        Self {
            base_url,
            username: username.into(),
            reconnect_delay: RECONNECT_DELAY,
            request_timeout: REQUEST_TIMEOUT,
            preferences_path: PathBuf::from(PREFERENCES_FILE),
            roster_path: None,
        }
    }

    /// Absolute URL of an HTTP endpoint.
    ///
    /// `path` is resolved relative to the base, so a base with a path prefix
    /// (`https://host/app`) keeps it.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        Ok(self.directory().join(path)?)
    }

    /// Socket URL: the base with `ws`/`wss` scheme and the socket path.
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnsupportedScheme` unless the base is `http` or `https`
    pub fn ws_url(&self) -> Result<Url, ConfigError> {
        let scheme = match self.base_url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };

        let mut url = self.endpoint(endpoints::SOCKET)?;
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(self.base_url.scheme().to_string()))?;
        Ok(url)
    }

    /// Load the roster file, or an empty roster when none is configured.
    pub fn load_roster(&self) -> Result<Roster, ConfigError> {
        let Some(path) = &self.roster_path else {
            return Ok(Roster::default());
        };

        let text = std::fs::read_to_string(path)?;
        let records: Vec<RosterRecord> = serde_json::from_str(&text)?;
        tracing::info!(count = records.len(), path = %path.display(), "roster loaded");
        Ok(Roster::from_records(records))
    }

    /// Base URL with a trailing slash, so relative joins append to it.
    pub(crate) fn directory(&self) -> Url {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn config(base: &str) -> ClientConfig {
        ClientConfig::new(Url::parse(base).unwrap(), "sok")
    }

    #[test]
    fn ws_url_swaps_scheme() {
        assert_eq!(config("http://localhost:8080").ws_url().unwrap().as_str(), "ws://localhost:8080/api/chat/ws");
        assert_eq!(config("https://chat.example.com/").ws_url().unwrap().as_str(), "wss://chat.example.com/api/chat/ws");
    }

    #[test]
    fn ws_url_keeps_path_prefix() {
        assert_eq!(config("https://host/app").ws_url().unwrap().as_str(), "wss://host/app/api/chat/ws");
    }

    #[test]
    fn ws_url_rejects_other_schemes() {
        let err = config("ftp://host/").ws_url().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn endpoint_joins_onto_base() {
        let url = config("http://localhost:8080/app/").endpoint(endpoints::SEND).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/app/api/chat/send");
    }

    #[test]
    fn defaults() {
        let c = config("http://localhost");
        assert_eq!(c.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(c.request_timeout, REQUEST_TIMEOUT);
        assert!(c.roster_path.is_none());
    }

    #[test]
    fn missing_roster_path_gives_empty_roster() {
        assert!(config("http://localhost").load_roster().unwrap().is_empty());
    }

    #[test]
    fn roster_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"UserName":"sao","FullName":"Sao Nguyen","ImageURL":"https://cdn/sao.png"}},{{"UserName":"admin","FullName":"Admin"}}]"#
        )
        .unwrap();

        let mut c = config("http://localhost");
        c.roster_path = Some(file.path().to_path_buf());
        let roster = c.load_roster().unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.find("sao").unwrap().display_name, "Sao Nguyen");
    }

    #[test]
    fn malformed_roster_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut c = config("http://localhost");
        c.roster_path = Some(file.path().to_path_buf());
        assert!(matches!(c.load_roster(), Err(ConfigError::Roster(_))));
    }
}
