use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// When the login ceremony should ask the portal for an email OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpPolicy {
    /// Probe the campus network; request an OTP only when the caller is
    /// outside it. Mirrors the portal's own behavior.
    #[default]
    Auto,
    /// Always request an OTP, regardless of where the caller is.
    Require,
    /// Never request an OTP. Login fails if the portal insists on one.
    Skip,
}

impl FromStr for OtpPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "require" => Ok(Self::Require),
            "skip" => Ok(Self::Skip),
            other => Err(Error::Config(format!(
                "unknown OTP policy {other:?}, expected auto, require or skip"
            ))),
        }
    }
}

/// Tunable knobs for the login ceremony.
///
/// `Config::default()` matches the portal's comfortable settings; use the
/// `with_*` builders or [`Config::from_env`] to adjust them.
#[derive(Debug, Clone)]
pub struct Config {
    otp_poll_interval: Duration,
    otp_max_wait: Duration,
    token_cache: Option<PathBuf>,
    otp_policy: OtpPolicy,
    http_timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            otp_poll_interval: Duration::from_secs(10),
            otp_max_wait: Duration::from_secs(300),
            token_cache: None,
            otp_policy: OtpPolicy::Auto,
            http_timeout: Duration::from_secs(30),
            // The portal's certificate chain is routinely broken.
            accept_invalid_certs: true,
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to defaults for
    /// unset variables.
    ///
    /// Recognized variables:
    /// - `ERP_OTP_POLL_INTERVAL`: seconds between OTP source polls
    /// - `ERP_OTP_MAX_WAIT`: seconds before giving up on an OTP
    /// - `ERP_TOKEN_CACHE`: path of the cached-token file
    /// - `ERP_OTP_POLICY`: `auto`, `require` or `skip`
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("ERP_OTP_POLL_INTERVAL") {
            let secs: u64 = raw.parse().map_err(|_| {
                Error::Config(format!("invalid ERP_OTP_POLL_INTERVAL {raw:?}"))
            })?;
            config.otp_poll_interval = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("ERP_OTP_MAX_WAIT") {
            let secs: u64 = raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid ERP_OTP_MAX_WAIT {raw:?}")))?;
            config.otp_max_wait = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("ERP_TOKEN_CACHE") {
            config.token_cache = Some(PathBuf::from(raw));
        }
        if let Ok(raw) = std::env::var("ERP_OTP_POLICY") {
            config.otp_policy = raw.parse()?;
        }
        Ok(config)
    }

    /// Set the delay between successive OTP source polls.
    #[must_use]
    pub fn with_otp_poll_interval(mut self, interval: Duration) -> Self {
        self.otp_poll_interval = interval;
        self
    }

    /// Set how long to wait for an OTP before giving up.
    #[must_use]
    pub fn with_otp_max_wait(mut self, max_wait: Duration) -> Self {
        self.otp_max_wait = max_wait;
        self
    }

    /// Cache tokens at the given path across runs.
    #[must_use]
    pub fn with_token_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_cache = Some(path.into());
        self
    }

    /// Set when the ceremony requests an OTP.
    #[must_use]
    pub fn with_otp_policy(mut self, policy: OtpPolicy) -> Self {
        self.otp_policy = policy;
        self
    }

    /// Set the per-request HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Control whether invalid portal certificates are tolerated.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Delay between successive OTP source polls.
    #[must_use]
    pub fn otp_poll_interval(&self) -> Duration {
        self.otp_poll_interval
    }

    /// How long to wait for an OTP before giving up.
    #[must_use]
    pub fn otp_max_wait(&self) -> Duration {
        self.otp_max_wait
    }

    /// Path tokens are cached at, if caching is enabled.
    #[must_use]
    pub fn token_cache(&self) -> Option<&PathBuf> {
        self.token_cache.as_ref()
    }

    /// When the ceremony requests an OTP.
    #[must_use]
    pub fn otp_policy(&self) -> OtpPolicy {
        self.otp_policy
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Whether invalid portal certificates are tolerated.
    #[must_use]
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}
