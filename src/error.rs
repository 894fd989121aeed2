use std::time::Duration;

/// Failures of the login ceremony and the validity probes.
///
/// Every ceremony-step failure is fatal to that ceremony; nothing is
/// retried internally. Callers that want retries re-invoke
/// [`login`](crate::ErpClient::login) from the top, because session tokens
/// are single-use and a partially completed ceremony cannot resume.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The entry page could not be fetched, or its markup carried no
    /// session-token element. The message names the underlying cause.
    #[error("failed to acquire session token: {0}")]
    TokenExtraction(String),

    /// Transport failure while fetching the secret question.
    #[error("failed to fetch secret question")]
    ChallengeFetch(#[source] reqwest::Error),

    /// The portal served a secret question with no entry in the caller's
    /// answers map.
    ///
    /// A credential-set problem, not a transport one: add the missing
    /// answer instead of retrying.
    #[error("no answer configured for secret question {0:?}")]
    UnknownChallenge(String),

    /// Transport failure while asking the portal to send an OTP.
    #[error("failed to request OTP delivery")]
    OtpRequest(#[source] reqwest::Error),

    /// The OTP delivery capability itself failed while being polled.
    #[error("OTP source failed: {0}")]
    OtpFetch(String),

    /// An OTP was required but no source or provider was configured, or
    /// the provider declined to supply one.
    #[error("OTP required but no OTP input was available")]
    OtpUnavailable,

    /// No OTP arrived within the configured window.
    #[error("no OTP received within {}s", .0.as_secs())]
    OtpTimeout(Duration),

    /// The submission failed in transport, or its redirect chain was too
    /// short or carried no SSO token. Rejected credentials surface here,
    /// because the portal answers them with a served page instead of its
    /// usual redirects.
    #[error("failed to extract SSO token: {0}")]
    SsoTokenExtraction(String),

    /// Invalid configuration, or the HTTP clients could not be built.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure in the token-validity and session-liveness
    /// probes. Ceremony steps classify their own transport failures into
    /// the variants above.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
