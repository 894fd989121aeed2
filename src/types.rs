use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Anti-forgery value issued by the portal at the start of a login ceremony.
///
/// Extracted from the entry page's markup and echoed back verbatim in the
/// final submission. It binds the steps of one ceremony together and has no
/// validity outside an in-progress or freshly completed login; the bearer
/// credential is [`SsoToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bearer credential proving authentication, extracted from the submission
/// redirect chain.
///
/// Created by a successful login, validated on demand via
/// [`ErpClient::is_sso_token_valid`](crate::ErpClient::is_sso_token_valid),
/// and invalidated by server-side expiry (detected, never predicted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct SsoToken(pub String);

impl SsoToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The artifact pair a completed login yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTokens {
    /// Ceremony-binding token, already consumed by the login that produced it.
    pub session_token: SessionToken,
    /// Bearer credential for subsequent portal requests.
    pub sso_token: SsoToken,
}
