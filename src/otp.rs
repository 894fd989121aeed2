use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// A place login OTPs can be fetched from, such as an institute mailbox
/// reader or a forwarding bot.
///
/// The ceremony polls [`fetch_latest`](OtpSource::fetch_latest) after
/// asking the portal to send a code, so implementations should return the
/// newest code seen and `None` while the mail is still in flight.
#[async_trait]
pub trait OtpSource: Send + Sync {
    /// Return the latest OTP if one has arrived yet.
    async fn fetch_latest(
        &self,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Where the ceremony gets an OTP from when the portal asks for one.
pub enum OtpInput<'a> {
    /// Poll a source until the code shows up or the wait expires.
    Source(&'a dyn OtpSource),
    /// Ask a callback exactly once, e.g. a terminal prompt.
    Provider(&'a (dyn Fn() -> Option<String> + Send + Sync)),
    /// Nothing available. Login fails if the portal insists on a code.
    None,
}

impl fmt::Debug for OtpInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(_) => f.write_str("OtpInput::Source"),
            Self::Provider(_) => f.write_str("OtpInput::Provider"),
            Self::None => f.write_str("OtpInput::None"),
        }
    }
}

/// Poll `source` until it yields a code, sleeping `poll_interval` between
/// attempts and giving up after `max_wait`.
pub(crate) async fn await_otp(
    source: &dyn OtpSource,
    poll_interval: Duration,
    max_wait: Duration,
) -> Result<String, Error> {
    let poll = async {
        loop {
            match source.fetch_latest().await {
                Ok(Some(code)) => return Ok(code),
                Ok(None) => {
                    tracing::debug!(interval = ?poll_interval, "no OTP yet, polling again");
                    tokio::time::sleep(poll_interval).await;
                }
                Err(e) => return Err(Error::OtpFetch(e.to_string())),
            }
        }
    };
    match tokio::time::timeout(max_wait, poll).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::OtpTimeout(max_wait)),
    }
}
