use std::net::IpAddr;
use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::{Config, OtpPolicy};
use crate::creds::ErpCreds;
use crate::endpoints::Endpoints;
use crate::error::Error;
use crate::markup;
use crate::otp::{self, OtpInput};
use crate::presence::{NetworkPresence, TcpProbe};
use crate::store::{CachedTokens, FileTokenStore, TokenStore};
use crate::types::{LoginTokens, SessionToken, SsoToken};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the redirect chain walked after a request. The portal
/// needs two hops; anything past this is a loop.
const MAX_REDIRECT_HOPS: usize = 10;

/// Client for the ERP portal's login ceremony and session checks.
///
/// One instance owns the cookie session the portal hands out, so the
/// checks in [`is_session_alive`](ErpClient::is_session_alive) see the
/// cookies a successful [`login`](ErpClient::login) left behind.
///
/// ```rust,ignore
/// use iitkgp_erp_login::{Config, ErpClient, ErpCreds, OtpInput};
///
/// let client = ErpClient::new(Config::default())?;
/// let creds = ErpCreds::new("21XX12345", "hunter2")
///     .with_answer("What is your pet's name?", "Tofu");
/// let tokens = client.login(&creds, OtpInput::None).await?;
/// println!("ssoToken = {}", tokens.sso_token);
/// ```
pub struct ErpClient {
    config: Config,
    endpoints: Endpoints,
    /// Session client: carries the cookie jar and leaves redirects to
    /// [`Self::follow_redirects`] so hop targets stay observable.
    http: reqwest::Client,
    /// Cookieless client used for token-validity probes.
    probe: reqwest::Client,
    jar: Arc<Jar>,
    presence: Box<dyn NetworkPresence>,
    token_store: Option<Box<dyn TokenStore>>,
}

impl ErpClient {
    // ── Construction ───────────────────────────────────────────────────

    /// Create a client against the production portal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an HTTP client cannot be built from
    /// the given configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .cookie_provider(Arc::clone(&jar))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::Config(format!("failed to build session client: {e}")))?;
        let probe = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .build()
            .map_err(|e| Error::Config(format!("failed to build probe client: {e}")))?;
        let token_store = config
            .token_cache()
            .map(|path| Box::new(FileTokenStore::new(path)) as Box<dyn TokenStore>);

        Ok(Self {
            config,
            endpoints: Endpoints::default(),
            http,
            probe,
            jar,
            presence: Box::new(TcpProbe::default()),
            token_store,
        })
    }

    /// Target a different endpoint set, e.g. a staging origin.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replace the campus reachability probe.
    #[must_use]
    pub fn with_network_presence(mut self, presence: impl NetworkPresence + 'static) -> Self {
        self.presence = Box::new(presence);
        self
    }

    /// Replace the token store the cached-login fast path uses.
    #[must_use]
    pub fn with_token_store(mut self, store: impl TokenStore + 'static) -> Self {
        self.token_store = Some(Box::new(store));
        self
    }

    /// Use a custom session client (for connection pool reuse or testing).
    ///
    /// `jar` must be the cookie provider `client` was built with, and the
    /// client must not follow redirects on its own.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client, jar: Arc<Jar>) -> Self {
        self.http = client;
        self.jar = jar;
        self
    }

    // ── Login ceremony ─────────────────────────────────────────────────

    /// Log in and return the session and SSO tokens.
    ///
    /// When a token store is configured, a cached SSO token that still
    /// passes [`is_sso_token_valid`](ErpClient::is_sso_token_valid) is
    /// reused without touching the login endpoints. Otherwise the full
    /// ceremony runs: fetch the session token from the entry page, answer
    /// the account's secret question, obtain an email OTP if the portal
    /// will want one, and submit.
    ///
    /// # Errors
    ///
    /// Each ceremony step classifies its own failures, transport included:
    ///
    /// - [`Error::TokenExtraction`] if the entry page cannot be fetched or
    ///   has no session token
    /// - [`Error::ChallengeFetch`] if the secret question cannot be fetched
    /// - [`Error::UnknownChallenge`] if no answer is registered for the
    ///   question the portal asked
    /// - [`Error::OtpRequest`], [`Error::OtpUnavailable`],
    ///   [`Error::OtpTimeout`], [`Error::OtpFetch`] for OTP trouble
    /// - [`Error::SsoTokenExtraction`] if the submission is not answered
    ///   with the expected redirects, which is also what rejected
    ///   credentials look like
    pub async fn login(
        &self,
        creds: &ErpCreds,
        otp: OtpInput<'_>,
    ) -> Result<LoginTokens, Error> {
        if let Some(tokens) = self.cached_login().await {
            return Ok(tokens);
        }

        let session_token = self.acquire_session_token().await?;
        tracing::debug!("acquired session token");

        let question = self.fetch_secret_question(creds.roll_number()).await?;
        tracing::debug!(%question, "received secret question");
        let answer = creds
            .answer_for(&question)
            .ok_or_else(|| Error::UnknownChallenge(question.clone()))?;

        let otp_code = if self.wants_otp().await {
            Some(self.obtain_otp(creds, &otp).await?)
        } else {
            None
        };

        let tokens = self
            .submit(creds, &session_token, answer, otp_code.as_deref())
            .await?;
        tracing::info!("ERP login successful");

        self.persist(&tokens).await;
        self.bind_sso_cookie(&tokens.sso_token);
        Ok(tokens)
    }

    /// Try to reuse a cached token pair. Any failure along the way is a
    /// cache miss, logged and swallowed.
    async fn cached_login(&self) -> Option<LoginTokens> {
        let store = self.token_store.as_ref()?;
        let cached = match store.load().await {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read token cache");
                return None;
            }
        };
        match self.is_sso_token_valid(&cached.sso_token).await {
            Ok(true) => {
                tracing::info!("Reusing cached SSO token");
                self.bind_sso_cookie(&cached.sso_token);
                Some(LoginTokens {
                    session_token: cached.session_token,
                    sso_token: cached.sso_token,
                })
            }
            Ok(false) => {
                tracing::debug!("cached SSO token is stale");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token validity probe failed, ignoring cache");
                None
            }
        }
    }

    /// Fetch the entry page and pull the session token out of its hidden
    /// form field.
    async fn acquire_session_token(&self) -> Result<SessionToken, Error> {
        let body = self
            .fetch_entry_page()
            .await
            .map_err(|e| Error::TokenExtraction(e.to_string()))?;
        markup::attribute_by_id(&body, markup::SESSION_TOKEN_ELEMENT_ID, "value")
            .map(SessionToken::from)
            .ok_or_else(|| {
                Error::TokenExtraction("entry page carries no session token field".to_string())
            })
    }

    async fn fetch_entry_page(&self) -> Result<String, reqwest::Error> {
        let response = self
            .http
            .get(self.endpoints.homepage().clone())
            .send()
            .await?;
        let (response, _) = self.follow_redirects(response).await?;
        response.text().await
    }

    /// Ask the portal which secret question the account must answer.
    /// The response body is the question text, matched verbatim.
    async fn fetch_secret_question(&self, roll_number: &str) -> Result<String, Error> {
        let response = self
            .http
            .post(self.endpoints.secret_question().clone())
            .form(&[("user_id", roll_number)])
            .send()
            .await
            .map_err(Error::ChallengeFetch)?;
        response.text().await.map_err(Error::ChallengeFetch)
    }

    /// Whether this login will need an email OTP.
    async fn wants_otp(&self) -> bool {
        match self.config.otp_policy() {
            OtpPolicy::Require => true,
            OtpPolicy::Skip => false,
            OtpPolicy::Auto => {
                let on_campus = self
                    .presence
                    .is_reachable(self.endpoints.campus_host())
                    .await;
                tracing::debug!(on_campus, "campus reachability decided OTP requirement");
                !on_campus
            }
        }
    }

    /// Ask the portal to email an OTP, then collect it from the caller's
    /// input.
    async fn obtain_otp(&self, creds: &ErpCreds, input: &OtpInput<'_>) -> Result<String, Error> {
        match input {
            // No input: the delivery request is never sent.
            OtpInput::None => Err(Error::OtpUnavailable),
            OtpInput::Source(source) => {
                self.request_otp(creds).await?;
                otp::await_otp(
                    *source,
                    self.config.otp_poll_interval(),
                    self.config.otp_max_wait(),
                )
                .await
            }
            OtpInput::Provider(provider) => {
                self.request_otp(creds).await?;
                provider().ok_or(Error::OtpUnavailable)
            }
        }
    }

    async fn request_otp(&self, creds: &ErpCreds) -> Result<(), Error> {
        // Field names, "typeee" included, are the portal's own.
        let form = [
            ("typeee", "SI"),
            ("loginid", creds.roll_number()),
            ("pass", creds.password().expose_secret()),
        ];
        self.http
            .post(self.endpoints.otp().clone())
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::OtpRequest)?;
        tracing::info!("Requested email OTP");
        Ok(())
    }

    /// Submit the assembled login form and pull the SSO token from the
    /// redirect chain the portal answers with.
    ///
    /// A successful login redirects twice; the second hop's target URL
    /// carries the token as a query parameter.
    async fn submit(
        &self,
        creds: &ErpCreds,
        session_token: &SessionToken,
        answer: &SecretString,
        otp_code: Option<&str>,
    ) -> Result<LoginTokens, Error> {
        let requested_url = self.endpoints.homepage().as_str();
        let mut form = vec![
            ("user_id", creds.roll_number()),
            ("password", creds.password().expose_secret()),
            ("answer", answer.expose_secret()),
            ("sessionToken", session_token.as_str()),
            ("requestedUrl", requested_url),
        ];
        if let Some(code) = otp_code {
            form.push(("email_otp", code));
        }

        let response = self
            .http
            .post(self.endpoints.login().clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::SsoTokenExtraction(format!("login submission failed: {e}")))?;
        let (_, hops) = self
            .follow_redirects(response)
            .await
            .map_err(|e| Error::SsoTokenExtraction(format!("redirect walk failed: {e}")))?;

        let second_hop = hops.get(1).ok_or_else(|| {
            Error::SsoTokenExtraction(format!(
                "expected the login submission to redirect twice, saw {} hop(s)",
                hops.len()
            ))
        })?;
        let sso_token = markup::sso_token_from_location(second_hop).ok_or_else(|| {
            Error::SsoTokenExtraction(format!(
                "redirect target {second_hop} carries no SSO token"
            ))
        })?;

        Ok(LoginTokens {
            session_token: session_token.clone(),
            sso_token: SsoToken::from(sso_token),
        })
    }

    async fn persist(&self, tokens: &LoginTokens) {
        let Some(store) = self.token_store.as_ref() else {
            return;
        };
        let cached = CachedTokens::new(tokens.session_token.clone(), tokens.sso_token.clone());
        if let Err(e) = store.store(&cached).await {
            tracing::warn!(error = %e, "Failed to persist tokens, continuing without cache");
        }
    }

    /// Plant the SSO cookie so later session requests are authenticated.
    fn bind_sso_cookie(&self, token: &SsoToken) {
        let domain = self.endpoints.cookie_domain();
        // Cookie parsers reject a Domain attribute that names an IP, so
        // fall back to a host-only cookie there.
        let cookie = if domain.parse::<IpAddr>().is_ok() {
            format!("{}={token}; Path=/", markup::SSO_TOKEN_PARAM)
        } else {
            format!("{}={token}; Domain={domain}; Path=/", markup::SSO_TOKEN_PARAM)
        };
        self.jar.add_cookie_str(&cookie, self.endpoints.homepage());
    }

    /// Walk a redirect chain by hand, collecting each hop's resolved
    /// target. Stops at the first non-redirect response, at a missing or
    /// unparsable `Location`, or after [`MAX_REDIRECT_HOPS`].
    async fn follow_redirects(
        &self,
        mut response: reqwest::Response,
    ) -> Result<(reqwest::Response, Vec<Url>), reqwest::Error> {
        let mut hops = Vec::new();
        while response.status().is_redirection() && hops.len() < MAX_REDIRECT_HOPS {
            let Some(next) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| response.url().join(location).ok())
            else {
                break;
            };
            hops.push(next.clone());
            response = self.http.get(next).send().await?;
        }
        Ok((response, hops))
    }

    // ── Session checks ─────────────────────────────────────────────────

    /// Whether an SSO token is still accepted by the portal.
    ///
    /// Probes the entry page with the token and no cookies. The portal
    /// marks acceptance through the exact `Content-Type` it serves, not
    /// through the status code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the probe request itself fails.
    pub async fn is_sso_token_valid(&self, token: &SsoToken) -> Result<bool, Error> {
        let mut url = self.endpoints.homepage().clone();
        url.query_pairs_mut()
            .append_pair(markup::SSO_TOKEN_PARAM, token.as_str());
        let response = self.probe.get(url).send().await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        Ok(markup::is_authenticated_content_type(content_type))
    }

    /// Whether this client's cookie session is still logged in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the welcome page cannot be fetched.
    pub async fn is_session_alive(&self) -> Result<bool, Error> {
        let response = self
            .http
            .get(self.endpoints.welcome().clone())
            .send()
            .await?;
        let (response, _) = self.follow_redirects(response).await?;
        // The portal 404s the bare welcome page only for live sessions;
        // logged-out sessions get redirected to a served login page.
        Ok(response.status() == StatusCode::NOT_FOUND)
    }
}
