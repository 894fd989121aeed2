use url::Url;

/// ERP portal endpoint set.
///
/// Defaults point at the production portal. Override individual URLs with
/// the `with_*` methods, or rebase everything onto one origin with
/// [`for_base`](Endpoints::for_base) (useful against a test server).
///
/// ```rust,ignore
/// use iitkgp_erp_login::Endpoints;
///
/// let endpoints = Endpoints::default();
/// // Or, against a staging origin:
/// let endpoints = Endpoints::for_base(&"https://staging.example.org".parse()?);
/// ```
#[derive(Debug, Clone)]
pub struct Endpoints {
    homepage: Url,
    secret_question: Url,
    otp: Url,
    login: Url,
    welcome: Url,
    campus_host: String,
    cookie_domain: String,
}

const HOMEPAGE_PATH: &str = "IIT_ERP3/";
const SECRET_QUESTION_PATH: &str = "SSOAdministration/getSecurityQues.htm";
// "Emil" is the portal's spelling.
const OTP_PATH: &str = "SSOAdministration/getEmilOTP.htm";
const LOGIN_PATH: &str = "SSOAdministration/auth.htm";
const WELCOME_PATH: &str = "IIT_ERP3/welcome.jsp";

impl Default for Endpoints {
    fn default() -> Self {
        let base: Url = "https://erp.iitkgp.ac.in/"
            .parse()
            .expect("valid default URL");
        let mut endpoints = Self::for_base(&base);
        endpoints.campus_host = "iitkgp.ac.in".to_string();
        endpoints
    }
}

impl Endpoints {
    /// Derive the full endpoint set from one origin.
    ///
    /// The campus host and cookie domain are taken from the base URL's
    /// host; [`Default`] narrows the campus host to the institute domain.
    #[must_use]
    pub fn for_base(base: &Url) -> Self {
        let host = base.host_str().unwrap_or_default().to_string();
        Self {
            homepage: base.join(HOMEPAGE_PATH).expect("valid endpoint path"),
            secret_question: base
                .join(SECRET_QUESTION_PATH)
                .expect("valid endpoint path"),
            otp: base.join(OTP_PATH).expect("valid endpoint path"),
            login: base.join(LOGIN_PATH).expect("valid endpoint path"),
            welcome: base.join(WELCOME_PATH).expect("valid endpoint path"),
            campus_host: host.clone(),
            cookie_domain: host,
        }
    }

    /// Override the entry page URL.
    #[must_use]
    pub fn with_homepage(mut self, url: Url) -> Self {
        self.homepage = url;
        self
    }

    /// Override the secret-question endpoint.
    #[must_use]
    pub fn with_secret_question(mut self, url: Url) -> Self {
        self.secret_question = url;
        self
    }

    /// Override the OTP-request endpoint.
    #[must_use]
    pub fn with_otp(mut self, url: Url) -> Self {
        self.otp = url;
        self
    }

    /// Override the login-submission endpoint.
    #[must_use]
    pub fn with_login(mut self, url: Url) -> Self {
        self.login = url;
        self
    }

    /// Override the welcome-page URL used by the liveness probe.
    #[must_use]
    pub fn with_welcome(mut self, url: Url) -> Self {
        self.welcome = url;
        self
    }

    /// Override the host probed for campus reachability.
    #[must_use]
    pub fn with_campus_host(mut self, host: impl Into<String>) -> Self {
        self.campus_host = host.into();
        self
    }

    /// Entry page; serves the session token and is the ceremony's
    /// requested URL.
    #[must_use]
    pub fn homepage(&self) -> &Url {
        &self.homepage
    }

    /// Secret-question endpoint.
    #[must_use]
    pub fn secret_question(&self) -> &Url {
        &self.secret_question
    }

    /// OTP-request endpoint.
    #[must_use]
    pub fn otp(&self) -> &Url {
        &self.otp
    }

    /// Login-submission endpoint.
    #[must_use]
    pub fn login(&self) -> &Url {
        &self.login
    }

    /// Welcome page probed by the liveness check.
    #[must_use]
    pub fn welcome(&self) -> &Url {
        &self.welcome
    }

    /// Host probed to decide whether the caller is on the campus network.
    #[must_use]
    pub fn campus_host(&self) -> &str {
        &self.campus_host
    }

    /// Domain the SSO cookie is bound under.
    #[must_use]
    pub fn cookie_domain(&self) -> &str {
        &self.cookie_domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_production_portal() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.homepage().as_str(), "https://erp.iitkgp.ac.in/IIT_ERP3/");
        assert_eq!(
            endpoints.login().as_str(),
            "https://erp.iitkgp.ac.in/SSOAdministration/auth.htm"
        );
        assert_eq!(endpoints.campus_host(), "iitkgp.ac.in");
        assert_eq!(endpoints.cookie_domain(), "erp.iitkgp.ac.in");
    }

    #[test]
    fn for_base_rebases_every_endpoint() {
        let base: Url = "http://127.0.0.1:9000/".parse().unwrap();
        let endpoints = Endpoints::for_base(&base);
        assert_eq!(endpoints.homepage().as_str(), "http://127.0.0.1:9000/IIT_ERP3/");
        assert_eq!(
            endpoints.welcome().as_str(),
            "http://127.0.0.1:9000/IIT_ERP3/welcome.jsp"
        );
        assert_eq!(endpoints.campus_host(), "127.0.0.1");
    }

    #[test]
    fn overrides_leave_other_endpoints_alone() {
        let endpoints = Endpoints::default()
            .with_otp("https://example.org/otp".parse().unwrap())
            .with_campus_host("campus.example.org");
        assert_eq!(endpoints.otp().as_str(), "https://example.org/otp");
        assert_eq!(endpoints.campus_host(), "campus.example.org");
        assert_eq!(endpoints.homepage().as_str(), "https://erp.iitkgp.ac.in/IIT_ERP3/");
    }
}
