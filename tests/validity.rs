//! Token validity, session liveness and token cache tests against a
//! mock portal.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iitkgp_erp_login::{
    CachedTokens, Config, Endpoints, ErpClient, ErpCreds, FileTokenStore, OtpInput, OtpPolicy,
    SessionToken, SsoToken, TokenStore,
};

const SESSION_TOKEN: &str = "5C1A5E3BDE80815A2CCEC2FD0E6E9E52";
const QUESTION: &str = "What is your pet's name?";
const AUTHENTICATED_PAGE: &str = "<html><body>ERP modules</body></html>";

fn login_page(token: &str) -> String {
    format!(
        r#"<html><body>
          <input type="hidden" id="sessionToken" name="sessionToken" value="{token}" />
        </body></html>"#
    )
}

fn client_for(server: &MockServer, config: Config) -> ErpClient {
    let base = server.uri().parse().expect("mock server URI");
    ErpClient::new(config)
        .expect("client builds")
        .with_endpoints(Endpoints::for_base(&base))
}

fn creds() -> ErpCreds {
    ErpCreds::new("21XX12345", "hunter2").with_answer(QUESTION, "Tofu")
}

async fn mount_ceremony(server: &MockServer, sso_token: &str) {
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page(SESSION_TOKEN)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SSOAdministration/getSecurityQues.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(QUESTION))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SSOAdministration/auth.htm"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/SSOAdministration/first"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/SSOAdministration/first"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("/IIT_ERP3/home.jsp?ssoToken={sso_token}").as_str(),
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/home.jsp"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

// ── Token validity ─────────────────────────────────────────────────────

#[tokio::test]
async fn exact_content_type_means_the_token_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .and(query_param("ssoToken", "SSO123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(AUTHENTICATED_PAGE, "text/html;charset=UTF-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    let token = SsoToken::from("SSO123".to_string());
    assert!(client.is_sso_token_valid(&token).await.unwrap());
}

#[tokio::test]
async fn spaced_charset_means_the_token_was_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                login_page(SESSION_TOKEN).into_bytes(),
                "text/html; charset=UTF-8",
            ),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    let token = SsoToken::from("EXPIRED".to_string());
    assert!(!client.is_sso_token_valid(&token).await.unwrap());
}

#[tokio::test]
async fn non_html_response_means_the_token_was_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"error":"invalid"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    let token = SsoToken::from("EXPIRED".to_string());
    assert!(!client.is_sso_token_valid(&token).await.unwrap());
}

// ── Session liveness ───────────────────────────────────────────────────

#[tokio::test]
async fn welcome_404_means_the_session_is_alive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/welcome.jsp"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    assert!(client.is_session_alive().await.unwrap());
}

#[tokio::test]
async fn served_welcome_page_means_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/welcome.jsp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page(SESSION_TOKEN)))
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    assert!(!client.is_session_alive().await.unwrap());
}

#[tokio::test]
async fn welcome_redirect_to_login_means_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/welcome.jsp"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/IIT_ERP3/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page(SESSION_TOKEN)))
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    assert!(!client.is_session_alive().await.unwrap());
}

#[tokio::test]
async fn server_error_on_welcome_means_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/welcome.jsp"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, Config::default());
    assert!(!client.is_session_alive().await.unwrap());
}

#[tokio::test]
async fn login_leaves_a_cookie_the_liveness_check_uses() {
    let server = MockServer::start().await;
    mount_ceremony(&server, "SSO123").await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/welcome.jsp"))
        .and(header("cookie", "ssoToken=SSO123"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(
        &server,
        Config::default().with_otp_policy(OtpPolicy::Skip),
    );
    client.login(&creds(), OtpInput::None).await.unwrap();
    assert!(client.is_session_alive().await.unwrap());
}

// ── Token cache ────────────────────────────────────────────────────────

#[tokio::test]
async fn cached_token_skips_the_ceremony() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .and(query_param("ssoToken", "CACHED"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(AUTHENTICATED_PAGE, "text/html;charset=UTF-8"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SSOAdministration/getSecurityQues.htm"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/SSOAdministration/auth.htm"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("tokens.json");
    FileTokenStore::new(&cache_path)
        .store(&CachedTokens::new(
            SessionToken::from("OLDSESSION".to_string()),
            SsoToken::from("CACHED".to_string()),
        ))
        .await
        .unwrap();

    let client = client_for(&server, Config::default().with_token_cache(&cache_path));
    let tokens = client.login(&creds(), OtpInput::None).await.unwrap();

    assert_eq!(tokens.session_token.as_str(), "OLDSESSION");
    assert_eq!(tokens.sso_token.as_str(), "CACHED");
}

#[tokio::test]
async fn stale_cached_token_falls_back_to_the_full_ceremony() {
    let server = MockServer::start().await;
    // The validity probe answers with the rejection content type.
    Mock::given(method("GET"))
        .and(path("/IIT_ERP3/"))
        .and(query_param("ssoToken", "STALE"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                login_page(SESSION_TOKEN).into_bytes(),
                "text/html; charset=UTF-8",
            ),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_ceremony(&server, "FRESH").await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("tokens.json");
    let store = FileTokenStore::new(&cache_path);
    store
        .store(&CachedTokens::new(
            SessionToken::from("OLDSESSION".to_string()),
            SsoToken::from("STALE".to_string()),
        ))
        .await
        .unwrap();

    let client = client_for(
        &server,
        Config::default()
            .with_otp_policy(OtpPolicy::Skip)
            .with_token_cache(&cache_path),
    );
    let tokens = client.login(&creds(), OtpInput::None).await.unwrap();
    assert_eq!(tokens.sso_token.as_str(), "FRESH");

    // The fresh pair replaced the stale one on disk.
    let cached = store.load().await.unwrap().unwrap();
    assert_eq!(cached.sso_token.as_str(), "FRESH");
    assert_eq!(cached.session_token.as_str(), SESSION_TOKEN);
}

#[tokio::test]
async fn fresh_login_populates_an_empty_cache() {
    let server = MockServer::start().await;
    mount_ceremony(&server, "SSO123").await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("state").join("tokens.json");

    let client = client_for(
        &server,
        Config::default()
            .with_otp_policy(OtpPolicy::Skip)
            .with_token_cache(&cache_path),
    );
    client.login(&creds(), OtpInput::None).await.unwrap();

    let cached = FileTokenStore::new(&cache_path).load().await.unwrap().unwrap();
    assert_eq!(cached.sso_token.as_str(), "SSO123");
}

#[tokio::test]
async fn corrupt_cache_is_ignored() {
    let server = MockServer::start().await;
    mount_ceremony(&server, "SSO123").await;

    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("tokens.json");
    tokio::fs::write(&cache_path, b"{ not json").await.unwrap();

    let client = client_for(
        &server,
        Config::default()
            .with_otp_policy(OtpPolicy::Skip)
            .with_token_cache(&cache_path),
    );
    let tokens = client.login(&creds(), OtpInput::None).await.unwrap();
    assert_eq!(tokens.sso_token.as_str(), "SSO123");
}
