//! Markup and URL extraction helpers for the portal's responses.

use scraper::{Html, Selector};
use url::Url;

/// Element id of the hidden input carrying the session token on the
/// portal's entry page.
pub(crate) const SESSION_TOKEN_ELEMENT_ID: &str = "sessionToken";

/// Query parameter carrying the SSO token on the post-login redirect.
pub(crate) const SSO_TOKEN_PARAM: &str = "ssoToken";

/// Content type the portal serves authenticated pages with. No space
/// before the charset; the spaced variant is the rejection page.
pub(crate) const AUTHENTICATED_CONTENT_TYPE: &str = "text/html;charset=UTF-8";

/// Extract one attribute from the element with the given id.
///
/// Returns `None` when the document has no such element or the element
/// lacks the attribute.
#[must_use]
pub fn attribute_by_id(html: &str, id: &str, attribute: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"[id="{id}"]"#)).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;
    element.value().attr(attribute).map(str::to_string)
}

/// Pull the SSO token out of a redirect target URL.
pub(crate) fn sso_token_from_location(location: &Url) -> Option<String> {
    location
        .query_pairs()
        .find(|(name, _)| name == SSO_TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Whether a `Content-Type` header value marks an authenticated page.
///
/// The comparison is byte-exact on purpose. The portal answers a live
/// token with `text/html;charset=UTF-8` and everything else with other
/// renditions of the type.
pub(crate) fn is_authenticated_content_type(content_type: &str) -> bool {
    content_type == AUTHENTICATED_CONTENT_TYPE
}
