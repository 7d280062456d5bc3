// Action routing: maps a logical action name onto the REST verb, path and
// request body the Instamojo API expects. Pure data mapping, no I/O.

use reqwest::Method;
use std::fmt;
use url::form_urlencoded;
use zeroize::Zeroizing;

/// Logical API actions understood by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Auth,
    Deauth,
    ListOffers,
    OfferDetails,
    ArchiveOffer,
    GetFileUploadUrl,
    /// Unknown name, sent as a GET on the literal name.
    Other(String),
}

/// Method, path and body for one API call. `path` is relative to the
/// versioned API root and always ends with `/`.
#[derive(Debug)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub body: Zeroizing<Vec<u8>>,
}

impl Action {
    pub fn parse(name: &str) -> Self {
        match name {
            "auth" => Action::Auth,
            "deauth" => Action::Deauth,
            "listoffers" => Action::ListOffers,
            "offerdetails" => Action::OfferDetails,
            "archiveoffer" => Action::ArchiveOffer,
            "getfileuploadurl" => Action::GetFileUploadUrl,
            other => Action::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Auth => "auth",
            Action::Deauth => "deauth",
            Action::ListOffers => "listoffers",
            Action::OfferDetails => "offerdetails",
            Action::ArchiveOffer => "archiveoffer",
            Action::GetFileUploadUrl => "getfileuploadurl",
            Action::Other(name) => name,
        }
    }

    /// Whether requests for this action carry the session token header.
    pub fn needs_token(&self) -> bool {
        !matches!(self, Action::Auth)
    }

    /// Build the route for this action. `data` is the form-encoded
    /// credentials for `Auth`, the token for `Deauth`, the offer slug for
    /// `OfferDetails`/`ArchiveOffer`, and ignored otherwise.
    pub fn route(&self, data: &str) -> Route {
        let (method, path, body) = match self {
            Action::Auth => (Method::POST, "auth".to_string(), data.as_bytes().to_vec()),
            Action::Deauth => (Method::DELETE, format!("auth/{}", path_segment(data)), Vec::new()),
            Action::ListOffers => (Method::GET, "offer".to_string(), Vec::new()),
            Action::OfferDetails => (Method::GET, format!("offer/{}", path_segment(data)), Vec::new()),
            Action::ArchiveOffer => (Method::DELETE, format!("offer/{}", path_segment(data)), Vec::new()),
            Action::GetFileUploadUrl => {
                (Method::GET, "offer/get_file_upload_url".to_string(), Vec::new())
            }
            Action::Other(name) => (Method::GET, name.clone(), Vec::new()),
        };
        Route {
            method,
            path: with_trailing_slash(path),
            body: Zeroizing::new(body),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form-encode the auth payload. The result holds the password, so it is
/// wiped on drop.
pub fn auth_form(username: &str, password: &str) -> Zeroizing<String> {
    Zeroizing::new(
        form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish(),
    )
}

/// Join base URL, API version and route path into the full request URL.
pub fn api_url(base_url: &str, api_version: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let version = api_version.trim_matches('/');
    with_trailing_slash(format!("{}/{}/{}", base, version, path.trim_start_matches('/')))
}

/// Percent-encode one path segment so `/`, `?`, `#` and friends in a token
/// or slug cannot change the route.
fn path_segment(value: &str) -> String {
    // The form serializer escapes everything but `*-._` and alphanumerics;
    // its `+` always stands for a space, which paths spell `%20`.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn with_trailing_slash(mut path: String) -> String {
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}
