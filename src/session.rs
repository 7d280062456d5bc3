// Per-client session state: app id, API version, the active token and the
// credentials used to mint one.

use std::fmt;
use zeroize::Zeroizing;

/// Username/password pair, wiped from memory when dropped.
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Default)]
pub struct Session {
    pub(crate) app_id: String,
    pub(crate) api_version: String,
    pub(crate) token: Option<String>,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) self_issued: bool,
}

impl Session {
    pub fn with_token(api_version: &str, app_id: &str, token: &str) -> Self {
        Session {
            app_id: app_id.to_string(),
            api_version: api_version.to_string(),
            token: Some(token.to_string()).filter(|t| !t.is_empty()),
            ..Default::default()
        }
    }

    /// The credentials are kept only until the first API call that needs a
    /// token, then dropped.
    pub fn with_credentials(
        api_version: &str,
        app_id: &str,
        username: &str,
        password: &str,
    ) -> Self {
        Session {
            app_id: app_id.to_string(),
            api_version: api_version.to_string(),
            credentials: Some(Credentials::new(username, password)),
            ..Default::default()
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("app_id", &self.app_id)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("credentials", &self.credentials)
            .field("self_issued", &self.self_issued)
            .finish()
    }
}
