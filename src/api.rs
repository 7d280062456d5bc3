// API client module: a small blocking client for the Instamojo REST API.
// Every operation returns an `Envelope`; transport, decode, auth and
// filesystem failures are folded into it rather than returned as errors.

use std::fs::File;
use std::path::Path;

use crate::action::{api_url, auth_form, Action};
use crate::config::ApiConfig;
use crate::error::{ApiError, TransportError};
use crate::session::Session;
use crate::transport::{HttpRequest, HttpTransport, Transport, APP_ID_HEADER, AUTH_TOKEN_HEADER};
use crate::types::{Ack, AuthToken, Envelope, OfferDetail, OfferList, UploadTicket};

const UPLOAD_FIELD: &str = "fileUpload";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client holding the transport, the API root and the session it acts for.
pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    session: Session,
}

impl ApiClient<HttpTransport> {
    /// Client for a caller that already holds a session token.
    pub fn with_token(config: &ApiConfig, app_id: &str, token: &str) -> Result<Self, TransportError> {
        let session = Session::with_token(&config.api_version, app_id, token);
        Ok(Self::with_transport(HttpTransport::new(config.timeout)?, config, session))
    }

    /// Client that mints a token from username/password on first use and
    /// marks it for revocation.
    pub fn with_credentials(
        config: &ApiConfig,
        app_id: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, TransportError> {
        let session = Session::with_credentials(&config.api_version, app_id, username, password);
        Ok(Self::with_transport(HttpTransport::new(config.timeout)?, config, session))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T, config: &ApiConfig, session: Session) -> Self {
        ApiClient {
            transport,
            base_url: config.base_url.clone(),
            session,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Install a token supplied by the caller. It is not self-issued.
    pub fn set_token(&mut self, token: &str) {
        self.session.token = Some(token.to_string()).filter(|t| !t.is_empty());
        self.session.self_issued = false;
    }

    /// Whether the current token was obtained implicitly by this client.
    pub fn is_self_issued(&self) -> bool {
        self.session.self_issued && self.session.token.is_some()
    }

    /// Retrieve all offers created under the app.
    pub fn list_offers(&mut self) -> Envelope<OfferList> {
        self.dispatch(Action::ListOffers, "")
    }

    /// Retrieve the full details of one offer.
    pub fn offer_details(&mut self, slug: &str) -> Envelope<OfferDetail> {
        self.dispatch(Action::OfferDetails, slug)
    }

    pub fn archive_offer(&mut self, slug: &str) -> Envelope<Ack> {
        self.dispatch(Action::ArchiveOffer, slug)
    }

    /// Exchange a username/password for a fresh token. Does not touch the
    /// session token.
    pub fn get_new_auth_token(&mut self, username: &str, password: &str) -> Envelope<AuthToken> {
        let form = auth_form(username, password);
        self.dispatch(Action::Auth, &form)
    }

    /// Revoke `token`. If it is the session token, the session forgets it.
    pub fn delete_auth_token(&mut self, token: &str) -> Envelope<Ack> {
        let envelope = self.dispatch(Action::Deauth, token);
        if self.session.token.as_deref() == Some(token) {
            self.session.token = None;
            self.session.self_issued = false;
        }
        envelope
    }

    /// Revoke the session token, minting one first if needed.
    pub fn delete_current_token(&mut self) -> Envelope<Ack> {
        match self.ensure_token(&Action::Deauth) {
            Ok(token) => self.delete_auth_token(&token),
            Err(e) => Envelope::failure(e),
        }
    }

    /// Revoke a token this client minted implicitly. Returns `None` when
    /// there is nothing to revoke.
    pub fn revoke_self_issued(&mut self) -> Option<Envelope<Ack>> {
        if !self.is_self_issued() {
            return None;
        }
        let token = self.session.token.clone()?;
        tracing::info!("revoking auth token issued for this session");
        Some(self.delete_auth_token(&token))
    }

    /// Upload a local file: fetch an upload URL, then POST the file to it
    /// as a multipart form. The upload response body is returned verbatim
    /// in `upload_json`.
    pub fn upload_file(&mut self, file_path: &Path) -> Envelope<UploadTicket> {
        let mut envelope: Envelope<UploadTicket> = self.dispatch(Action::GetFileUploadUrl, "");
        if !envelope.success || envelope.payload.upload_url.is_empty() {
            return envelope;
        }

        let file = match File::open(file_path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "cannot open upload file");
                return envelope.fail_with(ApiError::from(e));
            }
        };
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());

        let upload_url = envelope.payload.upload_url.clone();
        tracing::debug!(url = %upload_url, file = %file_name, "uploading file");
        match self.transport.upload(&upload_url, UPLOAD_FIELD, &file_name, file) {
            Ok(body) => {
                envelope.payload.upload_json = body;
                envelope
            }
            Err(e) => envelope.fail_with(ApiError::Upload {
                url: upload_url,
                reason: e.message,
            }),
        }
    }

    fn dispatch<P>(&mut self, action: Action, data: &str) -> Envelope<P>
    where
        P: serde::de::DeserializeOwned + Default,
    {
        match self.call(&action, data) {
            Ok(body) => Envelope::decode(&body),
            Err(e) => Envelope::failure(e),
        }
    }

    /// Run the implicit auth step if needed, then perform one round trip.
    fn call(&mut self, action: &Action, data: &str) -> Result<String, ApiError> {
        let token = if action.needs_token() {
            Some(self.ensure_token(action)?)
        } else {
            None
        };

        let route = action.route(data);
        let url = api_url(&self.base_url, &self.session.api_version, &route.path);

        let mut headers = vec![(APP_ID_HEADER, self.session.app_id.clone())];
        if let Some(token) = token {
            headers.push((AUTH_TOKEN_HEADER, token));
        }
        if *action == Action::Auth {
            headers.push(("Content-Type", FORM_CONTENT_TYPE.to_string()));
        }

        let request = HttpRequest {
            method: route.method,
            url,
            headers,
            body: route.body,
        };
        tracing::debug!(action = %action, method = %request.method, url = %request.url, "calling API");

        self.transport.send(&request).map_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "API request failed");
            ApiError::Transport {
                url: request.url.clone(),
                reason: e.message,
            }
        })
    }

    /// Return the session token, minting one from the stored credentials
    /// when absent. The credentials are consumed by the first attempt.
    fn ensure_token(&mut self, action: &Action) -> Result<String, ApiError> {
        if let Some(token) = &self.session.token {
            return Ok(token.clone());
        }

        let credentials = self
            .session
            .credentials
            .take()
            .ok_or(ApiError::MissingCredentials)?;
        tracing::info!(action = %action, "no auth token supplied, requesting one");

        let envelope = self.get_new_auth_token(credentials.username(), credentials.password());
        drop(credentials);

        if envelope.success && !envelope.payload.token.is_empty() {
            self.session.token = Some(envelope.payload.token.clone());
            self.session.self_issued = true;
            Ok(envelope.payload.token)
        } else {
            tracing::warn!(message = %envelope.message, "implicit authentication failed");
            Err(ApiError::AuthFailed(envelope.message))
        }
    }
}
