// Library root
// -----------
// This crate exposes the Instamojo API client used by the `instamojo-tool`
// binary (`main.rs`).
//
// Module responsibilities:
// - `action`: maps logical action names to REST verbs, paths and bodies.
// - `transport`: the blocking HTTP transport and the trait it implements.
// - `types`: offers and the `{success, message, ...}` response envelope.
// - `session`: app id, token and the credentials used to mint a token.
// - `api`: the client tying these together, including implicit auth and
//   the file upload flow.
// - `cli` / `ui`: flag parsing, validation and terminal rendering.
pub mod action;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;
pub mod ui;

pub use action::Action;
pub use api::ApiClient;
pub use config::ApiConfig;
pub use error::{ApiError, TransportError};
pub use session::{Credentials, Session};
pub use transport::{HttpRequest, HttpTransport, Transport};
pub use types::{Ack, AuthToken, Envelope, Offer, OfferDetail, OfferList, UploadTicket};
