// Wire types for the Instamojo API and the uniform response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

const EMPTY_FAILURE_MESSAGE: &str = "API request failed without a message.";

/// Deserialize a JSON `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One offer. The listing endpoint only fills `shorturl`, `title`, `slug`
/// and `status`; the rest stays empty until fetched through offer details.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Offer {
    #[serde(rename = "shorturl", deserialize_with = "null_as_default")]
    pub short_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub base_price: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quantity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub venue: String,
    #[serde(deserialize_with = "null_as_default")]
    pub redirect_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub file_upload_json: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cover_image_json: String,
}

/// Payload of the offer listing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OfferList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub offers: Vec<Offer>,
}

/// Payload of the offer details call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OfferDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub offer: Offer,
}

/// Payload of the auth call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AuthToken {
    #[serde(default, deserialize_with = "null_as_default")]
    pub token: String,
}

/// Payload of the upload flow. `upload_json` is the raw body returned by
/// the upload POST and is never part of the API response itself.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UploadTicket {
    #[serde(default, deserialize_with = "null_as_default")]
    pub upload_url: String,
    #[serde(skip)]
    pub upload_json: String,
}

/// Empty payload for archive and deauth responses.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Ack {}

/// Uniform `{success, message, ...payload}` response shape.
///
/// `error` is set only for client-side failures (transport, decode, auth,
/// filesystem). A server answering `success: false` leaves it `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Envelope<P> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(flatten)]
    pub payload: P,
    #[serde(skip)]
    pub error: Option<ApiError>,
}

impl<P: DeserializeOwned + Default> Envelope<P> {
    /// Decode a response body. Never fails: a body that does not parse
    /// becomes a failed envelope carrying the parse error text.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Envelope<P>>(body) {
            Ok(mut envelope) => {
                if !envelope.success && envelope.message.is_empty() {
                    envelope.message = EMPTY_FAILURE_MESSAGE.to_string();
                }
                envelope
            }
            Err(e) => {
                tracing::warn!(error = %e, "response body is not valid JSON");
                Envelope::failure(ApiError::from(e))
            }
        }
    }
}

impl<P: Default> Envelope<P> {
    /// Failed envelope whose message is the error's display text.
    pub fn failure(error: ApiError) -> Self {
        Envelope {
            success: false,
            message: error.to_string(),
            payload: P::default(),
            error: Some(error),
        }
    }
}

impl<P> Envelope<P> {
    /// Keep the payload but mark the envelope failed with `error`.
    pub fn fail_with(mut self, error: ApiError) -> Self {
        self.success = false;
        self.message = error.to_string();
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_offer_listing() {
        let body = r#"{
            "success": true,
            "offers": [
                {"shorturl": "https://imojo.in/a", "title": "Ebook", "slug": "ebook", "status": "Live"},
                {"shorturl": "https://imojo.in/b", "title": "Course", "slug": "course", "status": "Archived"}
            ]
        }"#;

        let envelope = Envelope::<OfferList>::decode(body);
        assert!(envelope.success);
        assert!(envelope.error.is_none());
        assert_eq!(envelope.payload.offers.len(), 2);

        let first = &envelope.payload.offers[0];
        assert_eq!(first.short_url, "https://imojo.in/a");
        assert_eq!(first.title, "Ebook");
        assert_eq!(first.slug, "ebook");
        assert_eq!(first.status, "Live");
        assert_eq!(first.base_price, "");
        assert_eq!(envelope.payload.offers[1].status, "Archived");
    }

    #[test]
    fn malformed_body_keeps_parse_error_text() {
        let parse_error = serde_json::from_str::<Envelope<OfferList>>("{not json")
            .unwrap_err()
            .to_string();

        let envelope = Envelope::<OfferList>::decode("{not json");
        assert!(!envelope.success);
        assert_eq!(envelope.message, format!("Invalid JSON: {}", parse_error));
        assert!(matches!(envelope.error, Some(ApiError::Decode(_))));
        assert!(envelope.payload.offers.is_empty());
    }

    #[test]
    fn malformed_body_for_every_payload_soft_fails() {
        assert!(!Envelope::<OfferDetail>::decode("").success);
        assert!(!Envelope::<AuthToken>::decode("<html>").success);
        assert!(!Envelope::<UploadTicket>::decode("[1,2").success);
        assert!(!Envelope::<Ack>::decode("null").success);
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let details = Envelope::<OfferDetail>::decode(
            r#"{"success":true,"message":"","offer":{"slug":"ebook","venue":null,"note":null}}"#,
        );
        assert!(details.success);
        assert!(details.error.is_none());
        assert_eq!(details.payload.offer.slug, "ebook");
        assert_eq!(details.payload.offer.venue, "");
        assert_eq!(details.payload.offer.note, "");

        let list = Envelope::<OfferList>::decode(r#"{"success":true,"message":null,"offers":null}"#);
        assert!(list.success);
        assert_eq!(list.message, "");
        assert!(list.payload.offers.is_empty());

        let auth = Envelope::<AuthToken>::decode(r#"{"success":null,"message":null,"token":null}"#);
        assert!(!auth.success);
        assert_eq!(auth.payload.token, "");
        assert_eq!(auth.message, EMPTY_FAILURE_MESSAGE);

        let upload = Envelope::<UploadTicket>::decode(r#"{"success":true,"upload_url":null}"#);
        assert!(upload.success);
        assert!(upload.payload.upload_url.is_empty());
    }

    #[test]
    fn server_failure_passes_through_without_local_error() {
        let envelope =
            Envelope::<Ack>::decode(r#"{"success": false, "message": "Offer not found."}"#);
        assert!(!envelope.success);
        assert_eq!(envelope.message, "Offer not found.");
        assert!(envelope.error.is_none());
    }

    #[test]
    fn server_failure_without_message_gets_one() {
        let envelope = Envelope::<AuthToken>::decode(r#"{"success": false}"#);
        assert!(!envelope.success);
        assert_eq!(envelope.message, EMPTY_FAILURE_MESSAGE);
    }

    #[test]
    fn decodes_auth_token_and_upload_url() {
        let auth = Envelope::<AuthToken>::decode(r#"{"success": true, "token": "abc"}"#);
        assert_eq!(auth.payload.token, "abc");

        let upload = Envelope::<UploadTicket>::decode(
            r#"{"success": true, "upload_url": "https://upload.example/x"}"#,
        );
        assert_eq!(upload.payload.upload_url, "https://upload.example/x");
        assert!(upload.payload.upload_json.is_empty());
    }

    #[test]
    fn offer_round_trips_through_wire_json() {
        let offer = Offer {
            short_url: "https://imojo.in/x".into(),
            title: "Workshop".into(),
            slug: "workshop".into(),
            status: "Live".into(),
            description: "Two day workshop".into(),
            currency: "INR".into(),
            base_price: "499.00".into(),
            quantity: "20".into(),
            start_date: "2013-09-01 10:00".into(),
            end_date: "2013-09-02 18:00".into(),
            timezone: "Asia/Kolkata".into(),
            venue: "Bangalore".into(),
            redirect_url: "https://example.com/thanks".into(),
            note: "Bring a laptop".into(),
            file_upload_json: "{}".into(),
            cover_image_json: "{}".into(),
        };

        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["shorturl"], "https://imojo.in/x");
        assert_eq!(json["base_price"], "499.00");

        let parsed: Offer = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, offer);
    }
}
