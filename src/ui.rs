// UI layer: runs one validated command against the client and renders the
// result in a plain line-oriented layout. Exit codes are left to `main`.

use anyhow::Result;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use crate::api::ApiClient;
use crate::cli::{Cli, Command};
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{Ack, Envelope, Offer};

const RULE: &str = "----------------------------";

/// How a run ended, for `main` to map onto an exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Implicit auth produced no token; the requested call was skipped.
    AuthFailed(String),
    /// A deauth response could not be decoded.
    UndecodableDeauth(String),
}

/// Ask for the password on the terminal when `--ask-passwd` was given
/// without `--passwd`.
pub fn resolve_password(cli: &mut Cli) -> Result<()> {
    if needs_password_prompt(cli) {
        let prompt = match &cli.user {
            Some(user) => format!("Password for {}", user),
            None => "Password".to_string(),
        };
        cli.passwd = Some(Password::new().with_prompt(prompt).interact()?);
    }
    Ok(())
}

/// A supplied token makes the password unused, except for `auth` itself.
fn needs_password_prompt(cli: &Cli) -> bool {
    let has_token = cli.token.as_deref().is_some_and(|t| !t.is_empty());
    let is_auth = cli.action.as_deref() == Some("auth");
    cli.ask_passwd && cli.passwd.is_none() && (is_auth || !has_token)
}

/// Run `command`, then revoke any token minted for this run.
pub fn execute<T: Transport, W: Write>(
    client: &mut ApiClient<T>,
    command: &Command,
    out: &mut W,
) -> Result<Outcome> {
    let outcome = run_command(client, command, out)?;
    if outcome != Outcome::Completed {
        return Ok(outcome);
    }

    if client.is_self_issued() {
        writeln!(out, "Destructing the Auth Token generated specifically for this session.")?;
        if let Some(envelope) = with_spinner("Revoking auth token...", || client.revoke_self_issued()) {
            return render_deauth(&envelope, out);
        }
    }
    Ok(Outcome::Completed)
}

fn run_command<T: Transport, W: Write>(
    client: &mut ApiClient<T>,
    command: &Command,
    out: &mut W,
) -> Result<Outcome> {
    match command {
        Command::Auth(credentials) => {
            let envelope = with_spinner("Requesting auth token...", || {
                client.get_new_auth_token(credentials.username(), credentials.password())
            });
            writeln!(out, "New Auth Token: {}", envelope.payload.token)?;
            print_status(out, "Auth", envelope.success, &envelope.message)?;
        }
        Command::Deauth => {
            let envelope = with_spinner("Revoking auth token...", || client.delete_current_token());
            if let Some(outcome) = auth_failure(&envelope.error) {
                return Ok(outcome);
            }
            return render_deauth(&envelope, out);
        }
        Command::ListOffers => {
            let envelope = with_spinner("Fetching offers...", || client.list_offers());
            if let Some(outcome) = auth_failure(&envelope.error) {
                return Ok(outcome);
            }
            print_status(out, "List Offers", envelope.success, &envelope.message)?;
            writeln!(out, "Total {} Offers", envelope.payload.offers.len())?;
            writeln!(out, "{}", RULE)?;
            for (i, offer) in envelope.payload.offers.iter().enumerate() {
                writeln!(out, "Offer # {}", i + 1)?;
                print_offer_summary(out, offer)?;
                writeln!(out, "{}", RULE)?;
            }
        }
        Command::OfferDetails { slug } => {
            let envelope = with_spinner("Fetching offer...", || client.offer_details(slug));
            if let Some(outcome) = auth_failure(&envelope.error) {
                return Ok(outcome);
            }
            print_status(out, "Offer Details", envelope.success, &envelope.message)?;
            if envelope.success {
                writeln!(out, "{}", RULE)?;
                print_offer_details(out, &envelope.payload.offer)?;
                writeln!(out, "{}", RULE)?;
            }
        }
        Command::ArchiveOffer { slug } => {
            let envelope = with_spinner("Archiving offer...", || client.archive_offer(slug));
            if let Some(outcome) = auth_failure(&envelope.error) {
                return Ok(outcome);
            }
            print_status(out, "Archive Offer", envelope.success, &envelope.message)?;
        }
        Command::UploadFile { path } => {
            let envelope = with_spinner("Uploading...", || client.upload_file(path));
            if let Some(outcome) = auth_failure(&envelope.error) {
                return Ok(outcome);
            }
            print_status(out, "Upload File", envelope.success, &envelope.message)?;
            writeln!(out, "Upload URL: {}", envelope.payload.upload_url)?;
            writeln!(out, "Upload JSON: {}", envelope.payload.upload_json)?;
        }
    }
    Ok(Outcome::Completed)
}

fn render_deauth<W: Write>(envelope: &Envelope<Ack>, out: &mut W) -> Result<Outcome> {
    if let Some(ApiError::Decode(_)) = &envelope.error {
        return Ok(Outcome::UndecodableDeauth(envelope.message.clone()));
    }
    print_status(out, "Delete-Auth", envelope.success, &envelope.message)?;
    Ok(Outcome::Completed)
}

fn auth_failure(error: &Option<ApiError>) -> Option<Outcome> {
    error
        .as_ref()
        .filter(|e| e.is_auth_failure())
        .map(|e| Outcome::AuthFailed(e.to_string()))
}

fn print_status<W: Write>(out: &mut W, label: &str, success: bool, message: &str) -> Result<()> {
    writeln!(out, "{} API Success: {}", label, success)?;
    writeln!(out, "{} API Message: {}", label, message)?;
    Ok(())
}

fn print_offer_summary<W: Write>(out: &mut W, offer: &Offer) -> Result<()> {
    writeln!(out, "Status: {}", offer.status)?;
    writeln!(out, "Title: {}", offer.title)?;
    writeln!(out, "Slug: {}", offer.slug)?;
    writeln!(out, "ShortURL: {}", offer.short_url)?;
    Ok(())
}

fn print_offer_details<W: Write>(out: &mut W, offer: &Offer) -> Result<()> {
    print_offer_summary(out, offer)?;
    writeln!(out, "Base Price: {}", offer.base_price)?;
    writeln!(out, "Currency: {}", offer.currency)?;
    writeln!(out, "Quantity: {}", offer.quantity)?;
    writeln!(out, "Start Date: {}", offer.start_date)?;
    writeln!(out, "End Date: {}", offer.end_date)?;
    writeln!(out, "Timezone: {}", offer.timezone)?;
    writeln!(out, "Venue: {}", offer.venue)?;
    writeln!(out, "RedirectURL: {}", offer.redirect_url)?;
    writeln!(out, "Note: {}", offer.note)?;
    writeln!(out, "Description: {}", offer.description)?;
    Ok(())
}

/// Show a spinner on stderr while `f` runs. indicatif hides it when stderr
/// is not a terminal.
fn with_spinner<R>(message: &'static str, f: impl FnOnce() -> R) -> R {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = f();
    spinner.finish_and_clear();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::TransportError;
    use crate::session::{Credentials, Session};
    use crate::transport::HttpRequest;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs::File;

    /// Replies in order and remembers the URLs it was asked for.
    struct Scripted {
        replies: RefCell<VecDeque<String>>,
        urls: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Scripted {
                replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
                urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn send(&self, request: &HttpRequest) -> Result<String, TransportError> {
            self.urls.borrow_mut().push(request.url.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| TransportError::new("no scripted reply"))
        }

        fn upload(&self, _: &str, _: &str, _: &str, _: File) -> Result<String, TransportError> {
            Err(TransportError::new("uploads not scripted"))
        }
    }

    fn client(session: Session, replies: &[&str]) -> ApiClient<Scripted> {
        let config = ApiConfig::default().with_base_url("https://api.test/api/");
        ApiClient::with_transport(Scripted::new(replies), &config, session)
    }

    fn urls(client: &ApiClient<Scripted>) -> Vec<String> {
        client.transport().urls.borrow().clone()
    }

    fn run(client: &mut ApiClient<Scripted>, command: Command) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = execute(client, &command, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn lists_offers_and_revokes_minted_token() {
        let mut client = client(
            Session::with_credentials("1", "app", "alice", "pw"),
            &[
                r#"{"success":true,"token":"minted"}"#,
                r#"{"success":true,"message":"","offers":[{"title":"Ebook","slug":"ebook","status":"Live","shorturl":"https://imojo.in/e"}]}"#,
                r#"{"success":true,"message":"Token deleted."}"#,
            ],
        );

        let (outcome, output) = run(&mut client, Command::ListOffers);
        assert_eq!(outcome, Outcome::Completed);
        assert!(output.contains("List Offers API Success: true"));
        assert!(output.contains("Total 1 Offers"));
        assert!(output.contains("Offer # 1"));
        assert!(output.contains("Title: Ebook"));
        assert!(output.contains("ShortURL: https://imojo.in/e"));
        assert!(output.contains("Destructing the Auth Token"));
        assert!(output.contains("Delete-Auth API Message: Token deleted."));

        let urls = urls(&client);
        assert_eq!(
            urls,
            vec![
                "https://api.test/api/1/auth/",
                "https://api.test/api/1/offer/",
                "https://api.test/api/1/auth/minted/",
            ]
        );
    }

    #[test]
    fn supplied_token_is_not_revoked() {
        let mut client = client(
            Session::with_token("1", "app", "tok"),
            &[r#"{"success":true,"offer":{"slug":"ebook","currency":"INR","base_price":"10"}}"#],
        );

        let (outcome, output) = run(&mut client, Command::OfferDetails { slug: "ebook".into() });
        assert_eq!(outcome, Outcome::Completed);
        assert!(output.contains("Currency: INR"));
        assert!(output.contains("Base Price: 10"));
        assert!(!output.contains("Destructing"));
        assert_eq!(urls(&client).len(), 1);
    }

    #[test]
    fn failed_implicit_auth_stops_the_run() {
        let mut client = client(
            Session::with_credentials("1", "app", "alice", "wrong"),
            &[r#"{"success":false,"message":"Invalid credentials."}"#],
        );

        let (outcome, output) = run(&mut client, Command::ListOffers);
        assert!(matches!(outcome, Outcome::AuthFailed(ref m) if m.contains("Invalid credentials.")));
        assert!(output.is_empty());
        assert_eq!(urls(&client).len(), 1);
    }

    #[test]
    fn undecodable_deauth_is_reported() {
        let mut client = client(Session::with_token("1", "app", "tok"), &["not json"]);

        let (outcome, _) = run(&mut client, Command::Deauth);
        assert!(matches!(outcome, Outcome::UndecodableDeauth(ref m) if m.starts_with("Invalid JSON: ")));
    }

    #[test]
    fn auth_prints_new_token() {
        let mut client = client(
            Session::with_credentials("1", "app", "alice", "pw"),
            &[r#"{"success":true,"token":"fresh","message":"ok"}"#],
        );

        let (outcome, output) = run(&mut client, Command::Auth(Credentials::new("alice", "pw")));
        assert_eq!(outcome, Outcome::Completed);
        assert!(output.contains("New Auth Token: fresh"));
        assert!(output.contains("Auth API Success: true"));
        assert!(!output.contains("Destructing"));
    }

    fn ask_cli(action: &str, token: Option<&str>) -> Cli {
        Cli {
            action: Some(action.into()),
            app: Some("app-1".into()),
            token: token.map(String::from),
            user: Some("alice".into()),
            ask_passwd: true,
            ..Default::default()
        }
    }

    #[test]
    fn token_skips_password_prompt() {
        assert!(!needs_password_prompt(&ask_cli("listoffers", Some("tok"))));
        assert!(!needs_password_prompt(&ask_cli("deauth", Some("tok"))));
    }

    #[test]
    fn password_prompt_when_it_will_be_used() {
        assert!(needs_password_prompt(&ask_cli("listoffers", None)));
        assert!(needs_password_prompt(&ask_cli("listoffers", Some(""))));
        assert!(needs_password_prompt(&ask_cli("auth", Some("tok"))));

        let mut given = ask_cli("listoffers", None);
        given.passwd = Some("pw".into());
        assert!(!needs_password_prompt(&given));

        let mut not_asked = ask_cli("listoffers", None);
        not_asked.ask_passwd = false;
        assert!(!needs_password_prompt(&not_asked));
    }
}
