// Command-line flags and their validation. Validation runs before any
// network call; `main` prints the usage text and exits on failure.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ApiConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::session::Credentials;

pub const SUPPORTED_ACTIONS: &[&str] = &[
    "auth",
    "deauth",
    "listoffers",
    "offerdetails",
    "archiveoffer",
    "uploadfile",
];

#[derive(Parser, Debug, Default)]
#[command(name = "instamojo-tool")]
#[command(about = "Command-line client for the Instamojo API")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "API action to perform")]
    pub action: Option<String>,
    #[arg(long, env = "INSTAMOJO_APP_ID", help = "App ID")]
    pub app: Option<String>,
    #[arg(long, env = "INSTAMOJO_AUTH_TOKEN", help = "Auth token")]
    pub token: Option<String>,
    #[arg(long, help = "Username (for auth)")]
    pub user: Option<String>,
    #[arg(long, help = "Password (for auth)")]
    pub passwd: Option<String>,
    #[arg(long, help = "Prompt for the password instead of passing --passwd")]
    pub ask_passwd: bool,
    #[arg(long, help = "Offer slug")]
    pub offerslug: Option<String>,
    #[arg(long, help = "File to upload")]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_API_VERSION, help = "API version")]
    pub api_version: String,
    #[arg(long, env = "INSTAMOJO_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    #[arg(
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Request timeout in seconds"
    )]
    pub timeout: u64,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Action names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionName {
    Auth,
    Deauth,
    ListOffers,
    OfferDetails,
    ArchiveOffer,
    UploadFile,
}

impl ActionName {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "auth" => Some(ActionName::Auth),
            "deauth" => Some(ActionName::Deauth),
            "listoffers" => Some(ActionName::ListOffers),
            "offerdetails" => Some(ActionName::OfferDetails),
            "archiveoffer" => Some(ActionName::ArchiveOffer),
            "uploadfile" => Some(ActionName::UploadFile),
            _ => None,
        }
    }
}

/// A validated action with the arguments it needs.
#[derive(Debug)]
pub enum Command {
    Auth(Credentials),
    Deauth,
    ListOffers,
    OfferDetails { slug: String },
    ArchiveOffer { slug: String },
    UploadFile { path: PathBuf },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Auth(_) => "auth",
            Command::Deauth => "deauth",
            Command::ListOffers => "listoffers",
            Command::OfferDetails { .. } => "offerdetails",
            Command::ArchiveOffer { .. } => "archiveoffer",
            Command::UploadFile { .. } => "uploadfile",
        }
    }
}

/// How the session authenticates.
#[derive(Debug)]
pub enum Login {
    Token(String),
    Password(Credentials),
}

#[derive(Debug)]
pub struct Invocation {
    pub command: Command,
    pub app_id: String,
    pub login: Login,
    pub config: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

impl Cli {
    pub fn validate(self) -> Result<Invocation, UsageError> {
        let Some(action) = non_empty(self.action.as_deref()).and_then(ActionName::parse) else {
            return Err(UsageError(format!(
                "You must specify the action on command line: {}",
                quoted_actions()
            )));
        };
        let Some(app_id) = non_empty(self.app.as_deref()) else {
            return Err(UsageError(
                "You must specify the App-ID from command line via the '--app' parameter.".into(),
            ));
        };

        let token = non_empty(self.token.as_deref());
        let user = non_empty(self.user.as_deref());
        let passwd = non_empty(self.passwd.as_deref());
        let credentials = match (user, passwd) {
            (Some(u), Some(p)) => Some(Credentials::new(u, p)),
            _ => None,
        };
        let auth_credentials = match (action, &credentials) {
            (ActionName::Auth, Some(c)) => Some(Credentials::new(c.username(), c.password())),
            _ => None,
        };
        let login = match (token, credentials) {
            (Some(token), _) => Login::Token(token.to_string()),
            (None, Some(credentials)) => Login::Password(credentials),
            (None, None) => {
                return Err(UsageError(
                    "If '--token' is not supplied, then both '--user' and '--passwd' parameters must be supplied from command line.".into(),
                ))
            }
        };

        let slug = non_empty(self.offerslug.as_deref()).map(String::from);
        let command = match action {
            ActionName::Auth => match auth_credentials {
                Some(credentials) => Command::Auth(credentials),
                None => {
                    return Err(UsageError(
                        "The 'auth' action needs both '--user' and '--passwd'.".into(),
                    ))
                }
            },
            ActionName::Deauth => Command::Deauth,
            ActionName::ListOffers => Command::ListOffers,
            ActionName::OfferDetails => Command::OfferDetails {
                slug: require_slug(slug, "offerdetails")?,
            },
            ActionName::ArchiveOffer => Command::ArchiveOffer {
                slug: require_slug(slug, "archiveoffer")?,
            },
            ActionName::UploadFile => match self.file.clone() {
                Some(path) => Command::UploadFile { path },
                None => {
                    return Err(UsageError(
                        "You must specify the file to upload via the command line option '--file'."
                            .into(),
                    ))
                }
            },
        };

        if self.timeout == 0 {
            return Err(UsageError(
                "The '--timeout' value must be at least 1 second.".into(),
            ));
        }
        let config = ApiConfig::default()
            .with_base_url(self.base_url.clone())
            .with_api_version(self.api_version.clone())
            .with_timeout(Duration::from_secs(self.timeout));

        Ok(Invocation {
            command,
            app_id: app_id.to_string(),
            login,
            config,
        })
    }
}

pub fn usage() -> String {
    format!(
        "* instamojo-tool v {}\n\n\
         Usage: instamojo-tool --action <Action> --app <App ID> [--token <Auth Token>] [--user <Username>] [--passwd <Password>] [--offerslug <Offer Slug>] [--file <Path>]\n\n\
         Currently available actions: {}\n\
         Example: instamojo-tool --action listoffers --app <your App-ID> --token <auth token>\n\
         Example: instamojo-tool --action listoffers --app <your App-ID> --user <your username> --passwd <your password>\n\
         Example: instamojo-tool --action offerdetails --offerslug <offer slug> --app <your App-ID> --token <auth token>",
        env!("CARGO_PKG_VERSION"),
        SUPPORTED_ACTIONS.join(", ")
    )
}

fn quoted_actions() -> String {
    SUPPORTED_ACTIONS
        .iter()
        .map(|a| format!("'{}'", a))
        .collect::<Vec<_>>()
        .join(", ")
}

fn require_slug(slug: Option<String>, action: &str) -> Result<String, UsageError> {
    slug.ok_or_else(|| {
        UsageError(format!(
            "You must specify the Offer Slug via the command line option '--offerslug' for '{}'.",
            action
        ))
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
