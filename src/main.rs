// Entrypoint for the CLI application.
// - Parses and validates flags, builds the API client and hands it to the
//   UI layer.
// - The only place that decides exit statuses.

use clap::Parser;
use instamojo_cli::cli::{usage, Cli, Login};
use instamojo_cli::ui::{self, Outcome};
use instamojo_cli::ApiClient;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_USAGE: u8 = 1;
const EXIT_AUTH: u8 = 3;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialise logging: {:#}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mut cli: Cli) -> anyhow::Result<ExitCode> {
    ui::resolve_password(&mut cli)?;

    let invocation = match cli.validate() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}\n", e);
            eprintln!("{}", usage());
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let mut client = match &invocation.login {
        Login::Token(token) => ApiClient::with_token(&invocation.config, &invocation.app_id, token)?,
        Login::Password(credentials) => ApiClient::with_credentials(
            &invocation.config,
            &invocation.app_id,
            credentials.username(),
            credentials.password(),
        )?,
    };
    drop(invocation.login);

    let mut stdout = std::io::stdout().lock();
    let code = match ui::execute(&mut client, &invocation.command, &mut stdout)? {
        Outcome::Completed => ExitCode::SUCCESS,
        Outcome::AuthFailed(reason) => {
            eprintln!("Failed to get an auth token.");
            eprintln!("{}", reason);
            ExitCode::from(EXIT_AUTH)
        }
        Outcome::UndecodableDeauth(message) => {
            eprintln!("{}", message);
            ExitCode::from(EXIT_AUTH)
        }
    };
    Ok(code)
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
