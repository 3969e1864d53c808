//! Terminal client for the film ticketing service.
//!
//! Signs in (optionally), then reads commands from stdin until `quit`.

use anyhow::{Context, Result};
use ft_client::{app::App, config::ClientConfig, logging};
use pico_args::Arguments;
use std::{
    io::{self, Read},
    path::PathBuf,
};

const HELP: &str = "\
Browse films and buy tickets from the terminal

USAGE:
  ft_client [OPTIONS]

OPTIONS:
  --api-url URL         API base URL  [default: http://localhost:8080/api]
  --session-file PATH   Where the session is kept  [default: .film_tickets/session.json]
  --email EMAIL         Sign in with this email on startup
  --password PASS       Password for --email

FLAGS:
  --memory              Do not persist the session between runs
  -h, --help            Print help information

ENVIRONMENT:
  FILMS_API_URL, FILMS_SESSION_FILE, FILMS_PAGE_SIZE,
  FILMS_REQUEST_TIMEOUT_SECS, RUST_LOG
";

struct Args {
    api_url: Option<String>,
    session_file: Option<PathBuf>,
    in_memory: bool,
    email: Option<String>,
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        api_url: pargs.opt_value_from_str("--api-url").ok().flatten(),
        session_file: pargs.opt_value_from_str("--session-file").ok().flatten(),
        in_memory: pargs.contains("--memory"),
        email: pargs.opt_value_from_str("--email").ok().flatten(),
        password: pargs.opt_value_from_str("--password").ok().flatten(),
    };

    logging::init();

    let config = ClientConfig::from_env(args.api_url, args.session_file, args.in_memory)
        .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(api_url = %config.api_url, "Starting film tickets client");

    let mut app = App::new(&config)?;

    let mut script = String::new();
    if let Some(email) = args.email {
        script.push_str("login ");
        script.push_str(&email);
        if let Some(password) = args.password {
            script.push(' ');
            script.push_str(&password);
        }
        script.push('\n');
    }

    let stdin = io::stdin();
    let input = io::Cursor::new(script).chain(stdin.lock());
    app.run(input, io::stdout().lock()).await
}
