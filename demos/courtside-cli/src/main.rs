//! Drives a Courtside session from the command line.
//!
//! Every command bootstraps first, exactly like an app start, so running
//! `status` twice in a row shows the cached session being restored.
//!
//! ```text
//! courtside-cli --storage ./creds.json login ana@example.com --password secret
//! courtside-cli --storage ./creds.json status
//! courtside-cli --storage ./creds.json whoami
//! courtside-cli --storage ./creds.json logout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use courtside::prelude::*;
use courtside::telemetry::init_tracing;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "courtside-cli", about = "Courtside session client demo")]
struct Args {
    /// API base URL
    #[arg(long, env = "COURTSIDE_API_URL")]
    api_url: Option<String>,

    /// Credential cache file; omit to keep credentials in memory
    #[arg(long, env = "COURTSIDE_STORAGE_PATH")]
    storage: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "COURTSIDE_HTTP_TIMEOUT_SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the cached session and print it
    Status,
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "COURTSIDE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Fetch the current user from the backend
    Whoami,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// End the session and clear the cache
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(None) {
        eprintln!("{e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            if e.requires_login() {
                eprintln!("not logged in: run `courtside-cli login <email>` first");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CourtsideError> {
    let mut builder = CourtsideClientBuilder::new().config(ClientConfig::from_env()?);
    if let Some(url) = args.api_url {
        builder = builder.api_base_url(url);
    }
    if let Some(secs) = args.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    builder = match args.storage {
        Some(path) => builder.storage_path(path),
        None => builder.in_memory(),
    };
    let client = builder.build()?;

    client.events().subscribe(|event| {
        println!("event: {}", event.kind());
    });
    let outcome = client.bootstrap().await?;

    match args.command {
        Command::Status => {
            println!("bootstrap: {outcome:?}");
            print_state(&client.state());
        }
        Command::Login { email, password } => {
            let user = client.sign_in(&email, &password).await?;
            println!("signed in as {} ({})", user.email, user.id);
        }
        Command::Whoami => {
            let user = client.refresh_user_data().await?;
            print_user(&user);
        }
        Command::Refresh => {
            client.refresh_access_token().await?;
            println!("access token refreshed");
        }
        Command::Logout => {
            client.logout().await;
            println!("logged out");
        }
    }
    Ok(())
}

fn print_state(state: &SessionState) {
    match state.user() {
        Some(user) if state.is_authenticated() => print_user(user),
        _ => match state.error() {
            Some(err) => println!("anonymous (last error: {err})"),
            None => println!("anonymous"),
        },
    }
}

fn print_user(user: &UserProfile) {
    match serde_json::to_string_pretty(user) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{} <{}>", user.id, user.email),
    }
}
