//! `loopauth` command-line client

mod browser;
mod commands;
mod exit;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use loopauth_domain::constants::{DEFAULT_CALLBACK_TIMEOUT_SECS, DEFAULT_TOKEN_FILE};
use loopauth_domain::HttpMethod;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "loopauth", version, about = "OAuth 2.0 authorization code + PKCE client")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Provider configuration file (JSON or TOML).
    #[arg(long, global = true, env = "LOOPAUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the token set is persisted.
    #[arg(long, global = true, env = "LOOPAUTH_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    pub tokens: PathBuf,

    /// Seconds to wait for the authorization redirect.
    #[arg(
        long,
        global = true,
        env = "LOOPAUTH_CALLBACK_TIMEOUT",
        default_value_t = DEFAULT_CALLBACK_TIMEOUT_SECS
    )]
    pub timeout: u64,

    /// Only print the authorization URL, do not launch a browser.
    #[arg(long, global = true)]
    pub no_browser: bool,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Obtain a session, running the browser flow when no tokens are stored.
    Login {
        /// Authorize again even if tokens are stored.
        #[arg(long)]
        force: bool,
    },
    /// Exchange the stored refresh token for a new token set.
    Refresh,
    /// Show the stored session.
    Status,
    /// Send an authenticated request, refreshing once on 401.
    Request {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: HttpMethod,

        /// Extra header as `name: value`; repeatable.
        #[arg(short = 'H', long = "header", value_parser = commands::parse_header)]
        headers: Vec<(String, String)>,

        /// Request body.
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Delete the stored tokens.
    Logout,
}

fn init_telemetry(args: &GlobalArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    match args.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli.global);

    debug!(version = env!("CARGO_PKG_VERSION"), "loopauth starting");

    let result = match cli.command {
        Command::Login { force } => commands::login(&cli.global, force).await,
        Command::Refresh => commands::refresh(&cli.global).await,
        Command::Status => commands::status(&cli.global).await,
        Command::Request { url, method, headers, data } => {
            commands::request(&cli.global, method, &url, headers, data).await
        }
        Command::Logout => commands::logout(&cli.global).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit::exit_code(&err))
        }
    }
}
