use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_AUTH_SECRET: &str = "auth-secret";
pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SIGNIN_PATH: &str = "signin-path";
pub const ARG_SESSION_MAX_AGE: &str = "session-max-age-seconds";
pub const ARG_SESSION_UPDATE_AGE: &str = "session-update-age-seconds";
pub const ARG_GITHUB_CLIENT_ID: &str = "github-client-id";
pub const ARG_GITHUB_CLIENT_SECRET: &str = "github-client-secret";

/// Parsed auth flags.
#[derive(Debug)]
pub struct Options {
    pub secret: SecretString,
    pub base_url: String,
    pub signin_path: String,
    pub session_max_age_seconds: u64,
    pub session_update_age_seconds: u64,
    pub github: Option<(String, SecretString)>,
}

impl Options {
    /// # Errors
    /// Returns an error if a required auth argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_AUTH_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --auth-secret")?;
        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .context("missing required argument: --base-url")?;
        let signin_path = matches
            .get_one::<String>(ARG_SIGNIN_PATH)
            .cloned()
            .context("missing required argument: --signin-path")?;
        let session_max_age_seconds = matches
            .get_one::<u64>(ARG_SESSION_MAX_AGE)
            .copied()
            .context("missing required argument: --session-max-age-seconds")?;
        let session_update_age_seconds = matches
            .get_one::<u64>(ARG_SESSION_UPDATE_AGE)
            .copied()
            .context("missing required argument: --session-update-age-seconds")?;

        // clap enforces that both GitHub flags are given together.
        let github = match (
            matches.get_one::<String>(ARG_GITHUB_CLIENT_ID),
            matches.get_one::<String>(ARG_GITHUB_CLIENT_SECRET),
        ) {
            (Some(id), Some(secret)) => Some((id.clone(), SecretString::from(secret.clone()))),
            _ => None,
        };

        Ok(Self {
            secret,
            base_url,
            signin_path,
            session_max_age_seconds,
            session_update_age_seconds,
            github,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_github_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_SECRET)
                .long(ARG_AUTH_SECRET)
                .help("Secret used to sign session tokens")
                .env("COURSELY_AUTH_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL of the site, used for redirects and cookie security")
                .env("COURSELY_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_SIGNIN_PATH)
                .long(ARG_SIGNIN_PATH)
                .help("Path of the sign-in page")
                .env("COURSELY_SIGNIN_PATH")
                .default_value("/signin"),
        )
        .arg(
            Arg::new(ARG_SESSION_MAX_AGE)
                .long(ARG_SESSION_MAX_AGE)
                .help("Session token lifetime in seconds")
                .env("COURSELY_SESSION_MAX_AGE_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SESSION_UPDATE_AGE)
                .long(ARG_SESSION_UPDATE_AGE)
                .help("Token age in seconds after which the session endpoint reissues it")
                .env("COURSELY_SESSION_UPDATE_AGE_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_github_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GITHUB_CLIENT_ID)
                .long(ARG_GITHUB_CLIENT_ID)
                .help("GitHub OAuth app client id, enables GitHub sign-in")
                .env("GITHUB_CLIENT_ID")
                .requires(ARG_GITHUB_CLIENT_SECRET),
        )
        .arg(
            Arg::new(ARG_GITHUB_CLIENT_SECRET)
                .long(ARG_GITHUB_CLIENT_SECRET)
                .help("GitHub OAuth app client secret")
                .env("GITHUB_CLIENT_SECRET")
                .hide_env_values(true)
                .requires(ARG_GITHUB_CLIENT_ID),
        )
}
