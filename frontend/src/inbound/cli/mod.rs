//! Command-line front end for the auth, health and prediction flows.
//!
//! Each subcommand stands in for one page interaction. Form messages go
//! through [`ConsolePresenter`] and are printed once the flow settles.

mod console;

use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use url::Url;

pub use console::ConsolePresenter;

use crate::domain::ports::{AuthApi, PredictionSource, Sleeper};
use crate::domain::redirect::{LOGIN_PATH, ROOT_PATH, same_origin};
use crate::domain::{
    AuthFlows, AuthProbe, FormRecord, PredictionService, ProbeRetryPolicy, SessionManager,
    SubmissionOutcome, check_health, describe,
};

/// Long help text; the cookie jar lives only as long as one invocation.
const SESSION_NOTE: &str = "Drive the car price client flows against a running backend.\n\n\
    Each invocation starts with an empty cookie jar, so a session created by \
    `login` is not visible to later `check`, `logout` or `predict` runs.";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// `frontend` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "frontend",
    about = "Drive the car price client flows against a running backend",
    long_about = SESSION_NOTE,
    version
)]
pub struct Cli {
    /// Backend base URL. Overrides `FRONTEND_API_BASE_URL`.
    #[arg(long = "api-base-url", value_name = "url", global = true)]
    pub api_base_url: Option<String>,
    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
    /// Flow to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported flows.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Probe the session and print whether it is authenticated.
    Check {
        /// Page URL the probe runs on; `from=login` enables the login retry.
        #[arg(long = "page-url", value_name = "url")]
        page_url: Option<Url>,
    },
    /// Submit the login form.
    Login {
        #[arg(long, value_name = "name")]
        username: String,
        #[arg(long, value_name = "secret")]
        password: String,
        /// Login page URL, carrying any `next` parameter.
        #[arg(long = "page-url", value_name = "url")]
        page_url: Option<Url>,
    },
    /// Submit the registration form.
    Register {
        #[arg(long, value_name = "name")]
        username: String,
        #[arg(long, value_name = "address")]
        email: String,
        #[arg(long, value_name = "secret")]
        password: String,
        #[arg(long = "first-name", value_name = "name")]
        first_name: Option<String>,
        #[arg(long = "last-name", value_name = "name")]
        last_name: Option<String>,
    },
    /// End the current session.
    Logout,
    /// Check backend connectivity.
    Health,
    /// Score a password.
    Strength {
        /// Password to score.
        password: String,
    },
    /// Request a price prediction.
    Predict {
        /// Form field as `key=value`; repeat for each field.
        #[arg(long = "field", value_name = "key=value", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("field must be key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("field name must not be empty".to_owned());
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Collaborators shared by every command.
#[derive(Clone)]
pub struct CliContext<A> {
    /// Backend client.
    pub api: Arc<A>,
    /// Timer used between probe attempts.
    pub sleeper: Arc<dyn Sleeper>,
    /// Probe retry delays.
    pub policy: ProbeRetryPolicy,
    /// Site origin used to build page URLs.
    pub base_url: Url,
}

impl<A> CliContext<A>
where
    A: AuthApi + PredictionSource + 'static,
{
    fn session_probe(&self) -> AuthProbe {
        AuthProbe::new(self.api.clone(), self.sleeper.clone(), SessionManager::new())
            .with_policy(self.policy)
    }

    fn flows(&self) -> AuthFlows {
        AuthFlows::new(self.api.clone(), SessionManager::new())
    }

    fn page(&self, path: &str) -> io::Result<Url> {
        same_origin(&self.base_url, path).map_err(io::Error::other)
    }
}

/// Run `command`, writing its output to `out`.
///
/// Returns `false` when the flow ended in a user-facing failure.
///
/// # Errors
///
/// Returns an error when output cannot be written or a page URL cannot be
/// built.
pub async fn execute<A, W>(command: Command, ctx: &CliContext<A>, out: &mut W) -> io::Result<bool>
where
    A: AuthApi + PredictionSource + 'static,
    W: Write,
{
    debug!(?command, "running command");
    match command {
        Command::Check { page_url } => {
            let page = match page_url {
                Some(url) => url,
                None => ctx.page(ROOT_PATH)?,
            };
            let probe = ctx.session_probe();
            let outcome = probe.probe(&page).await;
            match probe.session().current_user() {
                Some(user) => writeln!(out, "{} (attempts: {})", user.greeting(), outcome.attempts)?,
                None => writeln!(out, "not authenticated (attempts: {})", outcome.attempts)?,
            }
            Ok(true)
        }
        Command::Login {
            username,
            password,
            page_url,
        } => {
            let page = match page_url {
                Some(url) => url,
                None => ctx.page(LOGIN_PATH)?,
            };
            let form = FormRecord::new()
                .with("username", username)
                .with("password", password);
            let mut ui = ConsolePresenter::new();
            let outcome = ctx.flows().login(&form, &page, &mut ui).await;
            report_submission(&outcome, &ui, out)
        }
        Command::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let mut form = FormRecord::new()
                .with("username", username)
                .with("email", email)
                .with("password", password);
            if let Some(name) = first_name {
                form.insert("first_name", name);
            }
            if let Some(name) = last_name {
                form.insert("last_name", name);
            }
            let page = ctx.page("/auth/register")?;
            let mut ui = ConsolePresenter::new();
            let outcome = ctx.flows().register(&form, &page, &mut ui).await;
            report_submission(&outcome, &ui, out)
        }
        Command::Logout => match ctx.flows().logout(&ctx.base_url).await {
            Ok(target) => {
                writeln!(out, "logged out")?;
                writeln!(out, "redirect: {target}")?;
                Ok(true)
            }
            Err(error) => {
                writeln!(out, "error: {}", error.message_or_default())?;
                Ok(false)
            }
        },
        Command::Health => {
            let ready = check_health(ctx.api.as_ref()).await;
            let verdict = if ready { "ready" } else { "not ready" };
            writeln!(out, "backend {verdict}")?;
            Ok(ready)
        }
        Command::Strength { password } => {
            if let Some(strength) = describe(&password) {
                writeln!(out, "{} ({}%)", strength.label, strength.percentage())?;
                for hint in &strength.feedback {
                    writeln!(out, "  {hint}")?;
                }
            }
            Ok(true)
        }
        Command::Predict { fields } => {
            let form: FormRecord = fields.into_iter().collect();
            let service = PredictionService::new(ctx.api.clone());
            match service.submit(&form).await {
                Ok(result) => {
                    writeln!(out, "{} {}", result.summary(), result.currency)?;
                    writeln!(out, "{}", result.vehicle())?;
                    Ok(true)
                }
                Err(error) => {
                    writeln!(out, "error: {error}")?;
                    Ok(false)
                }
            }
        }
    }
}

fn report_submission<W: Write>(
    outcome: &SubmissionOutcome,
    ui: &ConsolePresenter,
    out: &mut W,
) -> io::Result<bool> {
    ui.render(out)?;
    match outcome.redirect() {
        Some(target) => {
            writeln!(out, "redirect: {target}")?;
            Ok(true)
        }
        None => Ok(false),
    }
}
