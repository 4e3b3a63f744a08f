use std::fmt;

use services::{ApiConfig, AppServices, Clock, HttpStudyApi};
use study_core::model::{DeckId, QuizId};
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingId { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingId { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id(flag: &'static str, raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  studybuddy login   --username <name> [--password <pw>] [--api <url>]");
    eprintln!("  studybuddy whoami  [--api <url>] [--token <access>]");
    eprintln!("  studybuddy logout  [--api <url>] [--token <access>]");
    eprintln!("  studybuddy decks   [--api <url>] [--token <access>]");
    eprintln!("  studybuddy quizzes [--api <url>] [--token <access>]");
    eprintln!("  studybuddy study   --deck-id <id> [--db <sqlite_url>] [--api <url>] [--token <access>]");
    eprintln!("  studybuddy quiz    --quiz-id <id> [--db <sqlite_url>] [--api <url>] [--token <access>]");
    eprintln!("  studybuddy saved   [--db <sqlite_url>]");
    eprintln!();
    eprintln!("All commands accept --timeout <secs> for API requests.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api {}", ApiConfig::DEFAULT_BASE_URL);
    eprintln!("  --db  {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDYBUDDY_API_URL, STUDYBUDDY_ACCESS_TOKEN, STUDYBUDDY_REFRESH_TOKEN,");
    eprintln!("  STUDYBUDDY_TIMEOUT_SECS, STUDYBUDDY_PASSWORD, STUDYBUDDY_DB_URL,");
    eprintln!("  RUST_LOG (default: warn)");
}

const DEFAULT_DB_URL: &str = "sqlite://studybuddy.sqlite3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Login,
    Logout,
    Whoami,
    Decks,
    Quizzes,
    Study,
    Quiz,
    Saved,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "whoami" => Some(Self::Whoami),
            "saved" => Some(Self::Saved),
            "decks" => Some(Self::Decks),
            "quizzes" => Some(Self::Quizzes),
            "study" => Some(Self::Study),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    api: ApiConfig,
    deck_id: Option<DeckId>,
    quiz_id: Option<QuizId>,
    username: Option<String>,
    password: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDYBUDDY_DB_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut api = ApiConfig::from_env();
        let mut deck_id = None;
        let mut quiz_id = None;
        let mut username = None;
        let mut password = std::env::var("STUDYBUDDY_PASSWORD")
            .ok()
            .filter(|v| !v.is_empty());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => api.base_url = require_value(args, "--api")?,
                "--token" => api.access_token = Some(require_value(args, "--token")?),
                "--timeout" => {
                    let value = require_value(args, "--timeout")?;
                    let timeout = services::api::parse_timeout(&value)
                        .ok_or(ArgsError::InvalidTimeout { raw: value })?;
                    api = api.with_timeout(timeout);
                }
                "--username" => username = Some(require_value(args, "--username")?),
                "--password" => password = Some(require_value(args, "--password")?),
                "--deck-id" => {
                    let value = require_value(args, "--deck-id")?;
                    deck_id = Some(DeckId::new(parse_id("--deck-id", value)?));
                }
                "--quiz-id" => {
                    let value = require_value(args, "--quiz-id")?;
                    quiz_id = Some(QuizId::new(parse_id("--quiz-id", value)?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            api,
            deck_id,
            quiz_id,
            username,
            password,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    tracing::debug!(db_url = %parsed.db_url, api = %parsed.api.base_url, command = ?cmd, "starting");

    // Account commands talk to the API only.
    match cmd {
        Command::Login => {
            let username = parsed
                .username
                .ok_or(ArgsError::MissingId { flag: "--username" })?;
            let api = HttpStudyApi::new(parsed.api)?;
            return terminal::login(&api, &username, parsed.password).await;
        }
        Command::Logout => return terminal::logout(&HttpStudyApi::new(parsed.api)?).await,
        Command::Whoami => return terminal::whoami(&HttpStudyApi::new(parsed.api)?).await,
        _ => {}
    }

    // Checkpoints live in SQLite; open + migrate it here so services stay backend-agnostic.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, parsed.api, Clock::default_clock()).await?;

    match cmd {
        Command::Decks => terminal::list_decks(&app).await,
        Command::Quizzes => terminal::list_quizzes(&app).await,
        Command::Study => {
            let deck_id = parsed.deck_id.ok_or(ArgsError::MissingId { flag: "--deck-id" })?;
            terminal::study(&app, deck_id).await
        }
        Command::Quiz => {
            let quiz_id = parsed.quiz_id.ok_or(ArgsError::MissingId { flag: "--quiz-id" })?;
            terminal::take_quiz(&app, quiz_id).await
        }
        Command::Saved => terminal::list_saved(&app).await,
        Command::Login | Command::Logout | Command::Whoami => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    log_fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
