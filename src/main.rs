use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use rater::banner::{BannerInfo, print_banner, print_session_summary};
use rater::coach::{self, FeedbackGenerator};
use rater::config::{Config, KNOWN_KEYS, Settings, StoreBackend};
use rater::consts::default_db_path;
use rater::display::{render_board, render_outcome};
use rater::events::EventBus;
use rater::leaderboard::Leaderboard;
use rater::logging;
use rater::repl::{self, Input};
use rater::spinner::Spinner;
use rater::store::RemoteStore;
use rater::store::sqlite::SqliteStore;
use rater::store::supabase::SupabaseStore;
use rater::submission::{Form, Orchestrator, SubmissionOutcome};

#[derive(Debug, Clone, ValueEnum)]
enum StoreArg {
    Supabase,
    Local,
}

#[derive(Debug, Clone, ValueEnum)]
enum CoachArg {
    Gemini,
    Anthropic,
}

#[derive(Parser)]
#[command(
    name = "rater",
    version,
    about = "Mide tu potencial. Registra tu progreso."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Where records are stored (overrides `store.backend`)
    #[arg(long, value_enum)]
    store: Option<StoreArg>,

    /// Text generation service for coach comments (overrides `coach.provider`)
    #[arg(long, value_enum)]
    coach: Option<CoachArg>,

    /// Coach model name (provider-specific)
    #[arg(long)]
    model: Option<String>,

    /// SQLite database for settings and the local store (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Leaderboard rows to show
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Submit one score and show the coach comment
    Submit {
        /// Athlete name
        #[arg(short, long)]
        name: String,
        /// Score from 0 to 100 (out-of-range values are clamped)
        #[arg(short, long, allow_negative_numbers = true)]
        score: i64,
    },
    /// Show the recent leaderboard
    Board,
    /// Read or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a stored value
    Get { key: String },
    /// Store a value
    Set { key: String, value: String },
    /// Remove a stored value
    Unset { key: String },
    /// List every known key with its stored value
    List,
}

/// Everything a session needs, built once from the resolved settings.
struct App {
    orchestrator: Orchestrator,
    events: Arc<EventBus>,
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let db = match &cli.db {
        Some(db) => db.clone(),
        None => default_db_path()?.to_string_lossy().into_owned(),
    };
    ensure_parent_dir(&db)?;
    let config = Config::open(&db)?;

    if let Some(Command::Config { action }) = &cli.command {
        handle_config(&config, action)?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = resolve_settings(&cli, &config)?;
    let app = build_app(&settings, &db, cli.limit)?;

    match cli.command {
        Some(Command::Submit { name, score }) => {
            let spinner = Spinner::watch(&app.events);
            let outcome = app.orchestrator.submit(&name, score).await;
            spinner.stop().await;
            print_outcome(&app, &outcome);
            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Command::Board) => {
            let spinner = Spinner::watch(&app.events);
            app.orchestrator.leaderboard().refresh().await;
            spinner.stop().await;
            print_board(&app);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Config { .. }) => Ok(ExitCode::SUCCESS),
        None => {
            run_repl(&app, &db).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn ensure_parent_dir(db: &str) -> Result<()> {
    if db == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(db).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// CLI flags take priority over the environment and stored config.
fn resolve_settings(cli: &Cli, config: &Config) -> Result<Settings> {
    let mut overrides: HashMap<&str, String> = HashMap::new();
    if let Some(store) = &cli.store {
        let value = match store {
            StoreArg::Supabase => "supabase",
            StoreArg::Local => "local",
        };
        overrides.insert("RATER_STORE", value.to_string());
    }
    if let Some(coach) = &cli.coach {
        let value = match coach {
            CoachArg::Gemini => "gemini",
            CoachArg::Anthropic => "anthropic",
        };
        overrides.insert("RATER_COACH", value.to_string());
    }
    if let Some(model) = &cli.model {
        overrides.insert("RATER_COACH_MODEL", model.clone());
    }

    Settings::resolve_with(config, |var| {
        overrides
            .get(var)
            .cloned()
            .or_else(|| std::env::var(var).ok())
    })
}

fn build_app(settings: &Settings, db: &str, limit: usize) -> Result<App> {
    let store: Arc<dyn RemoteStore> = match settings.backend {
        StoreBackend::Supabase => Arc::new(SupabaseStore::new(
            settings.supabase.clone(),
            settings.http_timeout,
        )?),
        StoreBackend::Local => {
            Arc::new(SqliteStore::open(db).context("failed to open local record store")?)
        }
    };
    let feedback = FeedbackGenerator::new(coach::from_settings(
        &settings.coach,
        settings.http_timeout,
    )?);

    let events = Arc::new(EventBus::default());
    let leaderboard = Arc::new(Leaderboard::new(Arc::clone(&store), Arc::clone(&events)));
    let orchestrator = Orchestrator::new(store, feedback, leaderboard, Arc::clone(&events));

    Ok(App {
        orchestrator,
        events,
        limit,
    })
}

fn handle_config(config: &Config, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(key)? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            println!("✓ {key} saved");
        }
        ConfigAction::Unset { key } => {
            config.remove(key)?;
            println!("✓ {key} removed");
        }
        ConfigAction::List => {
            for key in KNOWN_KEYS {
                let value = config.get(key)?.unwrap_or_else(|| "—".to_string());
                println!("{key:<20} {value}");
            }
        }
    }
    Ok(())
}

fn print_board(app: &App) {
    print!("\n{}", render_board(&app.orchestrator.leaderboard().snapshot(), app.limit));
}

fn print_outcome(app: &App, outcome: &SubmissionOutcome) {
    println!("\n{}", render_outcome(outcome));
    if outcome.is_success() {
        print_board(app);
    }
}

async fn run_repl(app: &App, db: &str) -> Result<()> {
    print_banner(&BannerInfo {
        store: &app.orchestrator.store().describe(),
        coach: &app.orchestrator.feedback().describe(),
        settings_db: db,
    });
    if !app.orchestrator.store().is_available() {
        println!("   ⚠ store not configured: run `rater config set store.url ...` and `store.key`,");
        println!("     or start with --store local\n");
    }

    let spinner = Spinner::watch(&app.events);
    app.orchestrator.leaderboard().refresh().await;
    print_board(app);

    let mut form = Form::default();
    let (mut stored, mut failed) = (0, 0);

    // Async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nrater> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        match repl::parse(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => print!("{}", repl::help()),
            Input::Unknown(cmd) => println!("unknown command: {cmd} (try /help)"),
            Input::Board => {
                app.orchestrator.leaderboard().refresh().await;
                print_board(app);
            }
            Input::Submit { name, score } => {
                let score = score.unwrap_or(form.score.value() as i64);
                form.name = name;
                let outcome = app.orchestrator.submit(&form.name, score).await;
                print_outcome(app, &outcome);
                match outcome {
                    SubmissionOutcome::Success { form: cleared, .. } => {
                        form = cleared;
                        stored += 1;
                    }
                    SubmissionOutcome::Failure(_) => failed += 1,
                }
            }
        }
    }

    spinner.stop().await;
    print_session_summary(stored, failed);
    Ok(())
}
