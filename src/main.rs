//! tslove-dump main entry point
//!
//! This is the command-line interface that dumps a T'sLove diary.

use anyhow::anyhow;
use clap::Parser;
use inquire::{Password, PasswordDisplayMode, Text};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tslove_dump::config::{load_config_with_hash, Config};
use tslove_dump::crawler::{dump_stylesheet, find_start_id, Coordinator, CrawlRange, Interrupt};
use tslove_dump::output::{log_statistics, write_index, OutputLayout};
use tslove_dump::rewrite::DocumentRewriter;
use tslove_dump::state::Pacer;
use tslove_dump::storage::{open_store, EntryStore};
use tslove_dump::{Credentials, Session};

/// tslove-dump: mirror a T'sLove diary for offline reading
///
/// Logs in, walks the diary from the newest entry (or --from) back to the
/// first one (or --to), and stores every entry with its images under the
/// output directory. Entries already mirrored are skipped, so an
/// interrupted dump can simply be run again.
#[derive(Parser, Debug)]
#[command(name = "tslove-dump")]
#[command(version)]
#[command(about = "Dump a T'sLove diary for offline reading", long_about = None)]
struct Cli {
    /// Diary id to start from (the newest diary to dump)
    #[arg(short, long, value_name = "ID")]
    from: Option<u64>,

    /// Diary id to end at (the oldest diary to dump)
    #[arg(short, long, value_name = "ID")]
    to: Option<u64>,

    /// Destination of the dump [default: ./dump]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Display the password on screen while typing it
    #[arg(long)]
    echo_password: bool,

    /// Print the session ids after login
    #[arg(long)]
    show_session_id: bool,

    /// Reuse an existing PHPSESSID instead of signing in
    #[arg(long, env = "TSLOVE_SESSION_ID", hide_env_values = true)]
    session_id: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// The crawl bounds, newest first whatever order they were given in
    fn ordered_range(&self) -> (Option<String>, Option<String>) {
        let (from, to) = match (self.from, self.to) {
            (Some(from), Some(to)) if from < to => (Some(to), Some(from)),
            other => other,
        };
        (from.map(|id| id.to_string()), to.map(|id| id.to_string()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tslove_dump=info,warn"),
            1 => EnvFilter::new("tslove_dump=debug,info"),
            2 => EnvFilter::new("tslove_dump=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .map_err(|e| anyhow!("Can not load configuration. {}", e))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_configuration(&cli)?;

    let mut session = Session::new(&config.site, &config.retry)?;
    if !handle_login(&mut session, &cli).await? {
        return Err(anyhow!("Login failed."));
    }

    if cli.show_session_id {
        println!("PHPSESSID: {}", session.php_session_id().unwrap_or(""));
        println!("sns_session_id: {}", session.sns_session_id().unwrap_or(""));
    }

    let layout = OutputLayout::new(&config.output.directory);
    layout
        .prepare()
        .map_err(|e| anyhow!("Can not create directory. {}", e))?;

    dump_stylesheet(
        &session,
        &layout,
        &config.output.excluded_stylesheet_images,
    )
    .await
    .map_err(|e| anyhow!("Can not get stylesheet. {}", e))?;

    let (from, to) = cli.ordered_range();
    let from = match from {
        Some(id) => id,
        None => find_start_id(&session)
            .await
            .map_err(|e| anyhow!("Can not get first diary id. {}", e))?,
    };

    let store = open_store(&layout.tools_dir())
        .map_err(|e| anyhow!("Can not load page info. {}", e))?;
    tracing::info!("{} diaries already recorded", store.len());

    let interrupt = Interrupt::new();
    listen_for_interrupt(interrupt.clone());

    let rewriter = DocumentRewriter::new(
        layout.base(),
        config.output.excluded_scripts.clone(),
    );
    let mut coordinator = Coordinator::new(
        &session,
        rewriter,
        store,
        layout.clone(),
        Pacer::from_config(&config.pacing),
        interrupt,
    )
    .with_excluded_scripts(config.output.excluded_scripts.clone());

    let stats = coordinator.run(&CrawlRange::new(from, to)).await?;
    log_statistics(&stats);

    let store = coordinator.into_store();
    write_index(&store, &layout.index_file())
        .map_err(|e| anyhow!("Can not save index file. {}", e))?;

    println!("{}", stats.summary_line());
    Ok(())
}

/// Logs in with the session id if one was given, then with a password
async fn handle_login(session: &mut Session, cli: &Cli) -> anyhow::Result<bool> {
    if let Some(session_id) = &cli.session_id {
        if session
            .login(&Credentials::SessionId(session_id.clone()))
            .await?
        {
            return Ok(true);
        }
        tracing::warn!("The session id was not accepted");
    }

    println!("Enter username and password");
    let credentials = prompt_credentials(cli.echo_password)?;
    Ok(session.login(&credentials).await?)
}

fn prompt_credentials(echo_password: bool) -> anyhow::Result<Credentials> {
    let username = Text::new("user:").prompt()?;

    let display_mode = if echo_password {
        PasswordDisplayMode::Full
    } else {
        PasswordDisplayMode::Masked
    };
    let password = Password::new("pass:")
        .with_display_mode(display_mode)
        .without_confirmation()
        .prompt()?;

    Ok(Credentials::Password { username, password })
}

/// First Ctrl+C stops the crawl after the current diary. Second Ctrl+C exits
/// immediately.
fn listen_for_interrupt(interrupt: Interrupt) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl+C, stopping after the current diary...");
            eprintln!("Press Ctrl+C again to force quit");
            interrupt.trigger();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nForce quit requested, exiting immediately...");
                std::process::exit(130);
            }
        }
    });
}
