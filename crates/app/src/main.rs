mod args;
mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use prep_core::ProgressError;
use services::{Answer, Clock, PracticeService, builtin_catalog};
use tracing_subscriber::EnvFilter;

use crate::args::{ArgsError, Cli, Command, print_usage};
use crate::config::{AppConfig, CONFIG_ENV, DB_URL_ENV};

fn init_tracing(default_filter: &str) {
    // RUST_LOG wins over the configured filter.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:"
        || trimmed.starts_with("sqlite://")
        || trimmed.starts_with("sqlite:file:")
    {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
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
    let cli = Cli::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref())?;
    init_tracing(&config.log_filter);

    let db_url = normalize_sqlite_url(
        config.database_url(std::env::var(DB_URL_ENV).ok(), cli.db.clone()),
    );
    prepare_sqlite_file(&db_url)?;

    let catalog = Arc::new(builtin_catalog()?);
    // Streak days follow the user's local calendar.
    let offset = *chrono::Local::now().offset();
    let mut service = PracticeService::open_sqlite(&db_url, catalog, Clock::default())
        .await?
        .with_day_offset(offset);
    tracing::debug!(db_url = %db_url, "opened progress database");

    match cli.command {
        Command::Help => print_usage(),
        Command::List {
            category,
            difficulty,
        } => {
            let questions = service.catalog().iter().filter(|q| {
                category.is_none_or(|c| q.category == c)
                    && difficulty.is_none_or(|d| q.difficulty == d)
            });
            render::question_list(service.store(), questions);
        }
        Command::Show { id } => {
            let question = service
                .catalog()
                .get(&id)
                .ok_or_else(|| ProgressError::UnknownQuestion(id.clone()))?;
            render::question_detail(service.store(), question);
        }
        Command::Due => render::due(service.store()),
        Command::Stats => render::stats(service.store()),
        Command::History { id } => render::history(service.store(), id.as_ref()),
        Command::Review { id, score } => {
            service.complete_session(&id, score).await?;
            render::reviewed(service.store(), &id);
        }
        Command::Practice {
            id,
            answer,
            diagram,
        } => {
            let text = std::fs::read_to_string(&answer)?;
            let mut answer = Answer::new(text);
            if let Some(path) = diagram {
                answer = answer.with_diagram(std::fs::read_to_string(path)?);
            }

            service.start_session(&id)?;
            let submission = service.submit_answer(answer).await?;
            render::submission(service.store(), &submission);
        }
        Command::Reset => {
            service.reset().await?;
            println!("progress cleared");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
