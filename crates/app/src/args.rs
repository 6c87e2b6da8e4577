use std::fmt;
use std::path::PathBuf;

use prep_core::model::{Category, Difficulty, QuestionId, Score};

#[derive(Debug)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuestionId { raw: String },
    InvalidScore { raw: String },
    InvalidLabel { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuestionId { raw } => write!(f, "invalid question id: {raw:?}"),
            ArgsError::InvalidScore { raw } => {
                write!(f, "invalid --score value: {raw} (expected 0-100)")
            }
            ArgsError::InvalidLabel { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List {
        category: Option<Category>,
        difficulty: Option<Difficulty>,
    },
    Show {
        id: QuestionId,
    },
    Due,
    Stats,
    History {
        id: Option<QuestionId>,
    },
    Review {
        id: QuestionId,
        score: Score,
    },
    Practice {
        id: QuestionId,
        answer: PathBuf,
        diagram: Option<PathBuf>,
    },
    Reset,
}

/// Parsed command line: the subcommand plus global flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub command: Command,
    pub db: Option<String>,
    pub config: Option<PathBuf>,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep [--db <sqlite_url>] [--config <path>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list [--category <c>] [--difficulty <d>]");
    eprintln!("  show <id>");
    eprintln!("  due");
    eprintln!("  stats");
    eprintln!("  history [<id>]");
    eprintln!("  review <id> --score <0-100>");
    eprintln!("  practice <id> --answer <file> [--diagram <file>]");
    eprintln!("  reset");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://prep.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, PREP_CONFIG, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id(raw: String) -> Result<QuestionId, ArgsError> {
    QuestionId::new(raw.clone()).map_err(|_| ArgsError::InvalidQuestionId { raw })
}

fn parse_score(raw: String) -> Result<Score, ArgsError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(|value| Score::new(value).ok())
        .ok_or(ArgsError::InvalidScore { raw })
}

/// Subcommand tokens split into an optional leading positional and flags.
struct Rest {
    positional: Option<String>,
    tokens: std::vec::IntoIter<String>,
}

impl Rest {
    fn new(tokens: Vec<String>) -> Self {
        let mut tokens = tokens.into_iter().peekable();
        let positional = tokens.next_if(|t| !t.starts_with("--"));
        Self {
            positional,
            tokens: tokens.collect::<Vec<_>>().into_iter(),
        }
    }

    fn id(&mut self) -> Result<QuestionId, ArgsError> {
        self.positional
            .take()
            .ok_or(ArgsError::MissingArgument { what: "question id" })
            .and_then(parse_id)
    }

    fn finish(mut self) -> Result<(), ArgsError> {
        match self.positional.take().or_else(|| self.tokens.next()) {
            Some(extra) => Err(ArgsError::UnknownArg(extra)),
            None => Ok(()),
        }
    }
}

impl Cli {
    /// Parse arguments without the program name. Global flags may appear
    /// anywhere.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db = None;
        let mut config = None;
        let mut rest = Vec::new();

        let mut iter = argv.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db = Some(value);
                }
                "--config" => config = Some(PathBuf::from(require_value(&mut iter, "--config")?)),
                "--help" | "-h" => {
                    return Ok(Self {
                        command: Command::Help,
                        db,
                        config,
                    });
                }
                _ => rest.push(arg),
            }
        }

        let mut rest = rest.into_iter();
        let name = rest.next().ok_or(ArgsError::MissingCommand)?;
        let mut rest = Rest::new(rest.collect());

        let command = match name.as_str() {
            "list" => {
                let mut category = None;
                let mut difficulty = None;
                while let Some(arg) = rest.tokens.next() {
                    match arg.as_str() {
                        "--category" => {
                            let raw = require_value(&mut rest.tokens, "--category")?;
                            category = Some(raw.parse().map_err(|_| ArgsError::InvalidLabel {
                                flag: "--category",
                                raw,
                            })?);
                        }
                        "--difficulty" => {
                            let raw = require_value(&mut rest.tokens, "--difficulty")?;
                            difficulty = Some(raw.parse().map_err(|_| ArgsError::InvalidLabel {
                                flag: "--difficulty",
                                raw,
                            })?);
                        }
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::List {
                    category,
                    difficulty,
                }
            }
            "show" => Command::Show { id: rest.id()? },
            "due" => Command::Due,
            "stats" => Command::Stats,
            "history" => Command::History {
                id: rest.positional.take().map(parse_id).transpose()?,
            },
            "review" => {
                let id = rest.id()?;
                let mut score = None;
                while let Some(arg) = rest.tokens.next() {
                    match arg.as_str() {
                        "--score" => {
                            let raw = require_value(&mut rest.tokens, "--score")?;
                            score = Some(parse_score(raw)?);
                        }
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                let score = score.ok_or(ArgsError::MissingValue { flag: "--score" })?;
                Command::Review { id, score }
            }
            "practice" => {
                let id = rest.id()?;
                let mut answer = None;
                let mut diagram = None;
                while let Some(arg) = rest.tokens.next() {
                    match arg.as_str() {
                        "--answer" => {
                            let raw = require_value(&mut rest.tokens, "--answer")?;
                            answer = Some(PathBuf::from(raw));
                        }
                        "--diagram" => {
                            let raw = require_value(&mut rest.tokens, "--diagram")?;
                            diagram = Some(PathBuf::from(raw));
                        }
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                let answer = answer.ok_or(ArgsError::MissingValue { flag: "--answer" })?;
                Command::Practice {
                    id,
                    answer,
                    diagram,
                }
            }
            "reset" => Command::Reset,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        rest.finish()?;
        Ok(Self {
            command,
            db,
            config,
        })
    }
}
