//! Command-line front end for the growth engine.
//!
//! Every command opens the SQLite database named by the config file (or
//! `--database`), runs one engine operation for `--owner`, and prints the
//! result as pretty JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use growth::core::types::Question;
use growth::error::GrowthError;
use growth::exit_codes;
use growth::io::clock::SystemClock;
use growth::io::config::{GrowthConfig, load_config, write_config};
use growth::io::store::SqliteStore;
use growth::{lifecycle, logging, report, submit, today};

#[derive(Parser)]
#[command(name = "growth", version, about = "Grow a habit forest one tree at a time")]
struct Cli {
    /// Config file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "bloom_forest.toml")]
    config: PathBuf,

    /// Database file; overrides `database_path` from the config.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Owner whose forest the command acts on.
    #[arg(long, global = true, default_value = "local")]
    owner: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the config file if missing and create the database schema.
    Init {
        /// Overwrite an existing config file with defaults.
        #[arg(short, long)]
        force: bool,
    },
    /// Plant the owner's tree, or show it if one is already growing.
    Plant,
    /// Show the current tree, rolling its day forward.
    Current,
    /// List every tree of the owner, oldest first.
    Trees,
    /// Answer one habit question for today.
    Answer {
        tree_id: String,
        /// One of mood, food, hydration, sleep.
        question: String,
        #[arg(value_enum)]
        reply: Reply,
    },
    /// Retire the current tree once it reached day 7 and plant the next one.
    Complete { tree_id: String },
    /// Show today's answers for a tree.
    Today { tree_id: String },
    /// Show past habit records for a tree, newest first.
    History {
        tree_id: String,
        #[arg(long, default_value_t = today::DEFAULT_HISTORY_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show aggregate stats for the owner.
    Stats,
    /// Check the stored forest for invariant violations.
    Check,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Reply {
    Yes,
    No,
}

impl Reply {
    fn is_positive(self) -> bool {
        self == Reply::Yes
    }
}

fn main() {
    logging::init();
    let code = match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            let code = err
                .downcast_ref::<GrowthError>()
                .map_or(exit_codes::INVALID, exit_codes::for_error);
            eprintln!("{:#}", err);
            code
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let Cli {
        config,
        database,
        owner,
        command,
    } = cli;
    let database = database.as_deref();
    let owner = owner.as_str();
    let clock = SystemClock;

    match command {
        Command::Init { force } => cmd_init(&config, database, force),
        Command::Plant => {
            let (cfg, store) = open_forest(&config, database)?;
            print_json(&lifecycle::create_initial_tree(
                &store,
                &clock,
                cfg.forest_radius,
                owner,
            )?)
        }
        Command::Current => {
            let (_, store) = open_forest(&config, database)?;
            print_json(&lifecycle::get_current_tree(&store, &clock, owner)?)
        }
        Command::Trees => {
            let (_, store) = open_forest(&config, database)?;
            print_json(&lifecycle::list_trees(&store, owner)?)
        }
        Command::Answer {
            tree_id,
            question,
            reply,
        } => {
            let question: Question = question.parse()?;
            let (_, store) = open_forest(&config, database)?;
            print_json(&submit::submit_answer(
                &store,
                &clock,
                owner,
                &tree_id,
                question,
                reply.is_positive(),
            )?)
        }
        Command::Complete { tree_id } => {
            let (cfg, store) = open_forest(&config, database)?;
            print_json(&lifecycle::complete_if_ready(
                &store,
                &clock,
                cfg.forest_radius,
                owner,
                &tree_id,
            )?)
        }
        Command::Today { tree_id } => {
            let (_, store) = open_forest(&config, database)?;
            print_json(&today::today(&store, &clock, owner, &tree_id)?)
        }
        Command::History {
            tree_id,
            limit,
            offset,
        } => {
            let (_, store) = open_forest(&config, database)?;
            print_json(&today::history(&store, owner, &tree_id, limit, offset)?)
        }
        Command::Stats => {
            let (_, store) = open_forest(&config, database)?;
            print_json(&report::stats(&store, owner)?)
        }
        Command::Check => {
            let (_, store) = open_forest(&config, database)?;
            let errors = report::check_forest(&store, owner)?;
            print_json(&json!({ "valid": errors.is_empty(), "errors": errors }))?;
            Ok(if errors.is_empty() {
                exit_codes::OK
            } else {
                exit_codes::INVALID
            })
        }
    }
}

fn cmd_init(config_path: &Path, database: Option<&Path>, force: bool) -> Result<i32> {
    let written = if force || !config_path.exists() {
        let mut cfg = GrowthConfig::default();
        if let Some(database) = database {
            cfg.database_path = database.to_path_buf();
        }
        write_config(config_path, &cfg)?;
        true
    } else {
        false
    };

    let (cfg, _) = open_forest(config_path, database)?;

    print_json(&json!({
        "config": config_path,
        "configWritten": written,
        "database": cfg.database_path,
    }))
}

fn resolve_config(path: &Path, database: Option<&Path>) -> Result<GrowthConfig> {
    let mut cfg = load_config(path)?;
    if let Some(database) = database {
        cfg.database_path = database.to_path_buf();
    }
    Ok(cfg)
}

fn open_forest(path: &Path, database: Option<&Path>) -> Result<(GrowthConfig, SqliteStore)> {
    let cfg = resolve_config(path, database)?;
    let store = SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("open database {}", cfg.database_path.display()))?;
    Ok((cfg, store))
}

/// Print `value` as pretty JSON and report success.
fn print_json<T: Serialize>(value: &T) -> Result<i32> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{}", payload);
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["growth", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
        assert_eq!(cli.config, PathBuf::from("bloom_forest.toml"));
        assert_eq!(cli.owner, "local");
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "growth",
            "current",
            "--owner",
            "alice",
            "--database",
            "/tmp/forest.db",
        ]);
        assert!(matches!(cli.command, Command::Current));
        assert_eq!(cli.owner, "alice");
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/forest.db")));
    }

    #[test]
    fn parse_answer() {
        let cli = Cli::parse_from(["growth", "answer", "tree-1", "sleep", "no"]);
        match cli.command {
            Command::Answer {
                tree_id,
                question,
                reply,
            } => {
                assert_eq!(tree_id, "tree-1");
                assert_eq!(question, "sleep");
                assert!(!reply.is_positive());
            }
            _ => panic!("expected answer command"),
        }
    }

    #[test]
    fn answer_reply_must_be_yes_or_no() {
        assert!(Cli::try_parse_from(["growth", "answer", "tree-1", "mood", "maybe"]).is_err());
    }

    #[test]
    fn history_defaults_to_first_page() {
        let cli = Cli::parse_from(["growth", "history", "tree-1"]);
        assert!(matches!(
            cli.command,
            Command::History {
                limit: 30,
                offset: 0,
                ..
            }
        ));
    }
}
