use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use finsync_core::{today_in, CandidateEntry};
use finsync_finance::{commit, learn_rules, persist_rules, CommitError, ImportBatch, Pipeline, PipelineError};
use finsync_ingest::detect_format;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod state;
mod store;

use store::JsonRuleStore;

#[derive(Parser, Debug)]
#[command(name = "finsync", version, about = "Statement text to reviewed ledger entries")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print which statement format a text file looks like
    Detect {
        #[arg(long)]
        file: PathBuf,
    },

    /// Parse, classify and duplicate-check a statement for review
    Scan {
        /// Extracted statement text (OCR, PDF text or pasted)
        #[arg(long)]
        file: PathBuf,

        /// Destination account used for duplicate detection
        #[arg(long)]
        account: String,

        /// Print the batch as JSON instead of one line per movement
        #[arg(long)]
        json: bool,

        /// Write the batch to a review file for `finsync commit`
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Commit a reviewed batch to the ledger and learn rules from it
    Commit {
        #[arg(long)]
        review: PathBuf,

        #[arg(long)]
        account: String,
    },

    /// Classification rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Configuration (~/.finsync/config.toml)
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// List stored rules in match order
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Command::Detect { file } => {
            let text = read_text(&file).await?;
            let detection = detect_format(&text);
            println!("{} ({})", detection.format, detection.signal);
        }

        Command::Scan {
            file,
            account,
            json,
            out,
        } => {
            scan(&file, &account, json, out.as_deref()).await?;
        }

        Command::Commit { review, account } => {
            commit_review(&review, &account).await?;
        }

        Command::Rules { command } => match command {
            RulesCommand::List => {
                let cfg = config::load_config()?;
                let home = state::ensure_finsync_home()?;
                let store = JsonRuleStore::open(cfg.rules_path(&home)).await?;
                if store.rules().is_empty() {
                    println!("No rules stored.");
                }
                for (i, r) in store.rules().iter().enumerate() {
                    println!(
                        "{:>3}. {:?} '{}' -> {}{}{}{}",
                        i + 1,
                        r.match_type,
                        r.pattern,
                        r.category_id,
                        r.sub_category_id
                            .as_deref()
                            .map(|s| format!("/{s}"))
                            .unwrap_or_default(),
                        r.direction.map(|d| format!(" ({})", d.label())).unwrap_or_default(),
                        if r.active { "" } else { " [inactive]" },
                    );
                }
            }
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))
}

async fn scan(file: &Path, account: &str, json: bool, out: Option<&Path>) -> Result<()> {
    let cfg = config::load_config()?;
    let home = state::ensure_finsync_home()?;
    let today = today_in(&cfg.pipeline.timezone, Utc::now())?;

    let text = read_text(file).await?;
    let rules = JsonRuleStore::open(cfg.rules_path(&home)).await?;
    let ledger = store::load_ledger(&cfg.ledger_path(&home)).await?;

    let batch = match Pipeline::new(today).run(&text, rules.rules(), &ledger, account) {
        Ok(batch) => batch,
        Err(PipelineError::NoMovementsDetected) => {
            println!("No movements detected in {}. Check the text and try again.", file.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        print_batch(&batch);
    }

    if let Some(out) = out {
        store::write_review(out, &batch).await?;
        println!("\nReview file: {} (edit selection/categories, then `finsync commit`)", out.display());
    }
    Ok(())
}

fn print_batch(batch: &ImportBatch) {
    if batch.format != batch.detected {
        println!("Format: {} (detected {})", batch.format, batch.detected);
    } else {
        println!("Format: {}", batch.format);
    }
    if let Some(stmt) = &batch.statement {
        println!(
            "Card: {} | holder: {} | total: ${:.2}{}",
            stmt.issuer.name(),
            stmt.card_holder,
            stmt.total_amount,
            stmt.due_date.map(|d| format!(" | due {d}")).unwrap_or_default()
        );
    }
    println!();

    for c in &batch.candidates {
        println!("{}", candidate_line(c));
    }

    println!(
        "\n{} movements ({} categorized, {} duplicates, {} selected)",
        batch.candidates.len(),
        batch.categorized_count(),
        batch.duplicate_count(),
        batch.selected_count()
    );
}

fn candidate_line(c: &CandidateEntry) -> String {
    format!(
        "[{}] {} {} {:<3} {:>12.2} | {}{}{}",
        if c.selected { "x" } else { " " },
        c.id,
        c.date,
        c.direction.label(),
        c.amount,
        c.description,
        c.category_id
            .as_deref()
            .map(|cat| format!(" [{cat}]"))
            .unwrap_or_default(),
        if c.duplicate { " DUP" } else { "" },
    )
}

async fn commit_review(review: &Path, account: &str) -> Result<()> {
    let cfg = config::load_config()?;
    let home = state::ensure_finsync_home()?;
    let batch = store::read_review(review).await?;

    let entries = match commit(&batch.candidates, account) {
        Ok(entries) => entries,
        Err(CommitError::NothingToCommit) => {
            println!("Nothing to commit: select movements and assign categories in {}", review.display());
            return Ok(());
        }
    };

    let ledger_path = cfg.ledger_path(&home);
    let total = store::append_ledger(&ledger_path, &entries).await?;
    println!("Committed {} movements to {} ({} total)", entries.len(), ledger_path.display(), total);

    let committed: Vec<CandidateEntry> = batch
        .candidates
        .iter()
        .filter(|c| c.is_committable())
        .cloned()
        .collect();

    let mut rules = JsonRuleStore::open(cfg.rules_path(&home)).await?;
    let learned = learn_rules(&committed, rules.rules());
    let report = persist_rules(&mut rules, &learned);
    rules.flush().await?;
    info!(saved = report.saved, failed = report.failed, "rule learning");
    println!("Learned {} new rules", report.saved);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finsync_core::Direction;

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::parse_from([
            "finsync", "scan", "--file", "mp.txt", "--account", "mp", "--out", "review.json", "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Scan { file, account, json, out } => {
                assert_eq!(file, PathBuf::from("mp.txt"));
                assert_eq!(account, "mp");
                assert!(!json);
                assert_eq!(out, Some(PathBuf::from("review.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_candidate_line() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 2).unwrap();
        let mut c = CandidateEntry::new("raw", date, "Pago a Carcor", 5370.0, Direction::Out);
        c.id = "line-0001".to_string();
        c.category_id = Some("vehiculo".to_string());
        assert_eq!(
            candidate_line(&c),
            "[x] line-0001 2025-12-02 OUT      5370.00 | Pago a Carcor [vehiculo]"
        );

        c.duplicate = true;
        c.selected = false;
        assert!(candidate_line(&c).starts_with("[ ] "));
        assert!(candidate_line(&c).ends_with(" DUP"));
    }
}
