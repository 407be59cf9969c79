//! `standup` - operator CLI over `standup_core`.
//!
//! Opens the configured SQLite store, runs one command and prints plain text
//! (or JSON with `--json`).

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::process::ExitCode;

use cli::{Cli, Commands};
use standup_core::db::open_db;
use standup_core::{
    init_logging, ChatHandler, ChatSender, MessageAssembler, PageRequest,
    SqliteStandupRepository, StandupBody, StandupConfig, StandupRecord, StandupService,
};

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = StandupConfig::from_env().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    let log_level = cli.log_level.as_deref().unwrap_or(config.log_level);
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(log_level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::NextReminder => print_next_reminder(&config),
        command => run_store_command(command, &config),
    }
}

fn run_store_command(command: Commands, config: &StandupConfig) -> Result<()> {
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let repo = SqliteStandupRepository::try_new(&conn)?;
    let service = StandupService::with_cursor_ttl(repo, config.cursor_ttl);

    match command {
        Commands::Add(args) => {
            let body = StandupBody::parse_submission(&args.text)?;
            match service.record_update(&args.user, args.name.as_deref(), body)? {
                Some(record) => println!("recorded #{} ({})", record.seq, record.id),
                None => bail!("update could not be saved; see logs"),
            }
        }
        Commands::Page(args) => {
            let page = service.fetch_page(PageRequest {
                limit: Some(args.limit.unwrap_or(config.page_limit)),
                page: Some(args.page),
            })?;
            if args.output.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_records(&page.items);
                if page.has_more {
                    println!("(more: --page {})", page.page + 1);
                }
            }
        }
        Commands::User(args) => {
            let records = service.fetch_for_user(&args.user);
            if args.output.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for (index, record) in records.iter().enumerate() {
                    println!("{}. {}", index + 1, record.body.lines().join(" / "));
                }
            }
        }
        Commands::Delete(args) => {
            let outcome = service.resolve_and_delete(&args.user, args.ordinal.as_deref());
            match outcome.condition {
                Some(condition) => bail!("nothing deleted: {condition}"),
                None => println!("deleted {}", outcome.deleted_count),
            }
        }
        Commands::Blockers(output) => {
            let records = service.fetch_blockers();
            if output.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(&records);
            }
        }
        Commands::Count => println!("{}", service.count()),
        Commands::Chat(args) => {
            let mut sender = ChatSender::new(args.user);
            if let Some(name) = args.name {
                sender = sender.with_name(name);
            }
            let handler = ChatHandler::new(&service).with_default_limit(config.page_limit);
            let mut assembler = MessageAssembler::new();
            for line in std::io::stdin().lock().lines() {
                let line = line.context("failed to read stdin")?;
                if let Some(message) = assembler.push(&line) {
                    println!("{}", handler.handle(&sender, &message));
                }
            }
            if let Some(message) = assembler.finish() {
                println!("{}", handler.handle(&sender, &message));
            }
        }
        Commands::NextReminder => print_next_reminder(config)?,
    }

    Ok(())
}

fn print_next_reminder(config: &StandupConfig) -> Result<()> {
    let next = config.reminder.next_after(&chrono::Local::now());
    let when = next.format("%Y-%m-%d %H:%M %:z");
    match config.channel_id.as_deref() {
        Some(channel) => println!("next reminder at {when} for channel {channel}"),
        None => println!("next reminder at {when} (no channel configured)"),
    }
    Ok(())
}

fn print_records(records: &[StandupRecord]) {
    for record in records {
        let name = record.user_name.as_deref().unwrap_or(record.user_id.as_str());
        let mut lines = record.body.lines().into_iter();
        println!("#{} {}: {}", record.seq, name, lines.next().unwrap_or(""));
        for line in lines {
            println!("    {line}");
        }
    }
}
