use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use mercury_ledger::{
    BurnRequest, HistoryAudit, Ledger, LedgerReader, LedgerWriter, MintRequest, ReplayEngine,
    StipendPolicy, TransferRequest,
};
use mercury_server::{MercuryServer, ServerConfig};
use mercury_store::{EventFilter, EventStore, FileEventStore};
use mercury_types::{EventBody, LegacyRecord, StoredEvent, User};

use crate::cli::{Cli, Command, HistoryArgs, ImportLegacyArgs, OutputFormat};

pub fn run_command(cli: Cli, config: ServerConfig) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => {
            let mut config = config;
            if let Some(bind) = args.bind {
                config.bind_addr = bind;
            }
            if args.admin_token.is_some() {
                config.admin_token = args.admin_token;
            }
            cmd_serve(config)
        }
        Command::Balance(args) => {
            let ledger = open_ledger(&config)?;
            let user = User::new(args.user);
            let balance = ledger.balance_of(&user)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "user": user, "balance": balance })
                ),
                OutputFormat::Text => println!("{}: {}", user.to_string().bold(), balance.to_string().green()),
            }
            Ok(())
        }
        Command::History(args) => cmd_history(&config, args, format),
        Command::Mint(args) => {
            let ledger = open_ledger(&config)?;
            let event = ledger.mint(MintRequest::new(args.to, args.amount, args.note))?;
            print_committed(&event, format)
        }
        Command::Transfer(args) => {
            let ledger = open_ledger(&config)?;
            let event = ledger.transfer(TransferRequest::new(
                args.from,
                args.to,
                args.amount,
                args.note,
            ))?;
            print_committed(&event, format)
        }
        Command::Burn(args) => {
            let ledger = open_ledger(&config)?;
            let event = ledger.burn(
                BurnRequest::new(args.from, args.amount, args.note).with_link(args.link),
            )?;
            print_committed(&event, format)
        }
        Command::Stipend(args) => {
            let ledger = open_ledger(&config)?;
            let user = User::new(args.user);
            let event = if args.force {
                ledger.stipend(&user)?
            } else {
                StipendPolicy::new(config.stipend_cooldown()).claim(
                    &ledger,
                    &user,
                    ledger.now_ms(),
                )?
            };
            print_committed(&event, format)
        }
        Command::Verify => cmd_verify(&config, format),
        Command::ImportLegacy(args) => cmd_import_legacy(&config, args),
        Command::InitConfig(args) => cmd_init_config(&cli.config, args.force),
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<FileEventStore> {
    FileEventStore::open(&config.data_path, config.log_config())
        .with_context(|| format!("opening event log {}", config.data_path.display()))
}

fn open_ledger(config: &ServerConfig) -> anyhow::Result<Ledger> {
    let store = open_store(config)?;
    Ok(Ledger::open(Arc::new(store))?)
}

fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let server = MercuryServer::open(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_history(config: &ServerConfig, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(config)?;
    let mut filter = match args.user {
        Some(user) => EventFilter::involving(user),
        None => EventFilter::all(),
    };
    if !args.kind.is_empty() {
        filter = filter.with_kinds(args.kind.into_iter().map(Into::into).collect());
    }
    if let Some(since) = args.since {
        filter = filter.since(since);
    }
    let events = ledger.recent_events(args.limit.unwrap_or(config.recent_limit), &filter)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text if events.is_empty() => println!("No events."),
        OutputFormat::Text => {
            for event in &events {
                println!("{}", describe(event));
            }
        }
    }
    Ok(())
}

fn cmd_verify(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let events = store.select_all()?;
    let report = HistoryAudit::audit(events);

    if format == OutputFormat::Json {
        let violations: Vec<_> = report
            .violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "record_id": v.record_id,
                    "commit_time": v.commit_time,
                    "kind": format!("{:?}", v.kind),
                    "description": v.description,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "events": report.event_count,
                "applied": report.applied_count,
                "total_supply": report.projection.total_supply().to_string(),
                "violations": violations,
            })
        );
    } else {
        println!("Events: {}", report.event_count.to_string().bold());
        println!("Accounts: {}", report.projection.balances().len());
        println!("Total supply: {} micro", report.projection.total_supply());
        for violation in &report.violations {
            println!(
                "  {} {} at {}: {}",
                "✗".red().bold(),
                violation.record_id.short_id().yellow(),
                violation.commit_time,
                violation.description
            );
        }
    }

    if !report.is_valid() {
        bail!("{} invalid event(s) in the log", report.violations.len());
    }
    // A clean audit must agree with the strict replay used at startup.
    ReplayEngine::from_store(&store)?;
    if format == OutputFormat::Text {
        println!("{} Event log verified", "✓".green().bold());
    }
    Ok(())
}

fn cmd_import_legacy(config: &ServerConfig, args: ImportLegacyArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&text).context("legacy export must be a JSON array")?;
    let imported = raw
        .iter()
        .enumerate()
        .map(|(position, record)| LegacyRecord::decode(position, record))
        .collect::<Result<Vec<StoredEvent>, _>>()?;

    let store = open_store(config)?;
    let mut combined = store.select_all()?;
    combined.extend(imported.iter().cloned());
    let report = HistoryAudit::audit(combined);
    if !report.is_valid() {
        for violation in &report.violations {
            eprintln!("  {} {}: {}", "✗".red(), violation.record_id, violation.description);
        }
        bail!(
            "refusing to import: {} record(s) would break the ledger",
            report.violations.len()
        );
    }

    if args.dry_run {
        println!("{} {} record(s) would import cleanly", "✓".green(), imported.len());
        return Ok(());
    }
    append_batch(&store, &imported)?;
    println!(
        "{} Imported {} record(s) into {}",
        "✓".green().bold(),
        imported.len(),
        config.data_path.display()
    );
    Ok(())
}

/// Append `events` in order. Records written before a failure stay in the
/// log, so the error says how many there were.
fn append_batch(store: &dyn EventStore, events: &[StoredEvent]) -> anyhow::Result<()> {
    for (written, event) in events.iter().enumerate() {
        store.append(event).with_context(|| {
            format!(
                "import stopped after {written} of {} record(s); those remain in the log",
                events.len()
            )
        })?;
    }
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, ServerConfig::default().to_toml_string()?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("{} Wrote {}", "✓".green().bold(), path.display());
    Ok(())
}

fn print_committed(event: &StoredEvent, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(event)?),
        OutputFormat::Text => println!("{} {}", "✓".green().bold(), describe(event)),
    }
    Ok(())
}

/// One-line summary of an event.
fn describe(event: &StoredEvent) -> String {
    let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(event.commit_time as i64)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| event.commit_time.to_string());
    let id = event.record_id.short_id().dimmed();
    let amount = event.event.amount().to_string();

    let line = match &event.event {
        EventBody::Transfer(t) => format!(
            "{} {} {} → {}",
            "transfer".cyan(),
            amount.bold(),
            t.from,
            t.to
        ),
        EventBody::Mint(m) if m.is_stipend() => {
            format!("{} {} → {}", "stipend".green(), amount.bold(), m.to)
        }
        EventBody::Mint(m) => format!("{} {} → {}", "mint".green(), amount.bold(), m.to),
        EventBody::Burn(b) => format!("{} {} ← {}", "burn".red(), amount.bold(), b.from),
    };
    let note = event.event.note();
    if note.is_empty() {
        format!("{when} {id} {line}")
    } else {
        format!("{when} {id} {line} ({note})")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mercury_types::{Currency, RecordId};

    use super::*;
    use crate::cli::{BalanceArgs, InitConfigArgs, MintArgs, TransferArgs};

    fn cli(command: Command, config: PathBuf) -> Cli {
        Cli {
            command,
            config,
            data: None,
            verbose: false,
            format: OutputFormat::Text,
        }
    }

    fn config_in(dir: &Path) -> ServerConfig {
        ServerConfig {
            data_path: dir.join("mercury.log"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn commands_commit_to_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let cfg_path = dir.path().join("mercury.toml");

        run_command(
            cli(
                Command::Mint(MintArgs {
                    to: "alice".into(),
                    amount: Currency::units(5),
                    note: String::new(),
                }),
                cfg_path.clone(),
            ),
            config.clone(),
        )
        .unwrap();
        run_command(
            cli(
                Command::Transfer(TransferArgs {
                    from: "alice".into(),
                    to: "bob".into(),
                    amount: Currency::units(2),
                    note: "lunch".into(),
                }),
                cfg_path.clone(),
            ),
            config.clone(),
        )
        .unwrap();
        run_command(
            cli(Command::Balance(BalanceArgs { user: "bob".into() }), cfg_path.clone()),
            config.clone(),
        )
        .unwrap();
        run_command(cli(Command::Verify, cfg_path), config.clone()).unwrap();

        let ledger = open_ledger(&config).unwrap();
        assert_eq!(ledger.balance_of(&User::from("bob")).unwrap(), Currency::units(2));
    }

    #[test]
    fn overdraft_surfaces_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = run_command(
            cli(
                Command::Transfer(TransferArgs {
                    from: "alice".into(),
                    to: "bob".into(),
                    amount: Currency::UNIT,
                    note: String::new(),
                }),
                dir.path().join("mercury.toml"),
            ),
            config,
        )
        .unwrap_err();
        assert!(err.to_string().contains("insufficient balance"));
    }

    #[test]
    fn import_legacy_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let input = dir.path().join("export.json");
        std::fs::write(
            &input,
            r#"[
                {"To": "alice", "Amount": 10000000, "Note": "Stipend", "Time": 1000, "id": "r1"},
                {"To": "bob", "From": "alice", "Amount": 4000000.0, "Time": 2000, "id": "r2"},
                {"From": "bob", "Amount": 1000000, "Link": "/shop/hat", "Time": 3000, "id": "r3"}
            ]"#,
        )
        .unwrap();

        cmd_import_legacy(
            &config,
            ImportLegacyArgs {
                input: input.clone(),
                dry_run: false,
            },
        )
        .unwrap();

        {
            let ledger = open_ledger(&config).unwrap();
            assert_eq!(ledger.balance_of(&User::from("alice")).unwrap(), Currency::units(6));
            assert_eq!(ledger.balance_of(&User::from("bob")).unwrap(), Currency::units(3));
            assert_eq!(ledger.last_stipend_of(&User::from("alice")).unwrap(), 1000);
        }

        // Same ids again: the audit flags duplicates and nothing is written.
        let err = cmd_import_legacy(
            &config,
            ImportLegacyArgs {
                input,
                dry_run: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("refusing to import"));
        assert_eq!(open_store(&config).unwrap().len().unwrap(), 3);
    }

    /// Accepts a fixed number of appends, then fails.
    struct FullDisk {
        inner: mercury_store::InMemoryEventStore,
        room: usize,
    }

    impl EventStore for FullDisk {
        fn append(&self, event: &StoredEvent) -> mercury_store::StoreResult<StoredEvent> {
            if self.inner.len()? >= self.room {
                return Err(mercury_store::StoreError::Unavailable("disk full".into()));
            }
            self.inner.append(event)
        }

        fn select_all(&self) -> mercury_store::StoreResult<Vec<StoredEvent>> {
            self.inner.select_all()
        }
    }

    #[test]
    fn interrupted_batch_reports_how_much_was_written() {
        let store = FullDisk {
            inner: mercury_store::InMemoryEventStore::new(),
            room: 2,
        };
        let events: Vec<StoredEvent> = (0..4)
            .map(|i| {
                StoredEvent::new(
                    RecordId::from_string(format!("r{i}")),
                    i,
                    EventBody::from(mercury_ledger::MintRequest::new("alice", Currency::UNIT, "")),
                )
            })
            .collect();

        let err = append_batch(&store, &events).unwrap_err();
        assert!(err.to_string().contains("after 2 of 4"));
        assert_eq!(store.inner.len().unwrap(), 2);
    }

    #[test]
    fn locked_log_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let _held = open_store(&config).unwrap();
        let err = open_ledger(&config).unwrap_err();
        assert!(format!("{err:#}").contains("locked"));
    }

    #[test]
    fn init_config_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mercury.toml");
        let config = config_in(dir.path());

        run_command(
            cli(Command::InitConfig(InitConfigArgs { force: false }), path.clone()),
            config.clone(),
        )
        .unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap(), ServerConfig::default());

        assert!(run_command(
            cli(Command::InitConfig(InitConfigArgs { force: false }), path.clone()),
            config.clone(),
        )
        .is_err());
        run_command(
            cli(Command::InitConfig(InitConfigArgs { force: true }), path),
            config,
        )
        .unwrap();
    }

    #[test]
    fn describe_mentions_parties_and_note() {
        let event = StoredEvent::new(
            RecordId::from_string("0192f0c2-aaaa-7bbb-8ccc-dddddddddddd"),
            0,
            EventBody::from(TransferRequest::new("alice", "bob", Currency::UNIT, "rent")),
        );
        let line = describe(&event);
        assert!(line.contains("alice"));
        assert!(line.contains("bob"));
        assert!(line.contains("(rent)"));
        assert!(line.contains("1970-01-01"));
    }
}
